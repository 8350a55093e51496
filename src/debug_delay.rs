//! Random jitter at lock and traversal points.
//!
//! With the `lock_free_delays` feature, every call yields about half the
//! time and occasionally sleeps for up to `LOCKSTEP_DELAY_INTENSITY`
//! microseconds (default 100), which widens the windows between peeking a
//! link and locking it. Without the feature it compiles to nothing.

#[cfg(feature = "lock_free_delays")]
pub(crate) fn debug_delay() {
    use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
    use std::time::Duration;

    // the id of whichever thread passed through last
    static LAST_CALLER: AtomicU64 = AtomicU64::new(0);

    let me = jitter::thread_id();
    if LAST_CALLER.swap(me, Relaxed) == me {
        // nobody else has been through since our last call
        return;
    }

    if jitter::below(1000) == 1 {
        let micros = jitter::below(jitter::intensity());
        std::thread::sleep(Duration::from_micros(u64::from(micros)));
    }

    if jitter::below(2) == 0 {
        std::thread::yield_now();
    }
}

#[cfg(not(feature = "lock_free_delays"))]
#[inline(always)]
pub(crate) fn debug_delay() {}

#[cfg(feature = "lock_free_delays")]
mod jitter {
    use std::cell::Cell;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

    static THREADS: AtomicU64 = AtomicU64::new(1);

    thread_local! {
        static ID: u64 = THREADS.fetch_add(1, Relaxed);
        // odd constant keeps every stream's state nonzero
        static STATE: Cell<u32> =
            Cell::new(ID.with(|id| (*id as u32).wrapping_mul(0x9e37_79b9) | 1));
    }

    pub(super) fn thread_id() -> u64 {
        ID.try_with(|id| *id).unwrap_or(0)
    }

    pub(super) fn intensity() -> u32 {
        static INTENSITY: OnceLock<u32> = OnceLock::new();

        *INTENSITY.get_or_init(|| {
            std::env::var("LOCKSTEP_DELAY_INTENSITY")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(100)
        })
    }

    /// A number in `0..n` from this thread's xorshift stream.
    pub(super) fn below(n: u32) -> u32 {
        STATE
            .try_with(|state| {
                let mut x = state.get();
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                state.set(x);

                ((u64::from(x) * u64::from(n)) >> 32) as u32
            })
            .unwrap_or(0)
    }
}
