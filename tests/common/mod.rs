use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub fn setup_logger() {
    use std::io::Write;

    fn tn() -> String {
        std::thread::current().name().unwrap_or("unknown").to_owned()
    }

    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{:05} {:20} {:10} {}",
                record.level(),
                tn(),
                record.module_path().unwrap().split("::").last().unwrap(),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info);

    if let Ok(env) = std::env::var("RUST_LOG") {
        builder.parse_filters(&env);
    }

    let _r = builder.try_init();
}

/// Run `f` on its own thread and panic if it hasn't returned within
/// `limit`. A hang here means the workers deadlocked or never saw the
/// list empty.
#[allow(dead_code)]
pub fn within<T, F>(limit: Duration, what: &str, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(format!("t({})", what))
        .spawn(move || {
            let _ = tx.send(f());
        })
        .expect("should be able to spawn thread");

    match rx.recv_timeout(limit) {
        Ok(t) => t,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("{} did not finish within {:?}", what, limit)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            panic!("{} panicked", what)
        }
    }
}
