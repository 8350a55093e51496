use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Config, ConcurrentList};

/// A generator for one thread's random choices. With a seed, stream `n`
/// always produces the same sequence; without one, it is seeded from the
/// OS.
pub fn rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_os_rng(),
    }
}

/// A lowercase ASCII word with a length drawn uniformly from
/// `min_len..=max_len`.
pub fn random_word<R: Rng + ?Sized>(
    rng: &mut R,
    min_len: usize,
    max_len: usize,
) -> String {
    let len = rng.random_range(min_len..=max_len);
    (0..len).map(|_| char::from(rng.random_range(b'a'..=b'z'))).collect()
}

/// Push `config.item_count` random pairs onto `list`, numbers drawn from
/// `0..config.value_range`.
pub fn populate<L, R>(list: &L, config: &Config, rng: &mut R)
where
    L: ConcurrentList + ?Sized,
    R: Rng + ?Sized,
{
    for _ in 0..config.item_count {
        let word = random_word(rng, config.min_word_len, config.max_word_len);
        let number = rng.random_range(0..config.value_range);
        list.push_front(word, number);
    }

    log::info!("populated list with {} nodes", config.item_count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::List;

    #[test]
    fn words_respect_length_bounds() {
        let mut rng = rng(Some(5), 0);
        for _ in 0..1000 {
            let word = random_word(&mut rng, 3, 6);
            assert!((3..=6).contains(&word.len()));
            assert!(word.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn populate_fills_the_configured_count() {
        let config = Config::default().item_count(40).value_range(10);
        let list = List::default();
        populate(&list, &config, &mut rng(Some(9), 0));

        let entries = list.entries();
        assert_eq!(entries.len(), 40);
        assert!(entries.iter().all(|e| (0..10).contains(&e.number)));
    }

    #[test]
    fn seeded_streams_repeat() {
        let a = random_word(&mut rng(Some(1), 2), 8, 13);
        let b = random_word(&mut rng(Some(1), 2), 8, 13);
        assert_eq!(a, b);
    }
}
