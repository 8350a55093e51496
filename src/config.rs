use std::time::Duration;

use crate::{Error, Result};

macro_rules! supported {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err(Error::InvalidConfig($msg.to_owned()));
        }
    };
}

macro_rules! builder {
    ($(($name:ident, $t:ty, $desc:expr)),*) => {
        $(
            #[doc=$desc]
            pub fn $name(mut self, to: $t) -> Config {
                self.$name = to;
                self
            }
        )*
    }
}

/// Top-level configuration for a workload.
///
/// # Examples
///
/// ```
/// let config = lockstep::Config::default()
///     .item_count(64)
///     .min_delete(2)
///     .max_delete(5)
///     .delete_interval_ms(10);
///
/// assert!(config.validate().is_ok());
/// ```
///
/// ```
/// let config = lockstep::Config::default().min_delete(4).max_delete(3);
///
/// assert!(config.validate().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Config {
    #[doc(hidden)]
    pub item_count: usize,
    #[doc(hidden)]
    pub value_range: i64,
    #[doc(hidden)]
    pub min_word_len: usize,
    #[doc(hidden)]
    pub max_word_len: usize,
    #[doc(hidden)]
    pub min_delete: usize,
    #[doc(hidden)]
    pub max_delete: usize,
    #[doc(hidden)]
    pub delete_interval_ms: u64,
    #[doc(hidden)]
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            item_count: 1024,
            value_range: 256,
            min_word_len: 8,
            max_word_len: 13,
            min_delete: 1,
            max_delete: 3,
            delete_interval_ms: 100,
            seed: None,
        }
    }
}

impl Config {
    /// Returns a default `Config`
    pub fn new() -> Config {
        Self::default()
    }

    builder!(
        (item_count, usize, "number of nodes pushed during population"),
        (value_range, i64, "node numbers are drawn uniformly from `0..value_range`"),
        (min_word_len, usize, "minimum length of each generated word"),
        (max_word_len, usize, "maximum length of each generated word"),
        (min_delete, usize, "minimum number of removals per deletion batch"),
        (max_delete, usize, "maximum number of removals per deletion batch"),
        (delete_interval_ms, u64, "milliseconds the deleter waits before each batch"),
        (seed, Option<u64>, "seed for every random choice, for reproducible runs")
    );

    /// The pause before each deletion batch.
    pub fn delete_interval(&self) -> Duration {
        Duration::from_millis(self.delete_interval_ms)
    }

    /// Check the configuration before anything is allocated.
    pub fn validate(&self) -> Result<()> {
        supported!(
            self.item_count > 0
                && self.value_range > 0
                && self.min_word_len > 0
                && self.max_word_len > 0
                && self.min_delete > 0
                && self.max_delete > 0
                && self.delete_interval_ms > 0,
            "All values must be positive."
        );
        supported!(
            self.max_word_len >= self.min_word_len,
            "max_word_len must be greater than or equal to min_word_len."
        );
        supported!(
            self.max_delete >= self.min_delete,
            "max_delete must be greater than or equal to min_delete."
        );
        Ok(())
    }
}
