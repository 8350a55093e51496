//! `lockstep` is a doubly linked list that three workers mutate at once:
//! one reverses it and sums it, one renders it, one removes random nodes,
//! until the list is empty.
//!
//! Every node carries its own lock. Traversals hold two adjacent node locks
//! at a time and removals hold up to three, always acquired together as a
//! set, so work on different parts of the list doesn't contend and no
//! combination of workers can deadlock.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use lockstep::{Config, List, workers};
//!
//! let config = Config::default()
//!     .item_count(32)
//!     .delete_interval_ms(1)
//!     .max_delete(8)
//!     .seed(Some(7));
//! config.validate().unwrap();
//!
//! let list = Arc::new(List::default());
//! lockstep::populate(&*list, &config, &mut lockstep::rng(config.seed, 0));
//! assert_eq!(list.len(), 32);
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let running = workers::spawn(list.clone(), &config, tx).unwrap();
//! for _report in rx {}
//!
//! let summaries = running.join().unwrap();
//! assert_eq!(summaries.len(), 3);
//! assert!(list.is_empty());
//! ```
#![forbid(unsafe_code)]
#![deny(future_incompatible)]
#![deny(nonstandard_style)]
#![deny(rust_2018_idioms)]

mod backoff;
mod coarse;
mod config;
mod debug_delay;
mod list;
mod lock_set;
mod node;
mod populate;
mod result;
mod shared;
pub mod workers;

pub use crate::{
    coarse::CoarseList,
    config::Config,
    list::List,
    node::Entry,
    populate::{populate, random_word, rng},
    result::{Error, Result},
    shared::ConcurrentList,
};
