//! The three loops that share one list.
//!
//! Each loop checks `is_empty` at the top and then acts without holding
//! anything across the check. The list may empty in between; every list
//! operation treats that as a normal negative result, so the loop simply
//! comes around, sees the empty list, and exits.
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use rand::{Rng, RngCore};

use crate::{Config, ConcurrentList, Entry, Error, Result};

/// Which loop a report or summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Worker {
    /// Reverses the list, then sums it.
    Reverser,
    /// Renders the list front to back.
    Renderer,
    /// Removes random batches of nodes.
    Deleter,
}

impl Worker {
    /// The order the workers are started and joined in, from 1.
    pub const fn number(self) -> usize {
        match self {
            Worker::Reverser => 1,
            Worker::Renderer => 2,
            Worker::Deleter => 3,
        }
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Worker::Reverser => "reverser",
            Worker::Renderer => "renderer",
            Worker::Deleter => "deleter",
        })
    }
}

/// Progress reported by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// The sum computed after a reversal.
    Sum(i64),
    /// One full rendering of the list.
    Rendering(String),
    /// A node the deleter removed.
    Removed(Entry),
    /// The worker saw the list empty and stopped.
    Finished(Worker),
}

/// What a worker did before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// The worker this summary belongs to.
    pub worker: Worker,
    /// Loop iterations that ran against a non-empty list.
    pub passes: usize,
}

struct Reporter {
    worker: Worker,
    tx: Sender<Report>,
    connected: bool,
}

impl Reporter {
    fn new(worker: Worker, tx: Sender<Report>) -> Reporter {
        log::debug!("{} starting", worker);
        Reporter { worker, tx, connected: true }
    }

    fn send(&mut self, report: Report) {
        if self.connected && self.tx.send(report).is_err() {
            log::warn!(
                "{} lost its report receiver, continuing without reporting",
                self.worker
            );
            self.connected = false;
        }
    }

    fn finish(mut self, passes: usize) -> Summary {
        log::debug!("{} observed an empty list after {} passes", self.worker, passes);
        self.send(Report::Finished(self.worker));
        Summary { worker: self.worker, passes }
    }
}

/// Reverse the list and report its sum until the list is empty.
pub fn reverse_and_sum<L: ConcurrentList + ?Sized>(
    list: &L,
    reports: Sender<Report>,
) -> Summary {
    let mut reporter = Reporter::new(Worker::Reverser, reports);
    let mut passes = 0;

    while !list.is_empty() {
        list.reverse();
        if let Some(sum) = list.sum() {
            reporter.send(Report::Sum(sum));
        }
        passes += 1;
    }

    reporter.finish(passes)
}

/// Render the list until it is empty.
pub fn render<L: ConcurrentList + ?Sized>(
    list: &L,
    reports: Sender<Report>,
) -> Summary {
    let mut reporter = Reporter::new(Worker::Renderer, reports);
    let mut passes = 0;

    while !list.is_empty() {
        if let Some(rendering) = list.render() {
            reporter.send(Report::Rendering(rendering));
        }
        passes += 1;
    }

    reporter.finish(passes)
}

/// Every `delete_interval`, remove between `min_delete` and `max_delete`
/// random nodes, until the list is empty.
///
/// The interval is spent waiting on the list's empty condition rather than
/// sleeping, so a list emptied elsewhere ends the wait early. A batch stops
/// as soon as a removal finds the list empty.
pub fn delete<L, R>(
    list: &L,
    config: &Config,
    rng: &mut R,
    reports: Sender<Report>,
) -> Summary
where
    L: ConcurrentList + ?Sized,
    R: RngCore,
{
    let mut reporter = Reporter::new(Worker::Deleter, reports);
    let mut passes = 0;

    while !list.is_empty() {
        if list.wait_until_empty(config.delete_interval()) {
            break;
        }

        let batch = rng.random_range(config.min_delete..=config.max_delete);
        for _ in 0..batch {
            match list.remove_random(&mut *rng) {
                Some(entry) => {
                    log::debug!("removed {}", entry);
                    reporter.send(Report::Removed(entry));
                }
                None => break,
            }
        }
        passes += 1;
    }

    reporter.finish(passes)
}

/// Handles to the three running workers.
#[derive(Debug)]
pub struct Workers {
    handles: Vec<(Worker, JoinHandle<Summary>)>,
}

/// Start the reverser, renderer, and deleter on named threads against the
/// same list.
///
/// Returns `Error::InvalidConfig` without starting anything if `config`
/// fails `Config::validate`. Each worker owns a clone of `reports`; once all three have stopped and
/// the caller has dropped its own sender, the receiving side disconnects.
pub fn spawn<L>(
    list: Arc<L>,
    config: &Config,
    reports: Sender<Report>,
) -> Result<Workers>
where
    L: ConcurrentList + 'static,
{
    config.validate()?;

    let mut handles = Vec::with_capacity(3);

    let reverser = {
        let list = list.clone();
        let reports = reports.clone();
        thread::Builder::new()
            .name(Worker::Reverser.to_string())
            .spawn(move || reverse_and_sum(&*list, reports))?
    };
    handles.push((Worker::Reverser, reverser));

    let renderer = {
        let list = list.clone();
        let reports = reports.clone();
        thread::Builder::new()
            .name(Worker::Renderer.to_string())
            .spawn(move || render(&*list, reports))?
    };
    handles.push((Worker::Renderer, renderer));

    let deleter = {
        let config = config.clone();
        let mut rng = crate::rng(config.seed, Worker::Deleter.number() as u64);
        thread::Builder::new()
            .name(Worker::Deleter.to_string())
            .spawn(move || delete(&*list, &config, &mut rng, reports))?
    };
    handles.push((Worker::Deleter, deleter));

    Ok(Workers { handles })
}

impl Workers {
    /// Join every worker in start order.
    pub fn join(self) -> Result<Vec<Summary>> {
        self.handles
            .into_iter()
            .map(|(worker, handle)| {
                handle.join().map_err(|_| {
                    Error::ReportableBug(format!("the {} thread panicked", worker))
                })
            })
            .collect()
    }
}
