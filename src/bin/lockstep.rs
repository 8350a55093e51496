use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use docopt::Docopt;
use serde::Deserialize;

use lockstep::workers::{self, Report};
use lockstep::{CoarseList, ConcurrentList, Config, List, Result};

const USAGE: &str = "
Usage: lockstep [options]

Options:
    --items=<n>             Number of nodes to populate [default: 1024].
    --value-range=<n>       Node numbers are drawn from 0..n [default: 256].
    --min-word-len=<n>      Minimum generated word length [default: 8].
    --max-word-len=<n>      Maximum generated word length [default: 13].
    --min-delete=<n>        Minimum removals per deletion batch [default: 1].
    --max-delete=<n>        Maximum removals per deletion batch [default: 3].
    --delete-interval=<ms>  Milliseconds between deletion batches [default: 100].
    --seed=<n>              Seed every random choice for a reproducible run.
    --coarse                Use the single-lock contiguous list instead.
    -h, --help              Show this message.
";

#[derive(Debug, Deserialize)]
struct Args {
    flag_items: usize,
    flag_value_range: i64,
    flag_min_word_len: usize,
    flag_max_word_len: usize,
    flag_min_delete: usize,
    flag_max_delete: usize,
    flag_delete_interval: u64,
    flag_seed: Option<u64>,
    flag_coarse: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config::new()
            .item_count(self.flag_items)
            .value_range(self.flag_value_range)
            .min_word_len(self.flag_min_word_len)
            .max_word_len(self.flag_max_word_len)
            .min_delete(self.flag_min_delete)
            .max_delete(self.flag_max_delete)
            .delete_interval_ms(self.flag_delete_interval)
            .seed(self.flag_seed)
    }
}

fn setup_logger() {
    fn tn() -> String {
        std::thread::current().name().unwrap_or("unknown").to_owned()
    }

    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{:05} {:10} {:10} {}",
                record.level(),
                tn(),
                record
                    .module_path()
                    .and_then(|path| path.split("::").last())
                    .unwrap_or("?"),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info);

    if let Ok(env) = std::env::var("RUST_LOG") {
        builder.parse_filters(&env);
    }

    let _r = builder.try_init();
}

fn run<L: ConcurrentList + 'static>(list: Arc<L>, config: &Config) -> Result<()> {
    let stdout = io::stdout();

    let mut rng = lockstep::rng(config.seed, 0);
    lockstep::populate(&*list, config, &mut rng);
    writeln!(stdout.lock(), "populated list")?;

    if let Some(rendering) = list.render() {
        writeln!(stdout.lock(), "{}", rendering)?;
    }

    let (tx, rx) = crossbeam_channel::bounded(1024);
    let running = workers::spawn(list, config, tx)?;

    // ends once every worker has stopped and dropped its sender
    for report in rx {
        match report {
            Report::Sum(sum) => writeln!(stdout.lock(), "Sum = {}", sum)?,
            Report::Rendering(rendering) => {
                writeln!(stdout.lock(), "{}", rendering)?
            }
            Report::Removed(entry) => log::debug!("removed {}", entry),
            Report::Finished(worker) => {
                log::info!("{} saw the list empty", worker)
            }
        }
    }

    for summary in running.join()? {
        log::info!("{} made {} passes", summary.worker, summary.passes);
        writeln!(stdout.lock(), "Thread {} joined.", summary.worker.number())?;
    }

    Ok(())
}

fn main() {
    setup_logger();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.argv(std::env::args()).deserialize())
        .unwrap_or_else(|e| e.exit());

    let config = args.config();
    if let Err(e) = config.validate() {
        eprintln!("Invalid argument: {}", e);
        process::exit(1);
    }

    let outcome = if args.flag_coarse {
        run(Arc::new(CoarseList::default()), &config)
    } else {
        run(Arc::new(List::default()), &config)
    };

    if let Err(e) = outcome {
        eprintln!("{}", e);
        process::exit(1);
    }
}
