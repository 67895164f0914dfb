use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use levelqueue::{Error, Queue, QueueConfig, WriteMode};

#[derive(Parser, Debug)]
#[command(name = "levelqueue-cli", version, about = "Persistent deque tooling")]
struct Cli {
    /// Queue directory
    #[arg(short, long, default_value = "./queue")]
    path: PathBuf,

    /// Flush to disk after every mutation
    #[arg(long)]
    sync: bool,

    /// Write counter and item as separate store calls
    #[arg(long)]
    two_step: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append values at the back
    Rpush { values: Vec<String> },
    /// Prepend values at the front
    Lpush { values: Vec<String> },
    /// Pop from the back
    Rpop {
        #[arg(short = 'n', long = "count", default_value_t = 1)]
        count: usize,
    },
    /// Pop from the front
    Lpop {
        #[arg(short = 'n', long = "count", default_value_t = 1)]
        count: usize,
    },
    /// Print the number of queued items and the boundaries
    Len,
    /// Pop everything from the front
    Drain,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = if cli.sync {
        QueueConfig::durable()
    } else {
        QueueConfig::default()
    };
    if cli.two_step {
        config = config.with_write_mode(WriteMode::TwoStep);
    }

    let queue = Queue::open_with_config(&cli.path, config)
        .with_context(|| format!("failed to open queue at {}", cli.path.display()))?;
    info!("opened queue at {}", cli.path.display());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Rpush { values } => {
            for value in &values {
                queue.rpush(value.as_bytes()).context("rpush failed")?;
            }
            writeln!(out, "{}", queue.len())?;
        }
        Commands::Lpush { values } => {
            for value in &values {
                queue.lpush(value.as_bytes()).context("lpush failed")?;
            }
            writeln!(out, "{}", queue.len())?;
        }
        Commands::Rpop { count } => {
            pop_n(&mut out, count, || queue.rpop())?;
        }
        Commands::Lpop { count } => {
            pop_n(&mut out, count, || queue.lpop())?;
        }
        Commands::Len => {
            let (low, high) = queue.bounds();
            writeln!(out, "{} (low={low} high={high})", queue.len())?;
        }
        Commands::Drain => {
            let drained = pop_n(&mut out, usize::MAX, || queue.lpop())?;
            info!("drained {drained} items");
        }
    }

    queue.close().context("failed to close queue")?;
    Ok(())
}

/// Pops up to `count` items, stopping quietly once the queue is empty.
fn pop_n(
    out: &mut impl Write,
    count: usize,
    mut pop: impl FnMut() -> levelqueue::Result<Vec<u8>>,
) -> Result<usize> {
    let mut popped = 0;
    while popped < count {
        match pop() {
            Ok(value) => {
                writeln!(out, "{}", String::from_utf8_lossy(&value))?;
                popped += 1;
            }
            Err(Error::NotFound) => break,
            Err(err) => return Err(err).context("pop failed"),
        }
    }
    Ok(popped)
}
