//! master-worker - bounded shared buffer for producer/consumer threads
//!
//! A fixed number of producer ("master") threads claim item indices
//! `0..total_items` and insert them into a bounded buffer, while consumer
//! ("worker") threads drain it. All shared state sits behind one lock with
//! two condition variables, and the run ends once every item has been
//! produced and consumed and every thread has joined.

pub mod buffer;
pub mod observer;
pub mod pool;
pub mod stats;
pub mod sync;
pub mod utils;
pub mod workers;

// Re-export key components
pub use buffer::{DrainOrder, Item, SharedBuffer};
pub use observer::{
    Event, LogObserver, NullObserver, Observer, PrintObserver, RecordingObserver,
};
pub use pool::{Role, TaskReport, WorkerPool};
pub use stats::{RunStats, RunStatsView};
pub use sync::{Phase, SharedState};
pub use workers::{ConsumerLoop, ProducerLoop};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// master-worker error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{role} {id} panicked")]
    TaskPanicked { role: Role, id: usize },

    #[error("Worker pool error: {0}")]
    PoolError(String),

    #[error("Run incomplete: expected {expected} items, produced {produced}, consumed {consumed}")]
    Incomplete {
        expected: usize,
        produced: usize,
        consumed: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Logger error: {0}")]
    LoggerError(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Run configuration, fixed before any thread starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Total number of items ever produced
    pub total_items: usize,

    /// Buffer capacity
    pub max_buf_size: usize,

    /// Number of producer (master) threads
    pub num_producers: usize,

    /// Number of consumer (worker) threads
    pub num_consumers: usize,

    /// End of the buffer consumers take from
    #[serde(default)]
    pub order: DrainOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_items: 10_000,
            max_buf_size: 1_000,
            num_producers: 3,
            num_consumers: 4,
            order: DrainOrder::default(),
        }
    }
}

impl Config {
    /// Look up a sizing parameter by name
    pub fn field(&self, key: &str) -> Option<usize> {
        match key {
            "total_items" => Some(self.total_items),
            "max_buf_size" => Some(self.max_buf_size),
            "num_producers" => Some(self.num_producers),
            "num_consumers" => Some(self.num_consumers),
            _ => None,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub config: Config,
    /// One entry per task, producers first, in join order
    pub tasks: Vec<TaskReport>,
    pub stats: RunStatsView,
    pub elapsed: Duration,
}

impl RunReport {
    /// Items inserted across all producers
    pub fn produced(&self) -> usize {
        self.items_for(Role::Producer)
    }

    /// Items removed across all consumers
    pub fn consumed(&self) -> usize {
        self.items_for(Role::Consumer)
    }

    fn items_for(&self, role: Role) -> usize {
        self.tasks
            .iter()
            .filter(|task| task.role == role)
            .map(|task| task.items)
            .sum()
    }

    /// Check that every item was produced and consumed exactly once in total
    /// and that the buffer never went over capacity.
    pub fn verify(&self) -> Result<()> {
        let expected = self.config.total_items;
        let produced = self.produced();
        let consumed = self.consumed();

        if produced != expected || consumed != expected {
            return Err(Error::Incomplete {
                expected,
                produced,
                consumed,
            });
        }

        if self.stats.peak_size > self.config.max_buf_size {
            return Err(Error::PoolError(format!(
                "buffer reached {} items with capacity {}",
                self.stats.peak_size, self.config.max_buf_size
            )));
        }

        Ok(())
    }
}

/// Main run context
pub struct MasterWorker {
    config: Config,
    state: SharedState,
    pool: WorkerPool,
}

impl MasterWorker {
    /// Validate the configuration and allocate the shared state
    pub fn new(config: Config) -> Result<Self> {
        utils::config::validate(&config)?;

        let state = SharedState::new(config.total_items, config.max_buf_size, config.order)?;
        let pool = WorkerPool::new(config.num_producers, config.num_consumers);

        Ok(Self {
            config,
            state,
            pool,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the shared state
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Run every producer and consumer to completion.
    ///
    /// The run is one-shot: the shared state is released when this returns.
    pub fn run<O: Observer + ?Sized>(self, observer: &O) -> Result<RunReport> {
        log::info!(
            "Starting run: {} items, capacity {}, {} masters, {} workers, {} order",
            self.config.total_items,
            self.config.max_buf_size,
            self.config.num_producers,
            self.config.num_consumers,
            self.config.order
        );

        let perf = utils::logging::PerfLogger::new("master-worker run");
        let tasks = self.pool.run(&self.state, observer)?;
        let elapsed = perf.log();

        let stats = self.state.stats().view();
        log::info!(
            "Run finished in phase {:?}: produced {}, consumed {}, peak buffer {}",
            self.state.phase(),
            stats.produced,
            stats.consumed,
            stats.peak_size
        );

        Ok(RunReport {
            config: self.config,
            tasks,
            stats,
            elapsed,
        })
    }
}

/// Validate `config`, run it to completion, and return the report
pub fn run<O: Observer + ?Sized>(config: Config, observer: &O) -> Result<RunReport> {
    MasterWorker::new(config)?.run(observer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(total: usize, cap: usize, producers: usize, consumers: usize) -> Config {
        Config {
            total_items: total,
            max_buf_size: cap,
            num_producers: producers,
            num_consumers: consumers,
            order: DrainOrder::Lifo,
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.total_items, 10_000);
        assert_eq!(config.max_buf_size, 1_000);
        assert_eq!(config.order, DrainOrder::Lifo);
    }

    #[test]
    fn test_config_field_lookup() {
        let config = config(10, 2, 3, 4);
        assert_eq!(config.field("total_items"), Some(10));
        assert_eq!(config.field("num_consumers"), Some(4));
        assert_eq!(config.field("order"), None);
    }

    #[test]
    fn test_rejects_invalid_config_before_start() {
        assert!(matches!(
            MasterWorker::new(config(10, 0, 1, 1)),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            MasterWorker::new(config(10, 1, 0, 1)),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            MasterWorker::new(config(10, 1, 1, 0)),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_run() {
        let recorder = RecordingObserver::new();
        let report = run(config(0, 4, 2, 2), &recorder).unwrap();

        assert!(recorder.events().is_empty());
        assert_eq!(report.tasks.len(), 4);
        assert_eq!(report.produced(), 0);
        assert_eq!(report.consumed(), 0);
        report.verify().unwrap();
    }

    #[test]
    fn test_single_slot_alternates() {
        let recorder = RecordingObserver::new();
        let report = run(config(10, 1, 1, 1), &recorder).unwrap();
        report.verify().unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 20);
        for (i, pair) in events.chunks(2).enumerate() {
            assert_eq!(
                pair[0],
                Event::Produced {
                    value: i,
                    producer: 0
                }
            );
            assert_eq!(
                pair[1],
                Event::Consumed {
                    value: i,
                    consumer: 0
                }
            );
        }
        assert_eq!(report.stats.peak_size, 1);
    }

    #[test]
    fn test_many_threads_balance() {
        for _ in 0..5 {
            let recorder = RecordingObserver::new();
            let report = run(config(10_000, 1_000, 4, 3), &recorder).unwrap();
            report.verify().unwrap();
            recorder.verify_complete(10_000).unwrap();
            assert!(report.stats.peak_size <= 1_000);
        }
    }

    #[test]
    fn test_repeated_runs_same_totals() {
        let first = run(config(1_000, 16, 3, 5), &NullObserver).unwrap();
        let second = run(config(1_000, 16, 3, 5), &NullObserver).unwrap();
        assert_eq!(first.consumed(), 1_000);
        assert_eq!(second.consumed(), 1_000);
    }

    #[test]
    fn test_fifo_order_run() {
        let mut cfg = config(500, 8, 2, 2);
        cfg.order = DrainOrder::Fifo;

        let recorder = RecordingObserver::new();
        run(cfg, &recorder).unwrap().verify().unwrap();
        recorder.verify_complete(500).unwrap();
    }

    #[test]
    fn test_verify_detects_imbalance() {
        let report = RunReport {
            config: config(3, 1, 1, 1),
            tasks: vec![
                TaskReport {
                    role: Role::Producer,
                    id: 0,
                    items: 3,
                },
                TaskReport {
                    role: Role::Consumer,
                    id: 0,
                    items: 2,
                },
            ],
            stats: RunStatsView::default(),
            elapsed: Duration::ZERO,
        };

        assert!(matches!(
            report.verify(),
            Err(Error::Incomplete {
                expected: 3,
                produced: 3,
                consumed: 2
            })
        ));
    }
}
