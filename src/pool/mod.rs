//! Worker pool: spawns the fixed set of producer and consumer threads for a
//! run and joins all of them before returning.
//!
//! Threads are scoped (`crossbeam_utils::thread::scope`), so tasks borrow the
//! shared state and the observer instead of sharing them through `Arc`. Each
//! task owns its id.

use crate::observer::Observer;
use crate::sync::SharedState;
use crate::workers::{ConsumerLoop, ProducerLoop};
use crate::{Error, Result};
use crossbeam_utils::thread::{self, Scope, ScopedJoinHandle};
use serde::Serialize;
use std::fmt;

/// Role of a pool task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "master"),
            Role::Consumer => write!(f, "worker"),
        }
    }
}

/// Outcome of one joined task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub role: Role,
    pub id: usize,
    /// Items produced or consumed by this task
    pub items: usize,
}

/// Aborts the run if the owning task unwinds, so no other task is left
/// waiting on a signal the panicked task would have sent.
struct AbortOnPanic<'a>(&'a SharedState);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}

type Spawned<'scope> = (Role, usize, ScopedJoinHandle<'scope, usize>);

/// Structured group of producer and consumer tasks
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    num_producers: usize,
    num_consumers: usize,
}

impl WorkerPool {
    /// Create a pool. Counts are not validated here; a pool without
    /// consumers is allowed as long as the buffer can hold every item.
    pub fn new(num_producers: usize, num_consumers: usize) -> Self {
        Self {
            num_producers,
            num_consumers,
        }
    }

    pub fn num_producers(&self) -> usize {
        self.num_producers
    }

    pub fn num_consumers(&self) -> usize {
        self.num_consumers
    }

    /// Spawn every task, then join them all, producers first.
    pub fn run<O: Observer + ?Sized>(
        &self,
        state: &SharedState,
        observer: &O,
    ) -> Result<Vec<TaskReport>> {
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.num_producers + self.num_consumers);

            let tasks = (0..self.num_producers)
                .map(|id| (Role::Producer, id))
                .chain((0..self.num_consumers).map(|id| (Role::Consumer, id)));

            for (role, id) in tasks {
                match spawn_task(scope, role, id, state, observer) {
                    Ok(handle) => handles.push((role, id, handle)),
                    Err(e) => {
                        log::error!("Failed to spawn {} {}: {}", role, id, e);
                        state.abort();
                        // Reports of the already running tasks are dropped;
                        // the spawn failure is what gets returned.
                        let _ = join_all(handles);
                        return Err(Error::IoError(e));
                    }
                }
            }

            join_all(handles)
        })
        .map_err(|_| Error::PoolError("worker scope panicked".to_string()))?
    }
}

fn spawn_task<'scope, 'env, O: Observer + ?Sized>(
    scope: &'scope Scope<'env>,
    role: Role,
    id: usize,
    state: &'env SharedState,
    observer: &'env O,
) -> std::io::Result<ScopedJoinHandle<'scope, usize>> {
    scope
        .builder()
        .name(format!("{}-{}", role, id))
        .spawn(move |_| {
            let _guard = AbortOnPanic(state);
            match role {
                Role::Producer => ProducerLoop::new(id, state, observer).run(),
                Role::Consumer => ConsumerLoop::new(id, state, observer).run(),
            }
        })
}

fn join_all(handles: Vec<Spawned<'_>>) -> Result<Vec<TaskReport>> {
    let mut reports = Vec::with_capacity(handles.len());
    let mut first_failure = None;

    for (role, id, handle) in handles {
        match handle.join() {
            Ok(items) => {
                log::debug!("{} {} joined after {} items", role, id, items);
                reports.push(TaskReport { role, id, items });
            }
            Err(_) => {
                log::error!("{} {} panicked", role, id);
                first_failure.get_or_insert(Error::TaskPanicked { role, id });
            }
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(reports),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{DrainOrder, Item};
    use crate::observer::{NullObserver, RecordingObserver};

    #[test]
    fn test_reports_every_task_in_join_order() {
        let state = SharedState::new(100, 10, DrainOrder::Lifo).unwrap();
        let reports = WorkerPool::new(2, 3).run(&state, &NullObserver).unwrap();

        let roles: Vec<(Role, usize)> = reports.iter().map(|r| (r.role, r.id)).collect();
        assert_eq!(
            roles,
            vec![
                (Role::Producer, 0),
                (Role::Producer, 1),
                (Role::Consumer, 0),
                (Role::Consumer, 1),
                (Role::Consumer, 2),
            ]
        );
        let produced: usize = reports
            .iter()
            .filter(|r| r.role == Role::Producer)
            .map(|r| r.items)
            .sum();
        assert_eq!(produced, 100);
    }

    #[test]
    fn test_producers_only_terminate_when_buffer_holds_everything() {
        let state = SharedState::new(8, 8, DrainOrder::Lifo).unwrap();
        let recorder = RecordingObserver::new();

        let reports = WorkerPool::new(3, 0).run(&state, &recorder).unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(reports.iter().map(|r| r.items).sum::<usize>(), 8);
        let buffer = state.lock();
        assert!(buffer.is_full());
        assert!(buffer.production_complete());
        assert!(recorder.consumed_values().is_empty());
    }

    #[test]
    fn test_stress_peak_never_exceeds_capacity() {
        for capacity in [1, 2, 7, 64] {
            let state = SharedState::new(5_000, capacity, DrainOrder::Fifo).unwrap();
            let recorder = RecordingObserver::new();

            WorkerPool::new(8, 8).run(&state, &recorder).unwrap();

            let stats = state.stats().view();
            assert!(stats.peak_size <= capacity);
            assert_eq!(stats.consumed, 5_000);
            recorder.verify_complete(5_000).unwrap();
        }
    }

    struct PanicOnConsume;

    impl Observer for PanicOnConsume {
        fn on_produced(&self, _value: Item, _producer_id: usize) {}

        fn on_consumed(&self, value: Item, _consumer_id: usize) {
            if value == 3 {
                panic!("observer failure");
            }
        }
    }

    #[test]
    fn test_panicking_task_is_reported_and_others_exit() {
        let state = SharedState::new(1_000, 1, DrainOrder::Fifo).unwrap();

        let result = WorkerPool::new(2, 1).run(&state, &PanicOnConsume);

        assert!(matches!(
            result,
            Err(Error::TaskPanicked {
                role: Role::Consumer,
                id: 0
            })
        ));
        assert!(state.lock().is_aborted());
    }
}
