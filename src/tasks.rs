//! Background work owned by the visible screen.
//!
//! Each screen gets a fresh `TaskScope`. Replacing or dropping the scope
//! aborts its in-flight requests, and any result that still arrives carries
//! the old generation number so the app can drop it.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

/// A result tagged with the scope that produced it
#[derive(Debug)]
pub struct Tagged<T> {
    pub generation: u64,
    pub value: T,
}

/// Cancels everything it spawned when dropped
pub struct TaskScope<T> {
    generation: u64,
    tasks: JoinSet<()>,
    tx: mpsc::UnboundedSender<Tagged<T>>,
}

impl<T: Send + 'static> TaskScope<T> {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<Tagged<T>>) -> Self {
        Self {
            generation,
            tasks: JoinSet::new(),
            tx,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run `work` in the background; every value it emits is tagged with this scope
    pub fn spawn<F, Fut>(&mut self, work: F)
    where
        F: FnOnce(Emitter<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // Reap finished tasks so the set does not grow without bound
        while self.tasks.try_join_next().is_some() {}

        let emitter = Emitter {
            generation: self.generation,
            tx: self.tx.clone(),
        };
        self.tasks.spawn(work(emitter));
    }

    /// Number of tasks not yet reaped
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every in-flight task
    pub fn cancel(&mut self) {
        if !self.tasks.is_empty() {
            debug!(
                generation = self.generation,
                tasks = self.tasks.len(),
                "cancelling screen tasks"
            );
        }
        self.tasks.abort_all();
    }

    /// Replace this scope with a new generation, cancelling the old one
    pub fn renew(&mut self) {
        self.cancel();
        self.generation += 1;
        self.tasks = JoinSet::new();
    }
}

impl<T> Drop for TaskScope<T> {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

/// Handle a task uses to send results back
pub struct Emitter<T> {
    generation: u64,
    tx: mpsc::UnboundedSender<Tagged<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            tx: self.tx.clone(),
        }
    }
}

impl<T> Emitter<T> {
    /// Send a value; false once the receiving side is gone
    pub fn emit(&self, value: T) -> bool {
        self.tx
            .send(Tagged {
                generation: self.generation,
                value,
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_results_carry_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scope = TaskScope::new(7, tx);

        scope.spawn(|emit| async move {
            emit.emit("loaded");
        });

        let tagged = rx.recv().await.unwrap();
        assert_eq!(tagged.generation, 7);
        assert_eq!(tagged.value, "loaded");
    }

    #[tokio::test]
    async fn test_renew_aborts_in_flight_work() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scope = TaskScope::new(1, tx);

        scope.spawn(|emit| async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            emit.emit("too late");
        });
        scope.renew();
        assert_eq!(scope.generation(), 2);

        scope.spawn(|emit| async move {
            emit.emit("fresh");
        });

        let tagged = rx.recv().await.unwrap();
        assert_eq!(tagged.generation, 2);
        assert_eq!(tagged.value, "fresh");
        assert!(
            tokio::time::timeout(Duration::from_millis(50), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_drop_cancels_tasks() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Tagged<&str>>();
        {
            let mut scope = TaskScope::new(1, tx);
            scope.spawn(|emit| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                emit.emit("never");
            });
        }
        // All senders are gone once the aborted task is dropped
        assert!(rx.recv().await.is_none());
    }
}
