//! Fire-and-forget background tasks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub trait TaskSpawner: Send + Sync {
    /// Start `task` without waiting for it.
    fn spawn(&self, name: &'static str, task: BoxFuture<()>);
}

/// Hands tasks to the ambient tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, name: &'static str, task: BoxFuture<()>) {
        log::debug!("Spawning background task {}", name);
        tokio::spawn(task);
    }
}

/// Keeps spawned tasks so tests can count and drive them.
#[derive(Default)]
pub struct RecordingSpawner {
    tasks: Mutex<Vec<(&'static str, BoxFuture<()>)>>,
    spawned: Mutex<Vec<&'static str>>,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every task ever spawned, in order.
    pub fn spawned(&self) -> Vec<&'static str> {
        self.spawned.lock().unwrap().clone()
    }

    /// Await every task that has not run yet.
    pub async fn run_pending(&self) {
        let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
        for (_, task) in tasks {
            task.await;
        }
    }
}

impl TaskSpawner for RecordingSpawner {
    fn spawn(&self, name: &'static str, task: BoxFuture<()>) {
        self.spawned.lock().unwrap().push(name);
        self.tasks.lock().unwrap().push((name, task));
    }
}
