use std::future::Future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Scheduled callbacks owned by one dialogue session.
#[derive(Default)]
pub struct TaskQueue {
    handles: Vec<JoinHandle<()>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, runtime: &Handle, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.retain(|handle| !handle.is_finished());
        self.handles.push(runtime.spawn(task));
    }

    /// Tasks that have not run to completion yet.
    pub fn outstanding(&self) -> usize {
        self.handles
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Aborts every task still queued or sleeping.
    pub fn cancel_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
