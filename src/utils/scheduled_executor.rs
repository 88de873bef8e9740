//! Cooperative periodic task runner.
//!
//! One round runs at a time: wake, run the task to completion, sleep until
//! the next period boundary. There is no overlap between rounds and the
//! only suspension point is the sleep.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// A task run on a fixed period by [`ScheduledExecutor`].
pub trait ScheduledTask: Send + Sync + 'static {
    /// Execute one round. Failures are logged by the executor and do not
    /// stop the schedule.
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>>;

    /// When true, the executor stops before the next round.
    fn should_terminate(&self) -> bool {
        false
    }
}

impl<T: ScheduledTask> ScheduledTask for Arc<T> {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        (**self).run()
    }

    fn should_terminate(&self) -> bool {
        (**self).should_terminate()
    }
}

/// Cancels a running [`ScheduledExecutor`] from another task.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Periodic executor for a single task.
pub struct ScheduledExecutor {
    name: String,
    period: Duration,
    shutdown: Arc<AtomicBool>,
}

impl ScheduledExecutor {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self { name: name.into(), period, shutdown: Arc::new(AtomicBool::new(false)) }
    }

    /// Handle for stopping the executor once started.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown.clone())
    }

    /// Run the task now and then once per period, until the shutdown handle
    /// fires or the task asks to terminate.
    pub async fn start<T: ScheduledTask>(self, task: T) {
        tracing::info!("scheduled task '{}' starting, period {:?}", self.name, self.period);

        loop {
            if self.shutdown.load(Ordering::Relaxed) || task.should_terminate() {
                break;
            }

            let next = Instant::now() + self.period;
            if let Err(e) = task.run().await {
                tracing::error!("scheduled task '{}' failed: {:#}", self.name, e);
            }

            if self.shutdown.load(Ordering::Relaxed) || task.should_terminate() {
                break;
            }
            sleep_until(next).await;
        }

        tracing::info!("scheduled task '{}' stopped", self.name);
    }
}
