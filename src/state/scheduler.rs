//! Cancellable timers. Every task is aborted when its handle is dropped, so
//! clearing the [`Scheduler`] stops everything it started.

use chrono::{DateTime, Utc};
use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};

pub struct ScheduledTask {
    label: String,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` until it finishes or the scheduler is cleared.
    pub fn spawn<F>(&mut self, label: impl Into<String>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(ScheduledTask { label: label.into(), handle: tokio::spawn(task) });
    }

    /// Send `message` every `period`, first one a full period from now.
    pub fn every<T>(&mut self, label: impl Into<String>, period: Duration, tx: mpsc::Sender<T>, message: T)
    where
        T: Clone + Send + 'static,
    {
        self.spawn(label, async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if tx.send(message.clone()).await.is_err() {
                    break;
                }
            }
        });
    }

    /// Send `message` once after `delay`.
    pub fn after<T>(&mut self, label: impl Into<String>, delay: Duration, tx: mpsc::Sender<T>, message: T)
    where
        T: Send + 'static,
    {
        self.spawn(label, async move {
            sleep_until(Instant::now() + delay).await;
            let _ = tx.send(message).await;
        });
    }

    /// Send `message` once at wall-clock time `deadline`; immediately if it
    /// has already passed.
    pub fn at<T>(&mut self, label: impl Into<String>, deadline: DateTime<Utc>, tx: mpsc::Sender<T>, message: T)
    where
        T: Send + 'static,
    {
        let delay = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        self.after(label, delay, tx, message);
    }

    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            debug!("cancelling {} timer(s)", self.tasks.len());
        }
        self.tasks.clear();
    }

    /// Timers that have not fired or stopped yet.
    pub fn active(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| !t.is_finished())
            .map(ScheduledTask::label)
            .collect()
    }
}
