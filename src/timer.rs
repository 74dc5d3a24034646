use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// A repeating timer that feeds events into the state loop. The task is
/// aborted when the handle is dropped.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// First firing is one `period` after the call.
    pub fn repeating<E, F>(period: Duration, events: UnboundedSender<E>, make_event: F) -> Self
    where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(make_event()).is_err() {
                    // Receiver gone, nothing left to drive
                    break;
                }
            }
        });
        TimerHandle { task }
    }

    pub fn cancel(self) {}
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
