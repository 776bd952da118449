use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    config::Config,
    error::SchedulerError,
    events::Bus,
    subscribers::{self, Subscribe},
};

use super::scheduler::Scheduler;

/// Builder for constructing a [`Scheduler`] with optional subscribers.
pub struct SchedulerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive scheduler events (claims, hand-offs, work outcomes,
    /// idle notifications) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds and returns the Scheduler instance.
    ///
    /// This consumes the builder and initializes:
    /// - the slot pool and both waiter queues
    /// - the event bus
    /// - subscriber workers and the bus listener (only if subscribers were set)
    ///
    /// The current tokio runtime is captured here; every job and subscriber
    /// worker runs on it.
    ///
    /// ### Errors
    /// - [`SchedulerError::InvalidWorkerCount`] if `cfg.workers == 0`
    /// - [`SchedulerError::NoRuntime`] if called outside a tokio runtime
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        self.cfg.validate()?;
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        if !self.subscribers.is_empty() {
            let _ = subscribers::spawn_listener(&runtime, bus.subscribe(), self.subscribers);
        }

        Ok(Scheduler::from_config(&self.cfg, bus, runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let err = Scheduler::builder(Config::with_workers(1))
            .with_subscribers(vec![Arc::new(Recorder::default())])
            .build()
            .unwrap_err();
        assert_eq!(err, SchedulerError::NoRuntime);

        assert_eq!(Scheduler::new(3).unwrap_err(), SchedulerError::NoRuntime);
    }

    #[test]
    fn test_invalid_config_reported_before_runtime() {
        assert_eq!(
            Scheduler::new(0).unwrap_err(),
            SchedulerError::InvalidWorkerCount { workers: 0 }
        );
    }

    #[test]
    fn test_submit_from_outside_runtime() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let q = rt.block_on(async { Scheduler::new(2) }).unwrap();

        // Submission only needs the captured handle, not an entered runtime.
        let job = q.submit_sync(|| 6 * 7);
        assert_eq!(rt.block_on(job), Ok(42));
        assert!(q.is_idle());
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let recorder = Arc::new(Recorder::default());
        let q = Scheduler::builder(Config::with_workers(1))
            .with_subscribers(vec![recorder.clone()])
            .build()
            .unwrap();

        q.submit_sync(|| ()).await.unwrap();
        q.submit_async(|| async { Err::<(), _>("nope") })
            .await
            .unwrap_err();

        // Subscriber delivery is asynchronous; give the workers a chance to drain.
        for _ in 0..100 {
            if recorder.kinds.lock().unwrap().contains(&EventKind::WorkFailed) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let kinds = recorder.kinds.lock().unwrap().clone();
        assert!(kinds.contains(&EventKind::SlotClaimed));
        assert!(kinds.contains(&EventKind::WorkStarted));
        assert!(kinds.contains(&EventKind::WorkCompleted));
        assert!(kinds.contains(&EventKind::SlotReleased));
        assert!(kinds.contains(&EventKind::WorkFailed));
    }
}
