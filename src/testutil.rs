//! Shared test doubles: probes, effects, and a collecting listener.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::time;

use crate::{
    effects::TransitionEffects,
    listeners::ModeListener,
    mode::ModeChange,
    probes::{ActivityProbe, ProcessingProbe},
};

/// Activity probe with a settable "time since last input" and call counters.
#[derive(Default)]
pub(crate) struct MockActivity {
    since: Mutex<Duration>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl MockActivity {
    pub fn with_idle(since: Duration) -> Self {
        Self {
            since: Mutex::new(since),
            ..Self::default()
        }
    }

    pub fn set_idle(&self, since: Duration) {
        *self.since.lock().unwrap() = since;
    }
}

impl ActivityProbe for MockActivity {
    fn time_since_last_input(&self) -> Duration {
        *self.since.lock().unwrap()
    }

    fn start_monitoring(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_monitoring(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Processing probe with settable state.
#[derive(Default)]
pub(crate) struct MockProcessing {
    processing: AtomicBool,
    pending: AtomicU32,
    job: Mutex<Option<String>>,
}

impl MockProcessing {
    pub fn set_processing(&self, on: bool) {
        self.processing.store(on, Ordering::SeqCst);
    }

    pub fn set_pending(&self, count: u32) {
        self.pending.store(count, Ordering::SeqCst);
    }

    pub fn set_job(&self, id: Option<&str>) {
        *self.job.lock().unwrap() = id.map(str::to_owned);
    }
}

impl ProcessingProbe for MockProcessing {
    fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    fn pending_task_count(&self) -> u32 {
        self.pending.load(Ordering::SeqCst)
    }

    fn current_job_id(&self) -> Option<String> {
        self.job.lock().unwrap().clone()
    }
}

/// Effects double that records calls in order, and can be told to delay every
/// call or fail a specific one.
#[derive(Default)]
pub(crate) struct RecordingEffects {
    calls: Mutex<Vec<String>>,
    fail: Mutex<Option<&'static str>>,
    delay: Mutex<Option<Duration>>,
}

impl RecordingEffects {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Makes the named call return an error after being recorded.
    pub fn fail_on(&self, name: &'static str) {
        *self.fail.lock().unwrap() = Some(name);
    }

    /// Makes every call sleep before completing.
    pub fn delay_all(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn apply(&self, name: &str) -> Result<()> {
        self.calls.lock().unwrap().push(name.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            time::sleep(d).await;
        }
        let fail = *self.fail.lock().unwrap();
        if let Some(target) = fail {
            if name.starts_with(target) {
                bail!("{target} refused");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TransitionEffects for RecordingEffects {
    async fn start_worker_service(&self) -> Result<()> {
        self.apply("start_worker").await
    }

    async fn stop_worker_service(&self) -> Result<()> {
        self.apply("stop_worker").await
    }

    async fn transfer_pending_tasks(&self, count: u32) -> Result<()> {
        self.apply(&format!("transfer({count})")).await
    }

    async fn notify_coordination(&self, event: &str, worker_available: bool) -> Result<()> {
        self.apply(&format!("notify({event}, {worker_available})"))
            .await
    }
}

/// Listener that collects every change it sees.
#[derive(Default)]
pub(crate) struct CollectingListener {
    changes: Mutex<Vec<ModeChange>>,
}

impl CollectingListener {
    pub fn changes(&self) -> Vec<ModeChange> {
        self.changes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModeListener for CollectingListener {
    async fn on_mode_change(&self, change: &ModeChange) {
        self.changes.lock().unwrap().push(change.clone());
    }
}
