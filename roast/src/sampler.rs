use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::calltree::SharedCallTree;
use crate::snapshot::SnapshotSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SamplerState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl From<u8> for SamplerState {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerError {
    #[error("sampling interval must be greater than 0")]
    ZeroInterval,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SamplerConfig {
    pub interval_ms: u64,
    /// sampling stops on the first tick at or after this instant
    pub end_time: Option<SystemTime>,
    /// only record the thread with exactly this name
    pub thread_filter: Option<String>,
}

/// Counters readable while the sampler runs on another thread.
#[derive(Debug)]
pub struct SamplerStatus {
    state: AtomicU8,
    ticks: AtomicU64,
    skipped: AtomicU64,
    interval_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub state: SamplerState,
    pub ticks: u64,
    pub skipped: u64,
    pub interval_ms: u64,
}

impl SamplerStatus {
    fn new(interval_ms: u64) -> Self {
        Self {
            state: AtomicU8::new(SamplerState::Idle as u8),
            ticks: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            interval_ms,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state.load(Ordering::Acquire).into()
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            state: self.state(),
            ticks: self.ticks.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            interval_ms: self.interval_ms,
        }
    }
}

/// Pulls snapshots from a source and folds them into the call tree, one tick
/// at a time. Scheduling lives in [`run`].
pub struct Sampler<S> {
    source: S,
    tree: SharedCallTree,
    config: SamplerConfig,
    status: Arc<SamplerStatus>,
}

impl<S: SnapshotSource> Sampler<S> {
    pub fn new(source: S, tree: SharedCallTree, config: SamplerConfig) -> Result<Self, SamplerError> {
        if config.interval_ms == 0 {
            return Err(SamplerError::ZeroInterval);
        }
        let status = Arc::new(SamplerStatus::new(config.interval_ms));
        Ok(Self {
            source,
            tree,
            config,
            status,
        })
    }

    pub fn state(&self) -> SamplerState {
        self.status.state()
    }

    pub fn status(&self) -> Arc<SamplerStatus> {
        Arc::clone(&self.status)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }

    pub fn start(&mut self) {
        if self.state() == SamplerState::Idle {
            info!("sampling every {}ms", self.config.interval_ms);
            self.set_state(SamplerState::Running);
        }
    }

    /// Idempotent. A stopped sampler never ticks again.
    pub fn stop(&mut self) {
        if self.state() != SamplerState::Stopped {
            info!("sampling has stopped");
            self.set_state(SamplerState::Stopped);
        }
    }

    fn set_state(&self, state: SamplerState) {
        self.status.state.store(state as u8, Ordering::Release);
    }

    pub fn tick(&mut self) -> SamplerState {
        self.tick_at(SystemTime::now())
    }

    pub fn tick_at(&mut self, now: SystemTime) -> SamplerState {
        match self.state() {
            SamplerState::Stopped => return SamplerState::Stopped,
            SamplerState::Idle => self.start(),
            SamplerState::Running => {}
        }

        if matches!(self.config.end_time, Some(end) if end <= now) {
            self.stop();
            return SamplerState::Stopped;
        }

        // may block, the tree stays readable meanwhile
        let Some(snapshot) = self.source.sample() else {
            debug!("no snapshot available, skipping tick");
            self.status.skipped.fetch_add(1, Ordering::Relaxed);
            return SamplerState::Running;
        };

        let mut tree = self.tree.write();
        for stack in &snapshot {
            if let Some(filter) = &self.config.thread_filter {
                if *filter != stack.thread {
                    continue;
                }
            }
            tree.observe(&stack.thread, &stack.frames, self.config.interval_ms);
        }
        drop(tree);

        self.status.ticks.fetch_add(1, Ordering::Relaxed);
        SamplerState::Running
    }
}

/// Requests a running [`run`] loop to stop before its next tick.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self(Arc::new(tx)), rx)
    }

    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// Drive `sampler` at its fixed interval until it stops on its own or `stop_rx`
/// fires. Ticks run one after another on the blocking pool; a stop request is
/// only observed between ticks.
pub async fn run<S>(mut sampler: Sampler<S>, mut stop_rx: watch::Receiver<bool>) -> Result<Sampler<S>>
where
    S: SnapshotSource + 'static,
{
    let period = sampler.interval();
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    sampler.start();

    loop {
        if *stop_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = interval.tick() => (),
            res = stop_rx.changed() => {
                if res.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        let (returned, state) = task::spawn_blocking(move || {
            let state = sampler.tick();
            (sampler, state)
        })
        .await?;
        sampler = returned;

        if state == SamplerState::Stopped {
            return Ok(sampler);
        }
    }

    sampler.stop();
    Ok(sampler)
}
