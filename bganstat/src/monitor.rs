//! Polling engine: owns the device snapshot and signal history, drives the
//! two refresh cadences, and guarantees whole-unit snapshot replacement.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{
    client::TerminalClient,
    command::PendingCommand,
    status::{DeviceSnapshot, NetworkStatus, SignalSample},
};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub status_interval: Duration,
    pub history_interval: Duration,
    pub history_limit: usize,
    /// Delay before the post-command reconciliation refresh.
    pub reconcile_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(10),
            history_interval: Duration::from_secs(30),
            history_limit: 50,
            reconcile_delay: Duration::from_millis(1500),
        }
    }
}

/// Owns the terminal state and its refresh lifecycle. Readers get watch
/// receivers; nothing outside this type mutates the snapshot or history.
pub struct SignalMonitor {
    inner: Arc<MonitorInner>,
    tasks: Vec<JoinHandle<()>>,
}

pub(crate) struct MonitorInner {
    pub(crate) client: TerminalClient,
    pub(crate) config: MonitorConfig,
    pub(crate) snapshot_tx: watch::Sender<DeviceSnapshot>,
    pub(crate) history_tx: watch::Sender<Vec<SignalSample>>,
    pub(crate) command_tx: watch::Sender<Option<PendingCommand>>,
    /// Monotonic command counter; ties each reconciliation task to the
    /// command it belongs to.
    pub(crate) command_seq: AtomicU64,
    loading: AtomicBool,
    /// At most one aggregation cycle runs at a time; later callers queue.
    cycle_lock: Mutex<()>,
    pub(crate) shutdown: CancellationToken,
}

impl SignalMonitor {
    /// Builds the monitor without arming any timers. Refreshes only happen
    /// through [`Self::refresh_now`] / [`Self::refresh_history_now`] and
    /// command reconciliation.
    pub fn new(client: TerminalClient, config: MonitorConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(DeviceSnapshot::default());
        let (history_tx, _) = watch::channel(Vec::new());
        let (command_tx, _) = watch::channel(None);

        let inner = Arc::new(MonitorInner {
            client,
            config,
            snapshot_tx,
            history_tx,
            command_tx,
            command_seq: AtomicU64::new(0),
            loading: AtomicBool::new(false),
            cycle_lock: Mutex::new(()),
            shutdown: CancellationToken::new(),
        });

        Self {
            inner,
            tasks: Vec::new(),
        }
    }

    /// Builds the monitor and arms both periodic pollers. The first status
    /// cycle and history refresh run immediately.
    pub fn start(client: TerminalClient, config: MonitorConfig) -> Self {
        let mut monitor = Self::new(client, config);
        monitor.tasks.push(spawn_status_poller(monitor.inner.clone()));
        monitor
            .tasks
            .push(spawn_history_poller(monitor.inner.clone()));
        monitor
    }

    /// Cancels both pollers and waits for them to wind down. A cycle that
    /// is in flight completes but its result is discarded.
    pub async fn stop(self) {
        self.inner.shutdown.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("poller task did not shut down cleanly: {e}");
            }
        }
    }

    pub fn snapshot(&self) -> watch::Receiver<DeviceSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn history(&self) -> watch::Receiver<Vec<SignalSample>> {
        self.inner.history_tx.subscribe()
    }

    pub fn pending_command(&self) -> watch::Receiver<Option<PendingCommand>> {
        self.inner.command_tx.subscribe()
    }

    pub fn current_snapshot(&self) -> DeviceSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    pub fn current_history(&self) -> Vec<SignalSample> {
        self.inner.history_tx.borrow().clone()
    }

    /// True while an aggregation cycle is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Runs one aggregation cycle to completion, queuing behind any cycle
    /// already in flight.
    pub async fn refresh_now(&self) {
        run_status_cycle(&self.inner).await;
    }

    /// Fetches the signal history once, replacing the buffer wholesale.
    pub async fn refresh_history_now(&self) {
        run_history_cycle(&self.inner).await;
    }

    pub(crate) fn inner(&self) -> &Arc<MonitorInner> {
        &self.inner
    }
}

fn spawn_status_poller(inner: Arc<MonitorInner>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(inner.config.status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = inner.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            run_status_cycle(&inner).await;
        }
    })
}

fn spawn_history_poller(inner: Arc<MonitorInner>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(inner.config.history_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = inner.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            run_history_cycle(&inner).await;
        }
    })
}

/// Clears the loading flag on every exit path of a cycle.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One aggregation cycle: query every status resource, folding results
/// into a copy of the current snapshot. A failed query keeps the previous
/// value for its fields; the snapshot is published whole at the end, and
/// only if no shutdown was requested in the meantime.
#[instrument(skip(inner), name = "status_cycle")]
pub(crate) async fn run_status_cycle(inner: &MonitorInner) {
    let _cycle = inner.cycle_lock.lock().await;
    inner.loading.store(true, Ordering::SeqCst);
    let _loading = LoadingGuard(&inner.loading);

    let mut next = inner.snapshot_tx.borrow().clone();

    match inner.client.signal().await {
        Ok(reading) => {
            next.signal_db = reading.signal_strength;
            next.signal_timestamp = reading.timestamp;
        }
        Err(e) => warn!("signal query failed, keeping previous reading: {e}"),
    }

    match inner.client.satellite().await {
        Ok(sat) => {
            next.satellite_id = sat.satellite_id;
            next.satellite_name = sat.satellite_name;
        }
        Err(e) => warn!("satellite query failed: {e}"),
    }

    match inner.client.imei().await {
        Ok(imei) => next.imei = imei,
        Err(e) => warn!("imei query failed: {e}"),
    }

    match inner.client.imsi().await {
        Ok(imsi) => next.imsi = imsi,
        Err(e) => warn!("imsi query failed: {e}"),
    }

    match inner.client.network().await {
        Ok(status_text) => next.network_status = NetworkStatus::from(status_text),
        Err(e) => warn!("network query failed: {e}"),
    }

    match inner.client.apn_profiles().await {
        Ok(profiles) => next.apn_profiles = Some(profiles),
        Err(e) => warn!("apn query failed: {e}"),
    }

    match inner.client.pdp_status().await {
        Ok(pdp) => {
            next.pdp_active = pdp.pdp_active;
            next.pdp_ip = pdp.ip;
        }
        Err(e) => warn!("pdp-status query failed: {e}"),
    }

    if inner.shutdown.is_cancelled() {
        debug!("monitor stopped mid-cycle, discarding snapshot");
        return;
    }

    inner.snapshot_tx.send_replace(next);
}

/// One history refresh. The terminal is authoritative for the window: on
/// success the buffer is replaced wholesale, on failure it is left alone.
pub(crate) async fn run_history_cycle(inner: &MonitorInner) {
    match inner.client.signal_history(inner.config.history_limit).await {
        Ok(mut samples) => {
            let limit = inner.config.history_limit;
            if samples.len() > limit {
                // Samples arrive oldest-first; keep the newest `limit`.
                samples.drain(..samples.len() - limit);
            }

            if inner.shutdown.is_cancelled() {
                debug!("monitor stopped mid-refresh, discarding history");
                return;
            }

            inner.history_tx.send_replace(samples);
        }
        Err(e) => warn!("history query failed, keeping previous buffer: {e}"),
    }
}
