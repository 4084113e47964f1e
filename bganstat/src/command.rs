//! State-changing commands against the terminal.
//!
//! Command responses are not trusted to reflect final device state: every
//! PDP command schedules a delayed re-fetch and the aggregation cycle
//! remains the single source of truth. The in-flight command is observable
//! through a watch channel and cleared once reconciliation completes.

use std::sync::{atomic::Ordering, Arc};

use chrono::{DateTime, Utc};
use tokio::time;
use tracing::{info, instrument, warn};

use crate::{
    client::PdpActivation,
    error::CommandError,
    monitor::{run_status_cycle, MonitorInner, SignalMonitor},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandKind {
    SaveApn,
    ActivatePdp,
    DeactivatePdp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Pending,
    Succeeded,
    Failed,
}

/// Transient record of a command between submission and reconciliation.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub submitted_at: DateTime<Utc>,
    pub outcome: CommandOutcome,
    /// Which submission this record belongs to; a reconciliation task may
    /// only touch the record of its own command.
    generation: u64,
}

impl SignalMonitor {
    /// Stores an APN profile on the terminal without activating a session.
    ///
    /// All three fields must be non-empty; validation failures never reach
    /// the network. On success the snapshot is refreshed immediately so
    /// `apn_profiles` reflects the stored profile.
    #[instrument(skip(self, user, pass))]
    pub async fn save_apn_profile(
        &self,
        apn: &str,
        user: &str,
        pass: &str,
    ) -> Result<(), CommandError> {
        if apn.trim().is_empty() {
            return Err(CommandError::Validation("apn must not be empty"));
        }
        if user.trim().is_empty() {
            return Err(CommandError::Validation("user must not be empty"));
        }
        if pass.trim().is_empty() {
            return Err(CommandError::Validation("pass must not be empty"));
        }

        let generation = self.begin_command(CommandKind::SaveApn);

        match self.inner().client.save_apn(apn, user, pass).await {
            Ok(true) => {}
            Ok(false) => {
                self.conclude_command(generation, CommandOutcome::Failed);
                return Err(CommandError::Rejected(
                    "terminal refused to store APN profile".into(),
                ));
            }
            Err(e) => {
                self.conclude_command(generation, CommandOutcome::Failed);
                return Err(e.into());
            }
        }

        self.set_outcome(generation, CommandOutcome::Succeeded);
        // The profile table only changes server-side; re-read it right away.
        self.refresh_now().await;
        self.clear_command(generation);

        Ok(())
    }

    /// Brings up the packet-data session. The activation response may lag
    /// the terminal's internal negotiation, so a delayed re-fetch is
    /// scheduled whether the call succeeds or not.
    #[instrument(skip(self))]
    pub async fn activate_pdp(&self) -> Result<PdpActivation, CommandError> {
        // Idempotency is the caller's concern; log state for diagnosis.
        info!(
            pdp_active = self.current_snapshot().pdp_active,
            "submitting PDP activation"
        );
        let generation = self.begin_command(CommandKind::ActivatePdp);

        let result = self.inner().client.activate_pdp().await;
        match &result {
            Ok(act) if act.success => {
                self.set_outcome(generation, CommandOutcome::Succeeded)
            }
            _ => self.set_outcome(generation, CommandOutcome::Failed),
        }
        self.schedule_reconcile(generation);

        match result {
            Ok(act) if act.success => Ok(act),
            Ok(act) => Err(CommandError::Rejected(act.message.unwrap_or_else(
                || "PDP activation failed without a reason".into(),
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Tears down the packet-data session. Fire-and-poll: the response
    /// body is ignored and the new state is learned from reconciliation.
    #[instrument(skip(self))]
    pub async fn deactivate_pdp(&self) -> Result<(), CommandError> {
        info!(
            pdp_active = self.current_snapshot().pdp_active,
            "submitting PDP deactivation"
        );
        let generation = self.begin_command(CommandKind::DeactivatePdp);

        let result = self.inner().client.deactivate_pdp().await;
        match &result {
            Ok(()) => self.set_outcome(generation, CommandOutcome::Succeeded),
            Err(_) => self.set_outcome(generation, CommandOutcome::Failed),
        }
        self.schedule_reconcile(generation);

        result.map_err(CommandError::from)
    }

    fn begin_command(&self, kind: CommandKind) -> u64 {
        let generation =
            self.inner().command_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner().command_tx.send_replace(Some(PendingCommand {
            kind,
            submitted_at: Utc::now(),
            outcome: CommandOutcome::Pending,
            generation,
        }));
        generation
    }

    fn set_outcome(&self, generation: u64, outcome: CommandOutcome) {
        self.inner().command_tx.send_if_modified(|cmd| {
            match cmd.as_mut().filter(|c| c.generation == generation) {
                Some(cmd) => {
                    cmd.outcome = outcome;
                    true
                }
                None => false,
            }
        });
    }

    fn conclude_command(&self, generation: u64, outcome: CommandOutcome) {
        self.set_outcome(generation, outcome);
        self.clear_command(generation);
    }

    fn clear_command(&self, generation: u64) {
        self.inner().command_tx.send_if_modified(|cmd| {
            clear_if_matching(cmd, generation)
        });
    }

    /// Spawns the delayed reconciliation re-fetch. Skipped if the monitor
    /// is stopped before the delay elapses. Only the record of its own
    /// command is cleared; a command submitted in the meantime survives.
    fn schedule_reconcile(&self, generation: u64) {
        let inner: Arc<MonitorInner> = Arc::clone(self.inner());
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.shutdown.cancelled() => {
                    warn!("monitor stopped before command reconciliation");
                }
                _ = time::sleep(inner.config.reconcile_delay) => {
                    run_status_cycle(&inner).await;
                }
            }
            inner
                .command_tx
                .send_if_modified(|cmd| clear_if_matching(cmd, generation));
        });
    }
}

fn clear_if_matching(cmd: &mut Option<PendingCommand>, generation: u64) -> bool {
    if cmd.as_ref().is_some_and(|c| c.generation == generation) {
        *cmd = None;
        true
    } else {
        false
    }
}
