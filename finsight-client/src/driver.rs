//! Processing driver: runs one upload + analysis cycle on a tokio task.
//!
//! Upload steps are sequential (sleep, then advance). Polling reschedules
//! itself only after the previous check finished, so checks never overlap.
//! The cancel flag is checked before every sleep and after every check.
//! A cycle still unresolved after `ProcessingConfig::poll_deadline` fails.

use chrono::Utc;
use finsight_core::{
    FailureCause, ProcessingConfig, ProcessingState, StatusMachine, TransitionError, UploadCandidate,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::status::StatusSource;

/// Fresh client-side statement id: `stmt_<unix millis>`.
pub fn new_statement_id() -> String {
    format!("stmt_{}", Utc::now().timestamp_millis())
}

pub struct ProcessingHandle {
    cancel: CancelFlag,
    updates: watch::Receiver<ProcessingState>,
    join: JoinHandle<Option<ProcessingState>>,
}

impl ProcessingHandle {
    /// Stop the cycle; no further snapshots are published.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProcessingState> {
        self.updates.clone()
    }

    pub fn latest(&self) -> ProcessingState {
        self.updates.borrow().clone()
    }

    /// Final state, or `None` if the cycle was cancelled.
    pub async fn wait(self) -> Option<ProcessingState> {
        self.join.await.ok().flatten()
    }
}

pub fn spawn_processing<S: StatusSource>(
    candidate: UploadCandidate,
    config: ProcessingConfig,
    source: S,
) -> ProcessingHandle {
    let cancel = CancelFlag::new();
    let (tx, rx) = watch::channel(ProcessingState::idle());
    let join = tokio::spawn(run_cycle(candidate, config, source, cancel.clone(), tx));
    ProcessingHandle {
        cancel,
        updates: rx,
        join,
    }
}

fn upload_steps(step_percent: u8) -> Vec<u8> {
    let step = step_percent.clamp(1, 100) as usize;
    let mut steps: Vec<u8> = (0..=100u8).step_by(step).collect();
    if steps.last() != Some(&100) {
        steps.push(100);
    }
    steps
}

fn publish(tx: &watch::Sender<ProcessingState>, machine: &StatusMachine) {
    tx.send_replace(machine.state().clone());
}

fn check_transition(result: Result<(), TransitionError>) -> Option<()> {
    match result {
        Ok(()) => Some(()),
        Err(e) => {
            warn!(error = %e, "processing driver stopped on illegal transition");
            None
        }
    }
}

async fn run_cycle<S: StatusSource>(
    candidate: UploadCandidate,
    config: ProcessingConfig,
    mut source: S,
    cancel: CancelFlag,
    tx: watch::Sender<ProcessingState>,
) -> Option<ProcessingState> {
    let mut machine = StatusMachine::new(config.clone());

    check_transition(machine.start_upload())?;
    publish(&tx, &machine);
    info!(file = %candidate.name, size_mib = candidate.size_mib(), "upload started");

    for pct in upload_steps(config.upload_step_percent) {
        if cancel.is_cancelled() {
            debug!("upload cancelled");
            return None;
        }
        sleep(config.upload_step_delay).await;
        if cancel.is_cancelled() {
            debug!("upload cancelled");
            return None;
        }
        check_transition(machine.advance_upload(f64::from(pct)))?;
        publish(&tx, &machine);
    }

    let statement_id = new_statement_id();
    check_transition(machine.begin_processing(statement_id.clone()))?;
    publish(&tx, &machine);
    info!(%statement_id, "processing started");

    let started = Instant::now();
    let deadline = config.poll_deadline();
    loop {
        if cancel.is_cancelled() {
            debug!(%statement_id, "polling cancelled");
            return None;
        }

        let result = source.check(&statement_id, started.elapsed()).await;
        if cancel.is_cancelled() {
            debug!(%statement_id, "late status ignored after cancel");
            return None;
        }

        let applied = match result {
            Ok(update) => machine.apply_update(update),
            Err(e) => {
                warn!(%statement_id, error = %e, "status check failed");
                machine.fail(FailureCause::Service {
                    detail: e.to_string(),
                })
            }
        };
        check_transition(applied)?;

        if !machine.status().is_terminal() && started.elapsed() >= deadline {
            warn!(%statement_id, deadline_secs = deadline.as_secs(), "no result before deadline");
            check_transition(machine.fail(FailureCause::Service {
                detail: format!("no result after {}s", deadline.as_secs()),
            }))?;
        }
        publish(&tx, &machine);

        if machine.status().is_terminal() {
            info!(%statement_id, status = %machine.status(), "processing finished");
            break;
        }
        sleep(config.poll_interval).await;
    }

    Some(machine.state().clone())
}
