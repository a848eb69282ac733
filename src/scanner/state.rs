use serde::Serialize;
use uuid::Uuid;

use crate::error::ScanError;

use super::history::ScanHistory;
use super::reconcile::ScanOutcome;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStatus {
    Idle,
    Capturing,
    AwaitingResult,
}

/// What a timer tick should do, decided against the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Start a capture; status has already advanced to `AwaitingResult`.
    Capture,
    /// A round trip is still in flight (or the loop is winding down); the
    /// tick is dropped, not queued.
    Drop,
}

/// Monotonic pipeline counters, exposed read-only through the snapshot.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub capture_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub dropped_ticks: u64,
    pub points_awarded: u64,
}

/// Read-only view of the pipeline handed to the UI boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSnapshot {
    pub status: PipelineStatus,
    pub session_id: Option<Uuid>,
    pub current: Option<ScanOutcome>,
    pub history: Vec<ScanOutcome>,
    pub stats: ScanStats,
}

/// Mutable pipeline state. Owned exclusively by the controller behind a lock;
/// every mutation goes through the methods here.
#[derive(Debug)]
pub struct PipelineState {
    pub status: PipelineStatus,
    pub session_id: Option<Uuid>,
    pub current: Option<ScanOutcome>,
    pub history: ScanHistory,
    pub stats: ScanStats,
}

impl PipelineState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            status: PipelineStatus::Idle,
            session_id: None,
            current: None,
            history: ScanHistory::new(history_capacity),
            stats: ScanStats::default(),
        }
    }

    /// Arm live mode. Only valid from `Idle`.
    pub fn arm_live(&mut self, session_id: Uuid) {
        self.status = PipelineStatus::Capturing;
        self.session_id = Some(session_id);
    }

    /// Loop exit: back to `Idle`, session forgotten.
    pub fn disarm(&mut self) {
        self.status = PipelineStatus::Idle;
        self.session_id = None;
    }

    /// Decide what a timer tick does. At most one classification is ever in
    /// flight: a tick landing while `AwaitingResult` is dropped outright.
    pub fn begin_tick(&mut self) -> TickAction {
        match self.status {
            PipelineStatus::Capturing => {
                self.status = PipelineStatus::AwaitingResult;
                self.stats.capture_count += 1;
                TickAction::Capture
            }
            PipelineStatus::AwaitingResult | PipelineStatus::Idle => {
                self.stats.dropped_ticks += 1;
                TickAction::Drop
            }
        }
    }

    /// Start a one-shot scan, bypassing the timer.
    pub fn begin_one_shot(&mut self) -> Result<(), ScanError> {
        if self.status != PipelineStatus::Idle {
            return Err(ScanError::Busy("a scan is already in progress"));
        }
        self.status = PipelineStatus::AwaitingResult;
        self.stats.capture_count += 1;
        Ok(())
    }

    /// A round trip finished; settle back to the stable status for the mode.
    pub fn settle(&mut self, live_armed: bool) {
        self.status = if live_armed {
            PipelineStatus::Capturing
        } else {
            PipelineStatus::Idle
        };
    }

    /// Record a reconciled outcome: displayed item, rolling history, counters.
    pub fn record_success(&mut self, outcome: &ScanOutcome) {
        self.stats.success_count += 1;
        self.stats.points_awarded += u64::from(outcome.reward_points);
        self.current = Some(outcome.clone());
        self.history.record(outcome.clone());
    }

    pub fn record_failure(&mut self) {
        self.stats.failure_count += 1;
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            status: self.status,
            session_id: self.session_id,
            current: self.current.clone(),
            history: self.history.entries(),
            stats: self.stats.clone(),
        }
    }
}
