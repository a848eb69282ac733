use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::collaborators::{NoteKind, Notifier, RewardSink};
use crate::config::ScanConfig;
use crate::error::ScanError;

use super::classifier::Classifier;
use super::frame::FrameSource;
use super::loop_worker::scan_loop;
use super::reconcile::{reconcile, ScanOutcome};
use super::state::{PipelineSnapshot, PipelineState, PipelineStatus};

/// Everything a scan needs: the shared state plus the collaborators invoked
/// when a classification lands. Cloned into the live loop task.
#[derive(Clone)]
pub(super) struct PipelineCore {
    pub(super) state: Arc<Mutex<PipelineState>>,
    pub(super) classifier: Arc<dyn Classifier>,
    pub(super) rewards: Arc<dyn RewardSink>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) config: ScanConfig,
}

impl PipelineCore {
    /// One full round trip: sample a frame, classify it, reconcile the result
    /// into state and collaborators. Assumes the caller already advanced the
    /// status to `AwaitingResult`; always settles back to a stable status.
    ///
    /// The success effects (current item, history, reward, notification) run
    /// as a group under the state lock; a failed classification reaches none
    /// of them.
    pub(super) async fn perform_scan(
        &self,
        source: &dyn FrameSource,
        live_armed: bool,
    ) -> Result<ScanOutcome, ScanError> {
        let result = self.capture_and_classify(source).await;

        let mut state = self.state.lock().await;
        let settled = match result {
            Ok(classification) => {
                let outcome = reconcile(classification, Utc::now());
                state.record_success(&outcome);
                self.rewards.increment(outcome.reward_points);
                self.notifier.notify(
                    &format!("Earned {} Green Coins!", outcome.reward_points),
                    NoteKind::Success,
                );
                Ok(outcome)
            }
            Err(err) => {
                state.record_failure();
                Err(err)
            }
        };
        state.settle(live_armed);
        settled
    }

    async fn capture_and_classify(
        &self,
        source: &dyn FrameSource,
    ) -> Result<super::classifier::ClassificationResult, ScanError> {
        // No frame means no network call at all.
        let frame = source.sample_frame().await?;

        match tokio::time::timeout(
            self.config.classify_timeout(),
            self.classifier.classify(&frame),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ScanError::Transport(format!(
                "classify call exceeded {}ms",
                self.config.classify_timeout_ms
            ))),
        }
    }
}

struct LiveLoop {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

/// Owns the scan pipeline: live-mode arming, one-shot scans, and read-only
/// snapshots of status and history.
#[derive(Clone)]
pub struct ScanController {
    core: PipelineCore,
    live: Arc<Mutex<LiveLoop>>,
}

impl ScanController {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        rewards: Arc<dyn RewardSink>,
        notifier: Arc<dyn Notifier>,
        config: ScanConfig,
    ) -> Self {
        let state = Arc::new(Mutex::new(PipelineState::new(config.history_capacity)));
        Self {
            core: PipelineCore {
                state,
                classifier,
                rewards,
                notifier,
                config,
            },
            live: Arc::new(Mutex::new(LiveLoop {
                handle: None,
                cancel_token: None,
            })),
        }
    }

    /// Arm live mode: spawn the periodic capture loop. Returns the session id
    /// threaded through the loop's log lines.
    pub async fn start_live(&self, source: Arc<dyn FrameSource>) -> Result<Uuid> {
        let mut live = self.live.lock().await;
        if live.handle.is_some() {
            bail!("live scanning already active");
        }

        let session_id = Uuid::new_v4();
        {
            let mut state = self.core.state.lock().await;
            if state.status != PipelineStatus::Idle {
                bail!("pipeline busy, cannot arm live mode");
            }
            state.arm_live(session_id);
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(scan_loop(
            session_id,
            source,
            self.core.clone(),
            cancel_token.clone(),
        ));

        live.handle = Some(handle);
        live.cancel_token = Some(cancel_token);
        info!("live scanning armed, session {session_id}");
        Ok(session_id)
    }

    /// Disarm live mode. Cancels the pending timer synchronously; an in-flight
    /// classification runs to completion (and reconciles exactly once) before
    /// the loop exits without re-arming. Idempotent when not armed.
    pub async fn stop_live(&self) -> Result<()> {
        let (token, handle) = {
            let mut live = self.live.lock().await;
            (live.cancel_token.take(), live.handle.take())
        };

        if let Some(token) = token {
            token.cancel();
        }

        if let Some(handle) = handle {
            handle.await.context("scan loop task failed to join")?;
        }
        Ok(())
    }

    /// One-shot scan of a single frame, bypassing the timer:
    /// `Idle -> AwaitingResult -> Idle`.
    pub async fn scan_once(&self, source: &dyn FrameSource) -> Result<ScanOutcome, ScanError> {
        self.core.state.lock().await.begin_one_shot()?;

        match self.core.perform_scan(source, false).await {
            Ok(outcome) => {
                info!(
                    "one-shot scan: {} ({}), +{} coins",
                    outcome.label, outcome.category, outcome.reward_points
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!("one-shot scan failed: {err}");
                Err(err)
            }
        }
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        self.core.state.lock().await.snapshot()
    }

    pub async fn reset_history(&self) {
        self.core.state.lock().await.history.reset();
    }
}
