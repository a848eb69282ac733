use log::{info, warn};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ScanError;

use super::controller::PipelineCore;
use super::frame::FrameSource;
use super::state::TickAction;

/// Live-mode worker: capture and classify on a fixed period until cancelled.
///
/// The tick body is awaited inline, never raced against cancellation, so a
/// round trip in flight at teardown finishes and reconciles exactly once; the
/// loop then exits without re-arming. Ticks that would land mid round trip
/// are dropped, not queued.
pub(super) async fn scan_loop(
    session_id: Uuid,
    source: Arc<dyn FrameSource>,
    core: PipelineCore,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(core.config.capture_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let action = core.state.lock().await.begin_tick();
                if action == TickAction::Drop {
                    continue;
                }

                match core.perform_scan(source.as_ref(), true).await {
                    Ok(outcome) => {
                        info!(
                            "session {session_id}: scanned {} ({}), +{} coins",
                            outcome.label, outcome.category, outcome.reward_points
                        );
                    }
                    // A failed classification never stops an armed loop; the
                    // next tick retries implicitly.
                    Err(ScanError::NoFrameAvailable) => {
                        info!("session {session_id}: no frame available yet, skipping tick");
                    }
                    Err(err) => {
                        warn!("session {session_id}: scan failed: {err}");
                    }
                }

                if cancel_token.is_cancelled() {
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                info!("session {session_id}: scan loop shutting down");
                break;
            }
        }
    }

    core.state.lock().await.disarm();
}
