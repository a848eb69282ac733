use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use greenscan::{
    BinField, ClassificationResult, Classifier, CoinLedger, DisposalBin, Frame, FrameSource,
    NoteKind, Notifier, PipelineStatus, ScanConfig, ScanController, ScanError,
};

struct StaticSource;

#[async_trait]
impl FrameSource for StaticSource {
    async fn sample_frame(&self) -> Result<Frame, ScanError> {
        Ok(Frame::new(vec![0u8; 64]))
    }
}

struct EmptySource;

#[async_trait]
impl FrameSource for EmptySource {
    async fn sample_frame(&self) -> Result<Frame, ScanError> {
        Err(ScanError::NoFrameAvailable)
    }
}

/// Classifier double: configurable delay and failure, tracks call counts and
/// the high-water mark of concurrent calls.
struct MockClassifier {
    delay: Duration,
    fail_with_status: Option<u16>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockClassifier {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail_with_status: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn failing(delay: Duration, status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::new(delay)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _frame: &Frame) -> Result<ClassificationResult, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.fail_with_status {
            Some(status) => Err(ScanError::Service { status }),
            None => Ok(ClassificationResult {
                waste_type: "plastic bottle".to_string(),
                category: "Recyclable".to_string(),
                bin: BinField::Structured(DisposalBin {
                    name: "Blue Bin".to_string(),
                    color: "blue".to_string(),
                    icon: "recycle".to_string(),
                }),
                tip: "Rinse before recycling".to_string(),
                recyclable: true,
                confidence: Some(0.95),
                severity: None,
            }),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(String, NoteKind)>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<(String, NoteKind)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NoteKind) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), kind));
    }
}

fn mk_config(interval_ms: u64, timeout_ms: u64) -> ScanConfig {
    ScanConfig {
        capture_interval_ms: interval_ms,
        classify_timeout_ms: timeout_ms,
        ..ScanConfig::default()
    }
}

fn mk_controller(
    classifier: Arc<MockClassifier>,
    config: ScanConfig,
) -> (ScanController, Arc<CoinLedger>, Arc<RecordingNotifier>) {
    let ledger = Arc::new(CoinLedger::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = ScanController::new(classifier, ledger.clone(), notifier.clone(), config);
    (controller, ledger, notifier)
}

#[tokio::test(start_paused = true)]
async fn live_mode_bounds_history_and_sums_rewards() {
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(10)));
    let (controller, ledger, notifier) = mk_controller(classifier, mk_config(100, 5_000));

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_050)).await;
    controller.stop_live().await.unwrap();

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert!(snapshot.stats.success_count >= 10);
    // History is bounded at capacity even though more scans succeeded.
    assert_eq!(snapshot.history.len(), 10);
    // Total accrual equals the sum of per-outcome rewards, exactly once each.
    assert_eq!(ledger.balance(), snapshot.stats.success_count * 5);
    assert_eq!(ledger.balance(), snapshot.stats.points_awarded);

    let messages = notifier.messages();
    assert_eq!(messages.len() as u64, snapshot.stats.success_count);
    for (message, kind) in messages {
        assert_eq!(message, "Earned 5 Green Coins!");
        assert_eq!(kind, NoteKind::Success);
    }

    // Newest first.
    let ids: Vec<i64> = snapshot.history.iter().map(|entry| entry.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
}

#[tokio::test(start_paused = true)]
async fn at_most_one_classification_in_flight() {
    // Round trip (450ms) spans several timer periods (100ms); ticks landing
    // mid-flight must be dropped, never stacked.
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(450)));
    let (controller, _ledger, _notifier) = mk_controller(classifier.clone(), mk_config(100, 5_000));

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    controller.stop_live().await.unwrap();

    assert_eq!(classifier.max_in_flight.load(Ordering::SeqCst), 1);
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.stats.capture_count as usize, classifier.calls());
}

#[tokio::test(start_paused = true)]
async fn failed_classification_keeps_loop_armed_and_mutates_nothing() {
    let classifier = Arc::new(MockClassifier::failing(Duration::from_millis(10), 500));
    let (controller, ledger, notifier) = mk_controller(classifier.clone(), mk_config(100, 5_000));

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(550)).await;

    // Still armed despite every call failing.
    let mid_run = controller.snapshot().await;
    assert_ne!(mid_run.status, PipelineStatus::Idle);

    controller.stop_live().await.unwrap();

    let snapshot = controller.snapshot().await;
    assert!(snapshot.stats.failure_count >= 3);
    assert!(classifier.calls() >= 3, "loop should retry on later ticks");
    assert!(snapshot.history.is_empty());
    assert!(snapshot.current.is_none());
    assert_eq!(ledger.balance(), 0);
    assert!(notifier.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn teardown_while_awaiting_reconciles_once_and_does_not_rearm() {
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(500)));
    let (controller, ledger, _notifier) = mk_controller(classifier.clone(), mk_config(100, 5_000));

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    // First tick fires immediately; its call is still in flight here.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(classifier.calls(), 1);

    controller.stop_live().await.unwrap();

    // The in-flight call completed and reconciled exactly once; the loop did
    // not arm another capture afterwards.
    assert_eq!(classifier.calls(), 1);
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(ledger.balance(), 5);

    // And nothing fires later.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_live_mode_can_restart() {
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(10)));
    let (controller, _ledger, _notifier) = mk_controller(classifier.clone(), mk_config(100, 5_000));

    controller.stop_live().await.unwrap();

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    assert!(controller.start_live(Arc::new(StaticSource)).await.is_err());
    tokio::time::sleep(Duration::from_millis(250)).await;
    controller.stop_live().await.unwrap();
    controller.stop_live().await.unwrap();

    let after_first = classifier.calls();
    assert!(after_first >= 1);

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    controller.stop_live().await.unwrap();
    assert!(classifier.calls() > after_first);
}

#[tokio::test(start_paused = true)]
async fn one_shot_with_no_frame_issues_no_network_call() {
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(10)));
    let (controller, ledger, notifier) = mk_controller(classifier.clone(), mk_config(1_500, 1_200));

    let err = controller.scan_once(&EmptySource).await.unwrap_err();
    assert!(matches!(err, ScanError::NoFrameAvailable));
    assert_eq!(classifier.calls(), 0);

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert_eq!(snapshot.stats.failure_count, 1);
    assert_eq!(ledger.balance(), 0);
    assert!(notifier.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn one_shot_success_applies_all_effects() {
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(10)));
    let (controller, ledger, notifier) = mk_controller(classifier, mk_config(1_500, 1_200));

    let outcome = controller.scan_once(&StaticSource).await.unwrap();
    assert_eq!(outcome.icon, "🧴");
    assert_eq!(outcome.reward_points, 5);
    assert_eq!(outcome.bin.name, "Blue Bin");

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.current.as_ref().map(|item| item.id), Some(outcome.id));
    assert_eq!(ledger.balance(), 5);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn one_shot_rejected_while_live_mode_is_armed() {
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(10)));
    let (controller, _ledger, _notifier) = mk_controller(classifier, mk_config(100, 5_000));

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    let err = controller.scan_once(&StaticSource).await.unwrap_err();
    assert!(matches!(err, ScanError::Busy(_)));
    controller.stop_live().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stalled_call_times_out_as_transport() {
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(500)));
    let (controller, ledger, _notifier) = mk_controller(classifier, mk_config(1_500, 50));

    let err = controller.scan_once(&StaticSource).await.unwrap_err();
    assert!(matches!(err, ScanError::Transport(_)));

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert!(snapshot.history.is_empty());
    assert_eq!(ledger.balance(), 0);
}

#[tokio::test(start_paused = true)]
async fn live_loop_recovers_after_timeouts() {
    // Every call stalls past the classify timeout; the loop keeps ticking.
    let classifier = Arc::new(MockClassifier::new(Duration::from_millis(400)));
    let (controller, ledger, _notifier) = mk_controller(classifier.clone(), mk_config(100, 50));

    controller.start_live(Arc::new(StaticSource)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(650)).await;
    controller.stop_live().await.unwrap();

    assert!(classifier.calls() >= 2, "loop should keep retrying");
    let snapshot = controller.snapshot().await;
    assert!(snapshot.stats.failure_count >= 2);
    assert!(snapshot.history.is_empty());
    assert_eq!(ledger.balance(), 0);
}
