use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reward-ledger capability. The pipeline only ever increments; from its
/// point of view the call always succeeds.
pub trait RewardSink: Send + Sync {
    fn increment(&self, points: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Success,
    Info,
    Warning,
}

/// User-facing notification channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NoteKind);
}

/// In-memory Green Coin balance, good for the demo binary and tests. The real
/// ledger lives elsewhere; this only mirrors the increment capability.
#[derive(Debug, Default)]
pub struct CoinLedger {
    balance: AtomicU64,
}

impl CoinLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> u64 {
        self.balance.load(Ordering::Relaxed)
    }
}

impl RewardSink for CoinLedger {
    fn increment(&self, points: u32) {
        self.balance.fetch_add(u64::from(points), Ordering::Relaxed);
    }
}

/// Notifier that writes to the log, for headless use.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, kind: NoteKind) {
        info!("[{kind:?}] {message}");
    }
}
