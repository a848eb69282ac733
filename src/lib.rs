pub mod cli;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod scanner;

pub use collaborators::{CoinLedger, LogNotifier, NoteKind, Notifier, RewardSink};
pub use config::ScanConfig;
pub use error::ScanError;
pub use scanner::classifier::{BinField, ClassificationResult, Classifier, HttpClassifier};
pub use scanner::frame::{DirFrameSource, FileFrameSource, Frame, FrameSource};
pub use scanner::history::ScanHistory;
pub use scanner::reconcile::{reconcile, DisposalBin, ScanOutcome, Severity};
pub use scanner::state::{PipelineSnapshot, PipelineStatus, ScanStats};
pub use scanner::ScanController;
