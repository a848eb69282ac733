use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::{BinField, ClassificationResult};

/// Coins awarded per scan, keyed on the classifier's recyclable flag.
const COINS_RECYCLABLE: u32 = 5;
const COINS_NON_RECYCLABLE: u32 = 2;

/// Ordered substring table for the outcome emoji. First match against the
/// lowercased label wins.
const ICON_TABLE: &[(&str, &str)] = &[
    ("plastic", "🧴"),
    ("metal", "🥤"),
    ("glass", "🍾"),
    ("paper", "📄"),
    ("battery", "🔋"),
    ("food", "🍎"),
];
const ICON_DEFAULT: &str = "♻️";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Target bin descriptor. The wire sometimes carries only a bin name; the
/// string form is normalized here with neutral color and icon key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisposalBin {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl From<BinField> for DisposalBin {
    fn from(field: BinField) -> Self {
        match field {
            BinField::Structured(bin) => bin,
            BinField::Name(name) => DisposalBin {
                name,
                color: "gray".to_string(),
                icon: "recycle".to_string(),
            },
        }
    }
}

/// The reconciled, domain-level result of classifying one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    /// Capture timestamp in Unix milliseconds; history key.
    pub id: i64,
    pub label: String,
    pub category: String,
    pub bin: DisposalBin,
    pub guidance: String,
    pub reward_points: u32,
    pub severity: Severity,
    pub icon: String,
    pub confidence: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

/// Pure mapping from a classification result to a domain outcome. Two calls
/// with the same input differ only in `id` and `captured_at`.
pub fn reconcile(result: ClassificationResult, captured_at: DateTime<Utc>) -> ScanOutcome {
    let severity = result.severity.unwrap_or(if result.recyclable {
        Severity::Low
    } else {
        Severity::High
    });

    ScanOutcome {
        id: captured_at.timestamp_millis(),
        icon: icon_for(&result.waste_type).to_string(),
        label: result.waste_type,
        category: result.category,
        bin: result.bin.into(),
        guidance: result.tip,
        reward_points: coins_for(result.recyclable),
        severity,
        confidence: result.confidence,
        captured_at,
    }
}

pub fn coins_for(recyclable: bool) -> u32 {
    if recyclable {
        COINS_RECYCLABLE
    } else {
        COINS_NON_RECYCLABLE
    }
}

pub fn icon_for(waste_type: &str) -> &'static str {
    let label = waste_type.to_lowercase();
    ICON_TABLE
        .iter()
        .find(|(needle, _)| label.contains(needle))
        .map(|(_, icon)| *icon)
        .unwrap_or(ICON_DEFAULT)
}
