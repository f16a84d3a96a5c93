//! Color buckets for progress cells
//!
//! Real and planned cells share one classification so the matrix legend can
//! be read the same way for both.

use serde::{Deserialize, Serialize};

/// Progress classification of a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellBucket {
    /// Nothing reported yet
    NoData,
    /// Reported at 0%
    None,
    /// 1-49%
    Low,
    /// Exactly 50%
    Mid,
    /// 51-99%
    High,
    /// 100%
    Complete,
}

impl CellBucket {
    /// Every bucket, in legend order
    pub const ALL: [CellBucket; 6] = [
        CellBucket::NoData,
        CellBucket::None,
        CellBucket::Low,
        CellBucket::Mid,
        CellBucket::High,
        CellBucket::Complete,
    ];

    /// Classify a percentage. Values above 100 are treated like missing data.
    pub fn for_value(value: Option<u8>) -> Self {
        match value {
            None => CellBucket::NoData,
            Some(0) => CellBucket::None,
            Some(1..=49) => CellBucket::Low,
            Some(50) => CellBucket::Mid,
            Some(51..=99) => CellBucket::High,
            Some(100) => CellBucket::Complete,
            Some(_) => CellBucket::NoData,
        }
    }

    /// Bucket name used in JSON output and CSS classes
    pub fn as_str(&self) -> &'static str {
        match self {
            CellBucket::NoData => "no data",
            CellBucket::None => "none",
            CellBucket::Low => "low",
            CellBucket::Mid => "mid",
            CellBucket::High => "high",
            CellBucket::Complete => "complete",
        }
    }

    /// Cell background color
    pub fn fill(&self) -> &'static str {
        match self {
            CellBucket::NoData => "#e5e7eb",
            CellBucket::None => "#ef4444",
            CellBucket::Low => "#fb923c",
            CellBucket::Mid => "#facc15",
            CellBucket::High => "#a3e635",
            CellBucket::Complete => "#16a34a",
        }
    }

    /// Text color that stays readable on `fill`
    pub fn text(&self) -> &'static str {
        match self {
            CellBucket::None | CellBucket::Low | CellBucket::Complete => "#ffffff",
            CellBucket::NoData | CellBucket::Mid | CellBucket::High => "#1f2937",
        }
    }

    /// Legend label
    pub fn label(&self) -> &'static str {
        match self {
            CellBucket::NoData => "No data",
            CellBucket::None => "0%",
            CellBucket::Low => "1-49%",
            CellBucket::Mid => "50%",
            CellBucket::High => "51-99%",
            CellBucket::Complete => "100%",
        }
    }
}

impl std::fmt::Display for CellBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
