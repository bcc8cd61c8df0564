use serde_json::json;
use std::cmp::Ordering;
use thiserror::Error;

pub const AXIS_MIN: f64 = 0.0;
pub const AXIS_MAX: f64 = 100.0;

/// Bands are inclusive on both ends: a shared score belongs to two bands,
/// and neighbours more than one score point apart leave scores uncovered.
const ADJACENCY_LIMIT: f64 = 1.0;

/// One keyed band of the 0..100 score axis.
#[derive(Debug, Clone)]
pub struct PartitionEntry {
    pub key: String,
    pub low: f64,
    pub high: f64,
}

impl PartitionEntry {
    pub fn new(key: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            key: key.into(),
            low,
            high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    #[error("at least one band is required")]
    EmptyPartition,
    #[error("{key}: range {low} to {high} must sit inside 0 to 100 with low <= high")]
    OutOfRange { key: String, low: f64, high: f64 },
    #[error("{first} and {second} overlap")]
    OverlapDetected { first: String, second: String },
    #[error("scores between {from} and {to} are not covered")]
    IncompleteCoverage {
        /// Band the uncovered span follows; `None` when coverage is missing
        /// at the bottom of the axis.
        after: Option<String>,
        from: f64,
        to: f64,
    },
}

impl PartitionError {
    pub fn code(&self) -> &'static str {
        match self {
            PartitionError::EmptyPartition => "empty_partition",
            PartitionError::OutOfRange { .. } => "out_of_range",
            PartitionError::OverlapDetected { .. } => "overlap_detected",
            PartitionError::IncompleteCoverage { .. } => "incomplete_coverage",
        }
    }

    pub fn to_detail(&self) -> serde_json::Value {
        let mut detail = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        match self {
            PartitionError::EmptyPartition => {}
            PartitionError::OutOfRange { key, low, high } => {
                detail["key"] = json!(key);
                detail["low"] = json!(low);
                detail["high"] = json!(high);
            }
            PartitionError::OverlapDetected { first, second } => {
                detail["first"] = json!(first);
                detail["second"] = json!(second);
            }
            PartitionError::IncompleteCoverage { after, from, to } => {
                detail["after"] = json!(after);
                detail["from"] = json!(from);
                detail["to"] = json!(to);
            }
        }
        detail
    }
}

/// Checks that `entries` form a full partition of the 0..100 score axis:
/// every bound inside the axis, no two bands claiming the same score, no
/// break wider than one score point, bottom band starting at 0 and top band
/// ending at exactly 100.
///
/// Per-band bound errors are collected across all entries; the coverage walk
/// itself is a single comparison pass over the bands sorted by `low`.
pub fn validate_partition(entries: &[PartitionEntry]) -> Result<(), Vec<PartitionError>> {
    if entries.is_empty() {
        return Err(vec![PartitionError::EmptyPartition]);
    }

    let mut errors: Vec<PartitionError> = Vec::new();
    for e in entries {
        let bounds_finite = e.low.is_finite() && e.high.is_finite();
        if !bounds_finite
            || e.low > e.high
            || e.low < AXIS_MIN
            || e.high > AXIS_MAX
        {
            errors.push(PartitionError::OutOfRange {
                key: e.key.clone(),
                low: e.low,
                high: e.high,
            });
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut sorted: Vec<&PartitionEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.low.partial_cmp(&b.low).unwrap_or(Ordering::Equal));

    let first = sorted[0];
    if first.low != AXIS_MIN {
        errors.push(PartitionError::IncompleteCoverage {
            after: None,
            from: AXIS_MIN,
            to: first.low,
        });
    }

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.low <= prev.high {
            errors.push(PartitionError::OverlapDetected {
                first: prev.key.clone(),
                second: next.key.clone(),
            });
        } else if next.low > prev.high + ADJACENCY_LIMIT {
            errors.push(PartitionError::IncompleteCoverage {
                after: Some(prev.key.clone()),
                from: prev.high,
                to: next.low,
            });
        }
    }

    let last = sorted[sorted.len() - 1];
    if last.high != AXIS_MAX {
        errors.push(PartitionError::IncompleteCoverage {
            after: Some(last.key.clone()),
            from: last.high,
            to: AXIS_MAX,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
