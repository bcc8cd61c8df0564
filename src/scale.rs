use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cmp::Ordering;
use thiserror::Error;

use crate::fields::FieldValue;
use crate::partition::{self, PartitionEntry, PartitionError, AXIS_MAX, AXIS_MIN};

/// Sentinel grade for a percentage no band claims. A report sheet must
/// always render something, so this is a value, not an error.
pub const UNGRADED: &str = "N/A";

/// A grade band as the editing UI submits it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandInput {
    pub grade: String,
    pub min_score: FieldValue,
    pub max_score: FieldValue,
    #[serde(default)]
    pub remark: Option<String>,
}

/// A validated grade band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub grade: String,
    pub min_score: f64,
    pub max_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaleError {
    #[error("band {position}: grade must not be blank")]
    BlankGrade { position: usize },
    #[error("{grade}: scores must be numbers between 0 and 100 with min <= max (got \"{min_raw}\" to \"{max_raw}\")")]
    InvalidRange {
        grade: String,
        min_raw: String,
        max_raw: String,
    },
    #[error(transparent)]
    Partition(#[from] PartitionError),
}

impl ScaleError {
    pub fn code(&self) -> &'static str {
        match self {
            ScaleError::BlankGrade { .. } => "blank_grade",
            ScaleError::InvalidRange { .. } => "invalid_range",
            ScaleError::Partition(e) => e.code(),
        }
    }

    pub fn to_detail(&self) -> serde_json::Value {
        match self {
            ScaleError::BlankGrade { position } => json!({
                "code": self.code(),
                "message": self.to_string(),
                "position": position,
            }),
            ScaleError::InvalidRange {
                grade,
                min_raw,
                max_raw,
            } => json!({
                "code": self.code(),
                "message": self.to_string(),
                "grade": grade,
                "minScore": min_raw,
                "maxScore": max_raw,
            }),
            ScaleError::Partition(e) => e.to_detail(),
        }
    }
}

fn display_grade(grade: &str, position: usize) -> String {
    if grade.is_empty() {
        format!("band {}", position)
    } else {
        grade.to_string()
    }
}

/// Validates a grading scale: per-band field checks first (all errors
/// collected), then the partition walk over the `[minScore, maxScore]`
/// intervals. Success returns the bands sorted by `minScore` descending,
/// which is the resolver's scan order.
pub fn validate_grading_scale(inputs: &[BandInput]) -> Result<Vec<GradeBand>, Vec<ScaleError>> {
    if inputs.is_empty() {
        return Err(vec![ScaleError::Partition(PartitionError::EmptyPartition)]);
    }

    let mut errors: Vec<ScaleError> = Vec::new();
    let mut bands: Vec<GradeBand> = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.iter().enumerate() {
        let position = i + 1;
        let grade = input.grade.trim().to_string();
        if grade.is_empty() {
            errors.push(ScaleError::BlankGrade { position });
        }

        match (input.min_score.as_decimal(), input.max_score.as_decimal()) {
            (Some(lo), Some(hi))
                if lo <= hi
                    && (AXIS_MIN..=AXIS_MAX).contains(&lo)
                    && (AXIS_MIN..=AXIS_MAX).contains(&hi) =>
            {
                bands.push(GradeBand {
                    grade: display_grade(&grade, position),
                    min_score: lo,
                    max_score: hi,
                    remark: input.remark.clone(),
                });
            }
            _ => errors.push(ScaleError::InvalidRange {
                grade: display_grade(&grade, position),
                min_raw: input.min_score.raw(),
                max_raw: input.max_score.raw(),
            }),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let entries: Vec<PartitionEntry> = bands
        .iter()
        .map(|b| PartitionEntry::new(b.grade.clone(), b.min_score, b.max_score))
        .collect();
    if let Err(partition_errors) = partition::validate_partition(&entries) {
        return Err(partition_errors
            .into_iter()
            .map(ScaleError::Partition)
            .collect());
    }

    bands.sort_by(|a, b| {
        b.min_score
            .partial_cmp(&a.min_score)
            .unwrap_or(Ordering::Equal)
    });
    Ok(bands)
}

/// Wire decode for resolver and report calls. Grading must always produce a
/// displayable value, so bands that fail to decode are dropped rather than
/// reported.
pub fn decode_bands(inputs: &[BandInput]) -> Vec<GradeBand> {
    inputs
        .iter()
        .filter_map(|b| {
            let min_score = b.min_score.as_decimal()?;
            let max_score = b.max_score.as_decimal()?;
            let grade = b.grade.trim();
            if grade.is_empty() {
                return None;
            }
            Some(GradeBand {
                grade: grade.to_string(),
                min_score,
                max_score,
                remark: b.remark.clone(),
            })
        })
        .collect()
}

/// Resolves a percentage to its grade. Bands are scanned highest first and
/// the lower bound alone decides membership, so a fractional score between
/// two inclusive integer bands lands in the band below. No band claiming
/// the score (negative input, empty or absent scale) resolves to
/// [`UNGRADED`].
pub fn resolve_grade(scale: &[GradeBand], percentage: f64) -> String {
    let mut bands: Vec<&GradeBand> = scale.iter().collect();
    bands.sort_by(|a, b| {
        b.min_score
            .partial_cmp(&a.min_score)
            .unwrap_or(Ordering::Equal)
    });
    bands
        .into_iter()
        .find(|b| percentage >= b.min_score)
        .map(|b| b.grade.clone())
        .unwrap_or_else(|| UNGRADED.to_string())
}

/// Looks up the remark for an exact grade string. Unknown grades and bands
/// without a remark both come back as `None`, never an error.
pub fn resolve_remark(scale: &[GradeBand], grade: &str) -> Option<String> {
    scale
        .iter()
        .find(|b| b.grade == grade)
        .and_then(|b| b.remark.clone())
}
