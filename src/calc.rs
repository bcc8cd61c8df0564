use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::fields::FieldValue;
use crate::scale::{self, GradeBand, UNGRADED};
use crate::structure::AssessmentComponent;

/// Every subject's structure is validated to total exactly 100, so a
/// subject's achievable ceiling is 100 marks regardless of its component
/// split.
pub const SUBJECT_MAX_MARKS: f64 = 100.0;

/// 2-decimal rounding used on report sheets: half away from zero.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// One raw score as entered against a component. `value` may still be the
/// form field's text.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScoreEntry {
    pub component_type: String,
    pub value: FieldValue,
}

/// The value actually used for one component, post-default.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAggregate {
    pub total: f64,
    pub per_component: Vec<ComponentScore>,
}

/// A subject result labelled against a grading scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub total: f64,
    pub per_component: Vec<ComponentScore>,
    pub grade: String,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    pub sum: f64,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub count: usize,
    pub grade: String,
    pub remark: Option<String>,
}

/// One student's summary across subjects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    #[serde(flatten)]
    pub summary: SummaryStatistics,
    pub max_possible_marks: f64,
}

/// Sums a student's raw scores across the structure's components, iterated
/// in `order`. Missing and unreadable entries default to 0. Raw values are
/// taken as already expressed in points out of each component's percentage
/// share, so nothing is scaled or clamped here; a total above 100 passes
/// through as entered.
pub fn aggregate(structure: &[AssessmentComponent], raw_scores: &[RawScoreEntry]) -> ScoreAggregate {
    let mut by_kind: HashMap<&str, f64> = HashMap::new();
    for entry in raw_scores {
        // At most one entry per component is the contract; last one wins if
        // the caller sends more.
        by_kind.insert(
            entry.component_type.as_str(),
            entry.value.as_decimal().unwrap_or(0.0),
        );
    }

    let mut ordered: Vec<&AssessmentComponent> = structure.iter().collect();
    ordered.sort_by_key(|c| c.order);

    let mut total = 0.0;
    let mut per_component: Vec<ComponentScore> = Vec::with_capacity(ordered.len());
    for component in ordered {
        let value = by_kind.get(component.kind.as_str()).copied().unwrap_or(0.0);
        total += value;
        per_component.push(ComponentScore {
            kind: component.kind.clone(),
            value,
        });
    }

    ScoreAggregate {
        total,
        per_component,
    }
}

/// [`aggregate`] plus grade and remark resolved from the total. With no
/// scale configured the labels degrade to their sentinels.
pub fn label_aggregate(
    structure: &[AssessmentComponent],
    raw_scores: &[RawScoreEntry],
    grading_scale: &[GradeBand],
) -> AggregatedResult {
    let ScoreAggregate {
        total,
        per_component,
    } = aggregate(structure, raw_scores);
    let grade = scale::resolve_grade(grading_scale, total);
    let remark = scale::resolve_remark(grading_scale, &grade);
    AggregatedResult {
        total,
        per_component,
        grade,
        remark,
    }
}

/// Summary statistics over a collection of totals. An empty collection is a
/// normal, displayable state: the all-zero summary with the ungraded
/// sentinel. The overall grade and remark come from feeding the rounded
/// average back through the resolver.
pub fn summarize(totals: &[f64], grading_scale: &[GradeBand]) -> SummaryStatistics {
    let Some(&first) = totals.first() else {
        return SummaryStatistics {
            sum: 0.0,
            average: 0.0,
            minimum: 0.0,
            maximum: 0.0,
            count: 0,
            grade: UNGRADED.to_string(),
            remark: None,
        };
    };

    let mut sum = 0.0;
    let mut minimum = first;
    let mut maximum = first;
    for &t in totals {
        sum += t;
        if t < minimum {
            minimum = t;
        }
        if t > maximum {
            maximum = t;
        }
    }

    let average = round_off_2_decimals(sum / totals.len() as f64);
    let grade = scale::resolve_grade(grading_scale, average);
    let remark = scale::resolve_remark(grading_scale, &grade);

    SummaryStatistics {
        sum,
        average,
        minimum,
        maximum,
        count: totals.len(),
        grade,
        remark,
    }
}

/// One student's per-subject totals rolled up for the report sheet.
pub fn summarize_student(subject_totals: &[f64], grading_scale: &[GradeBand]) -> StudentSummary {
    StudentSummary {
        summary: summarize(subject_totals, grading_scale),
        max_possible_marks: subject_totals.len() as f64 * SUBJECT_MAX_MARKS,
    }
}
