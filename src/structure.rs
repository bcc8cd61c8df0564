use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use thiserror::Error;

use crate::fields::FieldValue;
use crate::partition::{AXIS_MAX, AXIS_MIN};

/// A component as the editing UI submits it. `percentage` may still be the
/// raw text of the form field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub percentage: FieldValue,
    pub order: i64,
}

/// A validated component. The structure owns storage of these; the engine
/// only ever sees them per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub percentage: f64,
    pub order: i64,
}

/// Partial edit of one component, merged onto the committed values before
/// the proposed set is re-validated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPatch {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub percentage: Option<FieldValue>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructureError {
    #[error("component {position}: type must not be blank")]
    BlankComponentType { position: usize },
    #[error("{kind} is listed more than once")]
    DuplicateComponent { kind: String },
    #[error("{kind}: percentage must be a number between 0 and 100 (got \"{raw}\")")]
    InvalidPercentage { kind: String, raw: String },
    #[error("{kind}: order must be a positive integer (got {order})")]
    InvalidOrder { kind: String, order: i64 },
    #[error("order {order} is used more than once")]
    DuplicateOrder { order: i64 },
    #[error("component percentages must total exactly 100 (currently {total})")]
    PercentageTotalMismatch { total: f64 },
}

impl StructureError {
    pub fn code(&self) -> &'static str {
        match self {
            StructureError::BlankComponentType { .. } => "blank_component_type",
            StructureError::DuplicateComponent { .. } => "duplicate_component",
            StructureError::InvalidPercentage { .. } => "invalid_percentage",
            StructureError::InvalidOrder { .. } => "invalid_order",
            StructureError::DuplicateOrder { .. } => "duplicate_order",
            StructureError::PercentageTotalMismatch { .. } => "percentage_total_mismatch",
        }
    }

    pub fn to_detail(&self) -> serde_json::Value {
        let mut detail = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        match self {
            StructureError::BlankComponentType { position } => {
                detail["position"] = json!(position);
            }
            StructureError::DuplicateComponent { kind } => {
                detail["type"] = json!(kind);
            }
            StructureError::InvalidPercentage { kind, raw } => {
                detail["type"] = json!(kind);
                detail["raw"] = json!(raw);
            }
            StructureError::InvalidOrder { kind, order } => {
                detail["type"] = json!(kind);
                detail["order"] = json!(order);
            }
            StructureError::DuplicateOrder { order } => {
                detail["order"] = json!(order);
            }
            StructureError::PercentageTotalMismatch { total } => {
                detail["total"] = json!(total);
            }
        }
        detail
    }
}

/// The completeness rule for a committed structure. Exact equality on the
/// insertion-order sum; any tolerance policy change lands here and nowhere
/// else.
pub fn totals_exactly_one_hundred(total: f64) -> bool {
    total == 100.0
}

fn display_kind(kind: &str, position: usize) -> String {
    if kind.is_empty() {
        format!("component {}", position)
    } else {
        kind.to_string()
    }
}

fn percentage_in_range(v: f64) -> bool {
    (AXIS_MIN..=AXIS_MAX).contains(&v)
}

/// Field and uniqueness checks over a submitted list. Returns the components
/// that survived parsing (input order) plus every error found.
fn collect_components(
    inputs: &[ComponentInput],
) -> (Vec<AssessmentComponent>, Vec<StructureError>) {
    let mut errors: Vec<StructureError> = Vec::new();
    let mut parsed: Vec<AssessmentComponent> = Vec::with_capacity(inputs.len());
    let mut seen_kinds: HashSet<String> = HashSet::new();
    let mut seen_orders: HashSet<i64> = HashSet::new();

    for (i, input) in inputs.iter().enumerate() {
        let position = i + 1;
        let kind = input.kind.trim().to_string();
        if kind.is_empty() {
            errors.push(StructureError::BlankComponentType { position });
        } else if !seen_kinds.insert(kind.clone()) {
            errors.push(StructureError::DuplicateComponent { kind: kind.clone() });
        }

        let percentage = match input.percentage.as_decimal() {
            Some(v) if percentage_in_range(v) => Some(v),
            _ => {
                errors.push(StructureError::InvalidPercentage {
                    kind: display_kind(&kind, position),
                    raw: input.percentage.raw(),
                });
                None
            }
        };

        if input.order < 1 {
            errors.push(StructureError::InvalidOrder {
                kind: display_kind(&kind, position),
                order: input.order,
            });
        } else if !seen_orders.insert(input.order) {
            errors.push(StructureError::DuplicateOrder { order: input.order });
        }

        if let Some(percentage) = percentage {
            parsed.push(AssessmentComponent {
                id: input.id.clone(),
                kind,
                percentage,
                order: input.order,
            });
        }
    }

    (parsed, errors)
}

/// Full validation of a committed structure: every field sound, types and
/// orders unique, percentages totalling exactly 100. All errors are
/// collected; nothing is reported fail-fast. Success returns the components
/// sorted by `order`.
pub fn validate_structure(
    inputs: &[ComponentInput],
) -> Result<Vec<AssessmentComponent>, Vec<StructureError>> {
    let (parsed, mut errors) = collect_components(inputs);

    // The total is only meaningful when every percentage parsed; a bad field
    // is that field's error, not a bogus sum.
    if parsed.len() == inputs.len() {
        let total: f64 = parsed.iter().map(|c| c.percentage).sum();
        if !totals_exactly_one_hundred(total) {
            errors.push(StructureError::PercentageTotalMismatch { total });
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut components = parsed;
    components.sort_by_key(|c| c.order);
    Ok(components)
}

/// Decodes a stored component list without imposing the completed-structure
/// total rule. Used for the committed set while it is still being assembled
/// in the editor (its total may legitimately be under 100).
pub fn decode_components(
    inputs: &[ComponentInput],
) -> Result<Vec<AssessmentComponent>, Vec<StructureError>> {
    let (parsed, errors) = collect_components(inputs);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(parsed)
}

/// Checks one draft component against all `others` already in the structure.
/// The proposed total may sit under 100 while editing but never over.
fn check_draft(
    others: &[AssessmentComponent],
    id: Option<String>,
    kind: &str,
    percentage: &FieldValue,
    order: i64,
    position: usize,
) -> Result<AssessmentComponent, Vec<StructureError>> {
    let mut errors: Vec<StructureError> = Vec::new();

    let kind = kind.trim().to_string();
    if kind.is_empty() {
        errors.push(StructureError::BlankComponentType { position });
    } else if others.iter().any(|c| c.kind == kind) {
        errors.push(StructureError::DuplicateComponent { kind: kind.clone() });
    }

    let parsed = match percentage.as_decimal() {
        Some(v) if percentage_in_range(v) => Some(v),
        _ => {
            errors.push(StructureError::InvalidPercentage {
                kind: display_kind(&kind, position),
                raw: percentage.raw(),
            });
            None
        }
    };

    if order < 1 {
        errors.push(StructureError::InvalidOrder {
            kind: display_kind(&kind, position),
            order,
        });
    } else if others.iter().any(|c| c.order == order) {
        errors.push(StructureError::DuplicateOrder { order });
    }

    if let Some(p) = parsed {
        let proposed: f64 = others.iter().map(|c| c.percentage).sum::<f64>() + p;
        if proposed > 100.0 {
            errors.push(StructureError::PercentageTotalMismatch { total: proposed });
        }
    }

    match parsed {
        Some(percentage) if errors.is_empty() => Ok(AssessmentComponent {
            id,
            kind,
            percentage,
            order,
        }),
        _ => Err(errors),
    }
}

/// Proposes `draft` as a new component of `committed`. The whole proposed
/// set is checked before anything is accepted; success returns it sorted by
/// `order`.
pub fn add_component(
    committed: &[AssessmentComponent],
    draft: &ComponentInput,
) -> Result<Vec<AssessmentComponent>, Vec<StructureError>> {
    let accepted = check_draft(
        committed,
        draft.id.clone(),
        &draft.kind,
        &draft.percentage,
        draft.order,
        committed.len() + 1,
    )?;

    let mut components = committed.to_vec();
    components.push(accepted);
    components.sort_by_key(|c| c.order);
    Ok(components)
}

/// Applies `patch` to the component at `index` and re-validates the proposed
/// set. The edited component is excluded from the duplicate and total
/// computations so a no-op patch always passes.
pub fn update_component(
    committed: &[AssessmentComponent],
    index: usize,
    patch: &ComponentPatch,
) -> Result<Vec<AssessmentComponent>, Vec<StructureError>> {
    let current = &committed[index];
    let others: Vec<AssessmentComponent> = committed
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, c)| c.clone())
        .collect();

    let kind = patch.kind.clone().unwrap_or_else(|| current.kind.clone());
    let percentage = patch
        .percentage
        .clone()
        .unwrap_or(FieldValue::Number(current.percentage));
    let order = patch.order.unwrap_or(current.order);

    let accepted = check_draft(
        &others,
        current.id.clone(),
        &kind,
        &percentage,
        order,
        index + 1,
    )?;

    let mut components = others;
    components.push(accepted);
    components.sort_by_key(|c| c.order);
    Ok(components)
}

/// Removes the component at `index`. Removal cannot invalidate the rest of
/// the draft, so it never fails; the remaining set comes back sorted.
pub fn remove_component(
    committed: &[AssessmentComponent],
    index: usize,
) -> Vec<AssessmentComponent> {
    let mut components: Vec<AssessmentComponent> = committed
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, c)| c.clone())
        .collect();
    components.sort_by_key(|c| c.order);
    components
}
