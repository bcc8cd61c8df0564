use crate::calc::{self, RawScoreEntry};
use crate::ipc::error::{err, ok};
use crate::ipc::types::Request;
use crate::structure::{AssessmentComponent, ComponentInput};
use serde_json::json;

use super::grading_scale::optional_bands_param;

/// Result calls must always produce something displayable, so the committed
/// structure is decoded leniently here: unreadable percentages become 0
/// (aggregation only needs type and order) instead of failing the request.
fn lenient_components(inputs: Vec<ComponentInput>) -> Vec<AssessmentComponent> {
    inputs
        .into_iter()
        .map(|c| AssessmentComponent {
            id: c.id,
            kind: c.kind.trim().to_string(),
            percentage: c.percentage.as_decimal().unwrap_or(0.0),
            order: c.order,
        })
        .collect()
}

fn handle_aggregate(req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("components") else {
        return err(&req.id, "bad_params", "missing components", None);
    };
    let inputs: Vec<ComponentInput> = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("invalid components: {}", e),
                None,
            )
        }
    };
    let structure = lenient_components(inputs);

    let scores: Vec<RawScoreEntry> = match req.params.get("scores") {
        None => Vec::new(),
        Some(raw) if raw.is_null() => Vec::new(),
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid scores: {}", e),
                    None,
                )
            }
        },
    };

    let bands = match optional_bands_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = calc::label_aggregate(&structure, &scores, &bands);
    ok(&req.id, json!(result))
}

fn totals_param(req: &Request) -> Result<Vec<f64>, serde_json::Value> {
    let Some(raw) = req.params.get("totals") else {
        return Err(err(&req.id, "bad_params", "missing totals", None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid totals: {}", e), None))
}

fn handle_summarize(req: &Request) -> serde_json::Value {
    let totals = match totals_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let bands = match optional_bands_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let stats = calc::summarize(&totals, &bands);
    ok(&req.id, json!(stats))
}

fn handle_student_summary(req: &Request) -> serde_json::Value {
    let totals = match totals_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let bands = match optional_bands_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let summary = calc::summarize_student(&totals, &bands);
    ok(&req.id, json!(summary))
}

pub fn try_handle(req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.aggregate" => Some(handle_aggregate(req)),
        "results.summarize" => Some(handle_summarize(req)),
        "results.studentSummary" => Some(handle_student_summary(req)),
        _ => None,
    }
}
