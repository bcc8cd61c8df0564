use crate::fields::FieldValue;
use crate::ipc::error::{err, ok, validation_failed};
use crate::ipc::types::Request;
use crate::scale::{self, BandInput, GradeBand, ScaleError, UNGRADED};
use serde_json::json;

fn scale_failure(id: &str, errors: Vec<ScaleError>) -> serde_json::Value {
    let message = errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "invalid grading scale".to_string());
    validation_failed(id, message, errors.iter().map(|e| e.to_detail()).collect())
}

fn bands_param(req: &Request) -> Result<Vec<BandInput>, serde_json::Value> {
    let Some(raw) = req.params.get("bands") else {
        return Err(err(&req.id, "bad_params", "missing bands", None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid bands: {}", e), None))
}

/// Resolver calls treat an absent or null scale as "no grading configured
/// yet" rather than a protocol error.
pub fn optional_bands_param(req: &Request) -> Result<Vec<GradeBand>, serde_json::Value> {
    match req.params.get("bands") {
        None => Ok(Vec::new()),
        Some(raw) if raw.is_null() => Ok(Vec::new()),
        Some(raw) => {
            let inputs: Vec<BandInput> = serde_json::from_value(raw.clone()).map_err(|e| {
                err(&req.id, "bad_params", format!("invalid bands: {}", e), None)
            })?;
            Ok(scale::decode_bands(&inputs))
        }
    }
}

fn handle_scale_validate(req: &Request) -> serde_json::Value {
    let inputs = match bands_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match scale::validate_grading_scale(&inputs) {
        Ok(bands) => ok(&req.id, json!({ "bands": bands })),
        Err(errors) => scale_failure(&req.id, errors),
    }
}

fn handle_resolve_grade(req: &Request) -> serde_json::Value {
    let bands = match optional_bands_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("percentage") else {
        return err(&req.id, "bad_params", "missing percentage", None);
    };
    let percentage: FieldValue = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("invalid percentage: {}", e),
                None,
            )
        }
    };

    // A percentage that cannot be read has no band; grading still answers.
    let grade = match percentage.as_decimal() {
        Some(p) => scale::resolve_grade(&bands, p),
        None => UNGRADED.to_string(),
    };
    ok(&req.id, json!({ "grade": grade }))
}

fn handle_resolve_remark(req: &Request) -> serde_json::Value {
    let bands = match optional_bands_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(grade) = req.params.get("grade").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing grade", None);
    };

    let remark = scale::resolve_remark(&bands, grade);
    ok(&req.id, json!({ "remark": remark }))
}

pub fn try_handle(req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scale.validate" => Some(handle_scale_validate(req)),
        "scale.resolveGrade" => Some(handle_resolve_grade(req)),
        "scale.resolveRemark" => Some(handle_resolve_remark(req)),
        _ => None,
    }
}
