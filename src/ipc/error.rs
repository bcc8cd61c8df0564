use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Renders a collected validation failure. `message` is the first error's
/// human rendering; `errors` carries the full structured list so the form
/// layer can attach messages to individual fields.
pub fn validation_failed(
    id: &str,
    message: impl Into<String>,
    errors: Vec<serde_json::Value>,
) -> serde_json::Value {
    err(
        id,
        "validation_failed",
        message,
        Some(json!({ "errors": errors })),
    )
}
