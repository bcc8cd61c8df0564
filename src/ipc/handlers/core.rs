use crate::ipc::error::ok;
use crate::ipc::types::Request;
use serde_json::json;

fn handle_health_check(req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

pub fn try_handle(req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health.check" => Some(handle_health_check(req)),
        _ => None,
    }
}
