use serde::Deserialize;

/// One request line: `{ "id": ..., "method": "area.verb", "params": {...} }`.
/// The daemon is stateless; everything a method needs rides in `params`.
#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}
