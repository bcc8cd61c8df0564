use crate::ipc::error::{err, ok, validation_failed};
use crate::ipc::types::Request;
use crate::structure::{
    self, AssessmentComponent, ComponentInput, ComponentPatch, StructureError,
};
use serde_json::json;
use uuid::Uuid;

fn structure_failure(id: &str, errors: Vec<StructureError>) -> serde_json::Value {
    let message = errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "invalid assessment structure".to_string());
    validation_failed(id, message, errors.iter().map(|e| e.to_detail()).collect())
}

fn components_param(req: &Request) -> Result<Vec<ComponentInput>, serde_json::Value> {
    let Some(raw) = req.params.get("components") else {
        return Err(err(&req.id, "bad_params", "missing components", None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid components: {}", e),
            None,
        )
    })
}

/// The committed set rides along on every editing call; it must at least
/// decode, though its total may still be under 100 mid-edit.
fn committed_param(req: &Request) -> Result<Vec<AssessmentComponent>, serde_json::Value> {
    let inputs = components_param(req)?;
    structure::decode_components(&inputs).map_err(|errs| structure_failure(&req.id, errs))
}

fn component_index(
    req: &Request,
    committed: &[AssessmentComponent],
) -> Result<usize, serde_json::Value> {
    let Some(component_id) = req.params.get("componentId").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing componentId", None));
    };
    committed
        .iter()
        .position(|c| c.id.as_deref() == Some(component_id))
        .ok_or_else(|| {
            err(
                &req.id,
                "not_found",
                "component not found",
                Some(json!({ "componentId": component_id })),
            )
        })
}

fn handle_structure_validate(req: &Request) -> serde_json::Value {
    let inputs = match components_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match structure::validate_structure(&inputs) {
        Ok(components) => ok(&req.id, json!({ "components": components })),
        Err(errors) => structure_failure(&req.id, errors),
    }
}

fn handle_component_add(req: &Request) -> serde_json::Value {
    let committed = match committed_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("component") else {
        return err(&req.id, "bad_params", "missing component", None);
    };
    let mut draft: ComponentInput = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_params",
                format!("invalid component: {}", e),
                None,
            )
        }
    };
    if draft.id.is_none() {
        draft.id = Some(Uuid::new_v4().to_string());
    }

    match structure::add_component(&committed, &draft) {
        Ok(components) => ok(
            &req.id,
            json!({ "components": components, "componentId": draft.id }),
        ),
        Err(errors) => structure_failure(&req.id, errors),
    }
}

fn handle_component_update(req: &Request) -> serde_json::Value {
    let committed = match committed_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let index = match component_index(req, &committed) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(raw) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing/invalid patch", None);
    };
    let patch: ComponentPatch = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("invalid patch: {}", e), None),
    };
    if patch.kind.is_none() && patch.percentage.is_none() && patch.order.is_none() {
        return err(
            &req.id,
            "bad_params",
            "patch must include at least one field",
            None,
        );
    }

    match structure::update_component(&committed, index, &patch) {
        Ok(components) => ok(&req.id, json!({ "components": components })),
        Err(errors) => structure_failure(&req.id, errors),
    }
}

fn handle_component_remove(req: &Request) -> serde_json::Value {
    let committed = match committed_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let index = match component_index(req, &committed) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let components = structure::remove_component(&committed, index);
    ok(&req.id, json!({ "components": components }))
}

pub fn try_handle(req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "structure.validate" => Some(handle_structure_validate(req)),
        "structure.componentAdd" => Some(handle_component_add(req)),
        "structure.componentUpdate" => Some(handle_component_update(req)),
        "structure.componentRemove" => Some(handle_component_remove(req)),
        _ => None,
    }
}
