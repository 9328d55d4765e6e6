use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::settings::SettingsSection;
use serde_json::{json, Map, Value};

fn handle_setup_get(state: &mut AppState, req: &Request) -> Value {
    let mut out = Map::new();
    for section in SettingsSection::ALL {
        out.insert(
            section.key().to_string(),
            state.settings.section_json(section),
        );
    }
    ok(&req.id, Value::Object(out))
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> Value {
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SettingsSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut next = state.settings.clone();
    if let Err(msg) = next.merge_section_patch(section, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    state.apply_settings(next);
    tracing::info!(section = section.key(), "settings updated");
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
