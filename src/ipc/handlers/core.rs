use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::settings;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionId": state.session_id,
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "hasReport": state.current.is_some()
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    if let Err(e) = std::fs::create_dir_all(&path) {
        return err(&req.id, "workspace_open_failed", e.to_string(), None);
    }

    // Best-effort: a broken reportcard.json must not prevent the workspace from opening.
    let mut settings_loaded = false;
    match settings::load_workspace_settings(&path, &state.settings) {
        Ok(Some(loaded)) => {
            state.apply_settings(loaded);
            settings_loaded = true;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "ignoring workspace settings"),
    }

    tracing::info!(workspace = %path.to_string_lossy(), settings_loaded, "workspace selected");
    state.workspace = Some(path.clone());
    ok(
        &req.id,
        json!({
            "workspacePath": path.to_string_lossy(),
            "settingsLoaded": settings_loaded
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
