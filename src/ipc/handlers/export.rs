use crate::export;
use crate::ipc::error::{err, export_err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;

fn optional_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

fn handle_export_docx(state: &mut AppState, req: &Request) -> Value {
    let dir = state.export_dir(optional_str(req, "outDir"));
    match export::export_docx(state.current.as_ref(), &dir) {
        Ok(outcome) => ok(&req.id, json!(outcome)),
        Err(e) => export_err(&req.id, &e),
    }
}

fn handle_export_pdf(state: &mut AppState, req: &Request) -> Value {
    if state.current.is_none() {
        return export_err(&req.id, &export::ExportError::MissingRenderTarget);
    }
    let Some(snapshot) = optional_str(req, "snapshotPath").map(PathBuf::from) else {
        return err(&req.id, "bad_params", "missing snapshotPath", None);
    };
    let dir = state.export_dir(optional_str(req, "outDir"));
    match export::export_pdf(
        state.current.as_ref(),
        &snapshot,
        optional_str(req, "reportId"),
        &state.settings.pdf,
        &dir,
    ) {
        Ok(outcome) => ok(&req.id, json!(outcome)),
        Err(e) => export_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "export.docx" => Some(handle_export_docx(state, req)),
        "export.pdf" => Some(handle_export_pdf(state, req)),
        _ => None,
    }
}
