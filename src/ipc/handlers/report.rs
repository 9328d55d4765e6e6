use crate::export::ExportError;
use crate::ipc::error::{export_err, ok};
use crate::ipc::types::{AppState, Request};
use crate::report;
use serde_json::{json, Value};

fn handle_report_get(state: &mut AppState, req: &Request) -> Value {
    match state.current.as_ref() {
        Some(issued) => ok(&req.id, json!(issued)),
        None => export_err(&req.id, &ExportError::MissingRenderTarget),
    }
}

fn handle_report_print_profile(state: &mut AppState, req: &Request) -> Value {
    if state.current.is_none() {
        return export_err(&req.id, &ExportError::MissingRenderTarget);
    }
    ok(&req.id, json!(report::print_profile()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "report.get" => Some(handle_report_get(state, req)),
        "report.printProfile" => Some(handle_report_print_profile(state, req)),
        _ => None,
    }
}
