use crate::grading;
use crate::ipc::error::{err, form_err, ok};
use crate::ipc::types::{AppState, Request};
use crate::record::FormEdit;
use crate::report::{self, IssuedReport};
use serde_json::{json, Value};
use uuid::Uuid;

fn draft_json(state: &AppState) -> Value {
    json!({ "draft": state.draft })
}

fn parse_edits(req: &Request) -> Result<Vec<FormEdit>, Value> {
    let raw = match (req.params.get("edit"), req.params.get("edits")) {
        (Some(one), None) => vec![one.clone()],
        (None, Some(Value::Array(many))) => many.clone(),
        (None, Some(_)) => {
            return Err(err(&req.id, "bad_params", "edits must be an array", None));
        }
        (Some(_), Some(_)) => {
            return Err(err(
                &req.id,
                "bad_params",
                "pass either edit or edits, not both",
                None,
            ));
        }
        (None, None) => return Err(err(&req.id, "bad_params", "missing edit", None)),
    };
    raw.into_iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value::<FormEdit>(v).map_err(|e| {
                err(
                    &req.id,
                    "bad_params",
                    format!("invalid edit: {}", e),
                    Some(json!({ "index": i })),
                )
            })
        })
        .collect()
}

fn handle_form_get(state: &mut AppState, req: &Request) -> Value {
    ok(&req.id, draft_json(state))
}

fn handle_form_reset(state: &mut AppState, req: &Request) -> Value {
    state.reset_form();
    ok(&req.id, draft_json(state))
}

fn handle_form_update(state: &mut AppState, req: &Request) -> Value {
    let edits = match parse_edits(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    // All-or-nothing: the draft only moves if every edit in the batch applies.
    let mut next = state.draft.clone();
    for (i, edit) in edits.iter().enumerate() {
        next = match next.reduce(edit) {
            Ok(v) => v,
            Err(e) => {
                let mut resp = form_err(&req.id, &e);
                resp["error"]["details"] = json!({ "index": i });
                return resp;
            }
        };
    }
    state.draft = next;
    ok(&req.id, draft_json(state))
}

fn handle_form_submit(state: &mut AppState, req: &Request) -> Value {
    if let Err(e) = state.draft.validate_for_submit() {
        return form_err(&req.id, &e);
    }
    let snapshot = state.draft.clone();
    let derived = match grading::grade_record(&snapshot) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "grading_failed", e.to_string(), None),
    };
    let issued_on = chrono::Local::now().date_naive();
    let built = report::build_report(&snapshot, &derived, &state.settings, issued_on);
    let issued = IssuedReport {
        report_id: Uuid::new_v4().to_string(),
        snapshot,
        report: built,
    };
    tracing::info!(
        report_id = %issued.report_id,
        overall_average = derived.overall_average,
        overall_grade = %derived.overall_grade,
        "report generated"
    );
    let resp = ok(&req.id, json!(issued));
    state.current = Some(issued);
    resp
}

fn handle_form_back(state: &mut AppState, req: &Request) -> Value {
    state.reset_form();
    tracing::info!("report discarded; form reset");
    ok(&req.id, draft_json(state))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "form.get" => Some(handle_form_get(state, req)),
        "form.reset" => Some(handle_form_reset(state, req)),
        "form.update" => Some(handle_form_update(state, req)),
        "form.submit" => Some(handle_form_submit(state, req)),
        "form.back" => Some(handle_form_back(state, req)),
        _ => None,
    }
}
