use serde_json::json;

use crate::export::ExportError;
use crate::record::FormError;

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

pub fn export_err(id: &str, e: &ExportError) -> serde_json::Value {
    tracing::warn!(code = e.code(), error = %e, "export failed");
    err(id, e.code(), e.to_string(), None)
}

pub fn form_err(id: &str, e: &FormError) -> serde_json::Value {
    match e {
        FormError::Incomplete { missing } => err(
            id,
            "validation_failed",
            e.to_string(),
            Some(json!({ "missing": missing })),
        ),
        _ => err(id, "bad_params", e.to_string(), None),
    }
}
