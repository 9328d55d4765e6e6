mod export;
mod grading;
mod ipc;
mod record;
mod report;
mod settings;

use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "REPORTCARD_LOG";

fn init_tracing() {
    // stdout carries the protocol; diagnostics go to stderr.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = fmt::layer()
        .with_writer(io::stderr)
        .without_time()
        .with_target(false);
    tracing_subscriber::registry().with(filter).with(fmt).init();
}

fn main() {
    init_tracing();
    let mut state = ipc::AppState::new();
    tracing::info!(session_id = %state.session_id, version = env!("CARGO_PKG_VERSION"), "reportcardd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "unparseable request line");
                ipc::err("", "bad_json", e.to_string(), None)
            }
        };

        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed; exiting");
}
