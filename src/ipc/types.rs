use std::path::PathBuf;

use serde::Deserialize;
use uuid::Uuid;

use crate::record::StudentRecord;
use crate::report::IssuedReport;
use crate::settings::Settings;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub session_id: String,
    pub workspace: Option<PathBuf>,
    pub settings: Settings,
    pub draft: StudentRecord,
    pub current: Option<IssuedReport>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let settings = Settings::default();
        let draft = StudentRecord::blank(&settings.school.default_academic_year);
        Self {
            session_id: Uuid::new_v4().to_string(),
            workspace: None,
            settings,
            draft,
            current: None,
        }
    }

    /// Installs new settings. An untouched draft picks up the new default
    /// academic year; a draft with edits keeps what the user typed.
    pub fn apply_settings(&mut self, settings: Settings) {
        let untouched = StudentRecord::blank(&self.settings.school.default_academic_year);
        if self.draft == untouched {
            self.draft = StudentRecord::blank(&settings.school.default_academic_year);
        }
        self.settings = settings;
    }

    /// Back to a zeroed form; the submitted snapshot and its report are dropped.
    pub fn reset_form(&mut self) {
        self.draft = StudentRecord::blank(&self.settings.school.default_academic_year);
        self.current = None;
    }

    pub fn export_dir(&self, requested: Option<&str>) -> PathBuf {
        match (requested, &self.workspace) {
            (Some(dir), _) => PathBuf::from(dir),
            (None, Some(ws)) => ws.clone(),
            (None, None) => std::env::temp_dir(),
        }
    }
}
