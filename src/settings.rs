use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

pub const WORKSPACE_SETTINGS_FILE: &str = "reportcard.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSection {
    School,
    Report,
    Pdf,
}

impl SettingsSection {
    pub const ALL: [SettingsSection; 3] = [Self::School, Self::Report, Self::Pdf];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "school" => Some(Self::School),
            "report" => Some(Self::Report),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Report => "report",
            Self::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolSettings {
    pub name: String,
    pub taglines: Vec<String>,
    pub term_label: String,
    pub default_academic_year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    /// strftime pattern for the signature-block date.
    pub date_format: String,
    pub not_available_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSettings {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub tile_height_mm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub school: SchoolSettings,
    pub report: ReportSettings,
    pub pdf: PdfSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            school: SchoolSettings {
                name: "The Smart School".to_string(),
                taglines: vec![
                    "Tomorrow is our Destiny".to_string(),
                    "A Project of The City School".to_string(),
                ],
                term_label: "Term I".to_string(),
                default_academic_year: "2024".to_string(),
            },
            report: ReportSettings {
                date_format: "%-m/%-d/%Y".to_string(),
                not_available_label: "N/A".to_string(),
            },
            pdf: PdfSettings {
                page_width_mm: 210.0,
                page_height_mm: 297.0,
                tile_height_mm: 295.0,
            },
        }
    }
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_non_empty(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = parse_string_max(v, key, max_len)?;
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    Ok(s)
}

fn parse_f64_range(v: &Value, key: &str, min: f64, max: f64) -> Result<f64, String> {
    let n = v.as_f64().ok_or_else(|| format!("{} must be a number", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_date_format(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_non_empty(v, key, 40)?;
    if StrftimeItems::new(&s).any(|item| matches!(item, Item::Error)) {
        return Err(format!("{} is not a valid date format", key));
    }
    Ok(s)
}

impl Settings {
    pub fn section_json(&self, section: SettingsSection) -> Value {
        let v = match section {
            SettingsSection::School => serde_json::to_value(&self.school),
            SettingsSection::Report => serde_json::to_value(&self.report),
            SettingsSection::Pdf => serde_json::to_value(&self.pdf),
        };
        v.unwrap_or(Value::Null)
    }

    /// Validates every field of `patch` before touching `self`, so a rejected
    /// patch leaves the settings unchanged.
    pub fn merge_section_patch(
        &mut self,
        section: SettingsSection,
        patch: &Map<String, Value>,
    ) -> Result<(), String> {
        let mut next = self.clone();
        for (k, v) in patch {
            match section {
                SettingsSection::School => match k.as_str() {
                    "name" => next.school.name = parse_non_empty(v, k, 120)?,
                    "termLabel" => next.school.term_label = parse_string_max(v, k, 40)?,
                    "defaultAcademicYear" => {
                        next.school.default_academic_year = parse_string_max(v, k, 20)?
                    }
                    "taglines" => {
                        let Some(items) = v.as_array() else {
                            return Err("taglines must be an array of strings".into());
                        };
                        if items.len() > 4 {
                            return Err("taglines must have at most 4 entries".into());
                        }
                        next.school.taglines = items
                            .iter()
                            .map(|t| parse_string_max(t, k, 80))
                            .collect::<Result<Vec<_>, _>>()?;
                    }
                    _ => return Err(format!("unknown school field: {}", k)),
                },
                SettingsSection::Report => match k.as_str() {
                    "dateFormat" => next.report.date_format = parse_date_format(v, k)?,
                    "notAvailableLabel" => {
                        next.report.not_available_label = parse_non_empty(v, k, 16)?
                    }
                    _ => return Err(format!("unknown report field: {}", k)),
                },
                SettingsSection::Pdf => match k.as_str() {
                    "pageWidthMm" => next.pdf.page_width_mm = parse_f64_range(v, k, 50.0, 1000.0)?,
                    "pageHeightMm" => {
                        next.pdf.page_height_mm = parse_f64_range(v, k, 50.0, 2000.0)?
                    }
                    "tileHeightMm" => {
                        next.pdf.tile_height_mm = parse_f64_range(v, k, 10.0, 2000.0)?
                    }
                    _ => return Err(format!("unknown pdf field: {}", k)),
                },
            }
        }
        if next.pdf.tile_height_mm > next.pdf.page_height_mm {
            return Err("tileHeightMm must not exceed pageHeightMm".into());
        }
        *self = next;
        Ok(())
    }
}

/// Best-effort settings seed from `reportcard.json` in a workspace, layered over
/// `base`. Sections that fail validation are skipped and the rest still apply.
pub fn load_workspace_settings(
    workspace: &Path,
    base: &Settings,
) -> anyhow::Result<Option<Settings>> {
    let path = workspace.join(WORKSPACE_SETTINGS_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.to_string_lossy()))?;

    let mut settings = base.clone();
    for section in SettingsSection::ALL {
        let Some(obj) = raw.get(section.key()).and_then(|v| v.as_object()) else {
            continue;
        };
        if let Err(msg) = settings.merge_section_patch(section, obj) {
            tracing::warn!(section = section.key(), %msg, "ignoring invalid settings section");
        }
    }
    Ok(Some(settings))
}
