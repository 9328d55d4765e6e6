pub mod docx;
pub mod pdf;

use crate::report::IssuedReport;
use crate::settings::PdfSettings;
use anyhow::Context;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Result card not found. Please generate the result first.")]
    MissingRenderTarget,
    #[error("Failed to generate {}. Please try again. ({message})", .format.label())]
    EncodingFailure {
        format: ExportFormat,
        message: String,
    },
}

impl ExportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRenderTarget => "missing_render_target",
            Self::EncodingFailure { .. } => "encoding_failure",
        }
    }

    fn encoding(format: ExportFormat, e: anyhow::Error) -> Self {
        Self::EncodingFailure {
            format,
            message: format!("{e:#}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub path: String,
    pub file_name: String,
    pub bytes: u64,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
}

/// `{name}_Result_Card.{ext}`; path separators in the name become `_`.
pub fn output_file_name(student_name: &str, format: ExportFormat) -> String {
    let safe: String = student_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    format!("{}_Result_Card.{}", safe, format.extension())
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn write_output(dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<ExportOutcome> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;
    let path: PathBuf = dir.join(file_name);
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    Ok(ExportOutcome {
        path: path.to_string_lossy().to_string(),
        file_name: file_name.to_string(),
        bytes: bytes.len() as u64,
        sha256: sha256_hex(bytes),
        pages: None,
    })
}

pub fn export_docx(
    current: Option<&IssuedReport>,
    out_dir: &Path,
) -> Result<ExportOutcome, ExportError> {
    let issued = current.ok_or(ExportError::MissingRenderTarget)?;
    let format = ExportFormat::Docx;
    let bytes = docx::encode(&issued.report).map_err(|e| ExportError::encoding(format, e))?;
    let file_name = output_file_name(&issued.report.student_name, format);
    let outcome =
        write_output(out_dir, &file_name, &bytes).map_err(|e| ExportError::encoding(format, e))?;
    tracing::info!(report_id = %issued.report_id, path = %outcome.path, bytes = outcome.bytes, "docx exported");
    Ok(outcome)
}

/// PDF export from a rendered snapshot of the report view. `snapshot_report_id`
/// names the report the snapshot was rendered from, when the host knows it.
pub fn export_pdf(
    current: Option<&IssuedReport>,
    snapshot_path: &Path,
    snapshot_report_id: Option<&str>,
    geometry: &PdfSettings,
    out_dir: &Path,
) -> Result<ExportOutcome, ExportError> {
    let issued = current.ok_or(ExportError::MissingRenderTarget)?;
    if let Some(id) = snapshot_report_id {
        if id != issued.report_id {
            tracing::warn!(snapshot = id, current = %issued.report_id, "stale report snapshot");
            return Err(ExportError::MissingRenderTarget);
        }
    }
    let format = ExportFormat::Pdf;
    let jpeg = std::fs::read(snapshot_path)
        .with_context(|| {
            format!(
                "failed to read report snapshot {}",
                snapshot_path.to_string_lossy()
            )
        })
        .map_err(|e| ExportError::encoding(format, e))?;
    let encoded = pdf::encode(&jpeg, geometry).map_err(|e| ExportError::encoding(format, e))?;
    let file_name = output_file_name(&issued.report.student_name, format);
    let mut outcome = write_output(out_dir, &file_name, &encoded.bytes)
        .map_err(|e| ExportError::encoding(format, e))?;
    outcome.pages = Some(encoded.pages);
    tracing::info!(
        report_id = %issued.report_id,
        path = %outcome.path,
        pages = encoded.pages,
        "pdf exported"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_result_card_pattern() {
        assert_eq!(
            output_file_name("Ayesha Khan", ExportFormat::Pdf),
            "Ayesha Khan_Result_Card.pdf"
        );
        assert_eq!(
            output_file_name("a/b\\c", ExportFormat::Docx),
            "a_b_c_Result_Card.docx"
        );
    }

    #[test]
    fn export_without_report_is_missing_render_target() {
        let dir = std::env::temp_dir();
        let e = export_docx(None, &dir).unwrap_err();
        assert!(matches!(e, ExportError::MissingRenderTarget));
        assert_eq!(e.code(), "missing_render_target");

        let e = export_pdf(
            None,
            Path::new("does-not-exist.jpg"),
            None,
            &crate::settings::Settings::default().pdf,
            &dir,
        )
        .unwrap_err();
        assert!(matches!(e, ExportError::MissingRenderTarget));
    }

    #[test]
    fn sha256_hex_is_lowercase_64_chars() {
        let h = sha256_hex(b"abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
