use crate::grading::{DerivedResult, LetterGrade, SubjectResult};
use crate::record::{ProgressCategory, StudentRecord};
use crate::settings::Settings;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

pub const ACADEMIC_COLUMNS: [&str; 5] = [
    "Subject",
    "Term %",
    "Examination %",
    "Average %",
    "Grade",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

impl LabeledValue {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    pub school_name: String,
    pub taglines: Vec<String>,
    pub campus_line: String,
    pub year_line: String,
    pub title_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicRow {
    pub subject: String,
    pub term: u8,
    pub exam: u8,
    pub average: i64,
    pub grade: LetterGrade,
}

impl AcademicRow {
    /// Cell text in column order. Every consumer prints these strings.
    pub fn cells(&self) -> [String; 5] {
        [
            self.subject.clone(),
            self.term.to_string(),
            self.exam.to_string(),
            self.average.to_string(),
            self.grade.as_str().to_string(),
        ]
    }
}

impl From<&SubjectResult> for AcademicRow {
    fn from(r: &SubjectResult) -> Self {
        Self {
            subject: r.subject.clone(),
            term: r.term,
            exam: r.exam,
            average: r.average,
            grade: r.grade,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallSummary {
    pub overall_average: i64,
    pub overall_grade: LetterGrade,
    pub cells: Vec<LabeledValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCell {
    pub label: String,
    pub grade: Option<LetterGrade>,
}

impl ProgressCell {
    pub fn text(&self) -> &'static str {
        self.grade.map(LetterGrade::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralProgressTable {
    pub cells: Vec<ProgressCell>,
    pub legend: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBlock {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureBlock {
    pub role: String,
    pub name: Option<String>,
}

/// Everything the result card shows. The screen and both export encoders read
/// this one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub student_name: String,
    pub header: ReportHeader,
    pub identity: Vec<LabeledValue>,
    pub academic_columns: Vec<String>,
    pub academic_rows: Vec<AcademicRow>,
    pub summary: OverallSummary,
    pub class_statistics: Vec<LabeledValue>,
    pub general_progress: GeneralProgressTable,
    pub activity_comments: Vec<CommentBlock>,
    pub teacher_comments: Vec<CommentBlock>,
    pub signatures: Vec<SignatureBlock>,
    pub issued_on: String,
}

/// A built report together with the frozen record it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedReport {
    pub report_id: String,
    pub snapshot: StudentRecord,
    pub report: Report,
}

pub fn format_issue_date(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

pub fn grade_legend() -> String {
    LetterGrade::ALL
        .iter()
        .map(|g| format!("{} = {}", g.as_str(), g.description()))
        .collect::<Vec<_>>()
        .join("   ")
}

pub fn build_report(
    snapshot: &StudentRecord,
    derived: &DerivedResult,
    settings: &Settings,
    issued_on: NaiveDate,
) -> Report {
    let na = settings.report.not_available_label.as_str();

    let header = ReportHeader {
        school_name: settings.school.name.clone(),
        taglines: settings.school.taglines.clone(),
        campus_line: format!("Campus Name: {}", snapshot.campus_name),
        year_line: format!(
            "Academic Year: {}, {}",
            snapshot.academic_year, settings.school.term_label
        ),
        title_line: format!("Class {} Result Card", snapshot.class_name),
    };

    let identity = vec![
        LabeledValue::new("Name", snapshot.name.clone()),
        LabeledValue::new("Roll No", snapshot.roll_no.clone()),
        LabeledValue::new(
            "Class/Section",
            format!("{}/{}", snapshot.class_name, snapshot.section),
        ),
        LabeledValue::new("Age", snapshot.age.clone()),
    ];

    let summary = OverallSummary {
        overall_average: derived.overall_average,
        overall_grade: derived.overall_grade,
        cells: vec![
            LabeledValue::new("Overall %", derived.overall_average.to_string()),
            LabeledValue::new("Overall Grade", derived.overall_grade.as_str()),
        ],
    };

    // No class-wide data exists for a single-student session.
    let class_statistics = vec![
        LabeledValue::new("Position in Class", na),
        LabeledValue::new("Class Highest %", na),
        LabeledValue::new("Class Lowest %", na),
        LabeledValue::new("Class Average %", na),
    ];

    let general_progress = GeneralProgressTable {
        cells: ProgressCategory::ALL
            .iter()
            .map(|c| ProgressCell {
                label: c.label().to_string(),
                grade: snapshot.general_progress.get(*c),
            })
            .collect(),
        legend: grade_legend(),
    };

    let activity_comments = vec![
        CommentBlock {
            title: "Clubs, Societies & Other Co-Curricular Activities – Overall Comments"
                .to_string(),
            body: snapshot.clubs_comments.clone(),
        },
        CommentBlock {
            title: "Values Education – Overall Comments".to_string(),
            body: snapshot.values_comments.clone(),
        },
    ];
    let teacher_comments = vec![
        CommentBlock {
            title: "Class Teacher's Comments".to_string(),
            body: snapshot.class_teacher_comments.clone(),
        },
        CommentBlock {
            title: "School Head's Comments".to_string(),
            body: snapshot.school_head_comments.clone(),
        },
    ];

    let issued = format_issue_date(issued_on, &settings.report.date_format);
    let signatures = vec![
        SignatureBlock {
            role: "Class Teacher".to_string(),
            name: Some(snapshot.class_teacher.clone()),
        },
        SignatureBlock {
            role: "Campus Stamp".to_string(),
            name: None,
        },
        SignatureBlock {
            role: "Head of School".to_string(),
            name: Some(snapshot.head_of_school.clone()),
        },
        SignatureBlock {
            role: "Date".to_string(),
            name: Some(issued.clone()),
        },
    ];

    Report {
        student_name: snapshot.name.clone(),
        header,
        identity,
        academic_columns: ACADEMIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
        academic_rows: derived.subjects.iter().map(AcademicRow::from).collect(),
        summary,
        class_statistics,
        general_progress,
        activity_comments,
        teacher_comments,
        signatures,
        issued_on: issued,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintProfile {
    pub page_size: String,
    pub orientation: String,
    pub hide_selectors: Vec<String>,
    pub border_color: String,
    pub header_fill: String,
}

/// Style rules the host applies before opening its native print dialog.
pub fn print_profile() -> PrintProfile {
    PrintProfile {
        page_size: "A4".to_string(),
        orientation: "portrait".to_string(),
        hide_selectors: vec![
            "button".to_string(),
            "[data-export-controls]".to_string(),
            "[data-navigation]".to_string(),
        ],
        border_color: "#000000".to_string(),
        header_fill: "#e5e7eb".to_string(),
    }
}
