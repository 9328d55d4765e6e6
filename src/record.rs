use crate::grading::LetterGrade;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Subjects on the result card, in the order they are printed.
pub const SUBJECTS: [&str; 8] = [
    "English",
    "Urdu",
    "Mathematics",
    "General Science",
    "Social Studies",
    "Islamiyat",
    "Tadrees-e-Quran (Naazrah Quran)",
    "Computer Studies",
];

pub const MARK_MIN: i64 = 0;
pub const MARK_MAX: i64 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),
    #[error("unknown general progress category: {0}")]
    UnknownCategory(String),
    #[error("unknown {section} field: {field}")]
    UnknownField {
        section: &'static str,
        field: String,
    },
    #[error("grade must be one of: A, B, S, NI (got {0})")]
    InvalidGrade(String),
    #[error("required fields are empty: {}", .missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marks {
    pub term_marks: u8,
    pub exam_marks: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMarks {
    pub subject: String,
    #[serde(flatten)]
    pub marks: Marks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressCategory {
    Art,
    Attendance,
    Conduct,
    Effort,
    PeGames,
    Punctuality,
}

impl ProgressCategory {
    pub const ALL: [ProgressCategory; 6] = [
        Self::Art,
        Self::Attendance,
        Self::Conduct,
        Self::Effort,
        Self::PeGames,
        Self::Punctuality,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "art" => Some(Self::Art),
            "attendance" => Some(Self::Attendance),
            "conduct" => Some(Self::Conduct),
            "effort" => Some(Self::Effort),
            "peGames" => Some(Self::PeGames),
            "punctuality" => Some(Self::Punctuality),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Art => "Art",
            Self::Attendance => "Attendance",
            Self::Conduct => "Conduct",
            Self::Effort => "Effort",
            Self::PeGames => "PE/Games",
            Self::Punctuality => "Punctuality",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralProgress {
    pub art: Option<LetterGrade>,
    pub attendance: Option<LetterGrade>,
    pub conduct: Option<LetterGrade>,
    pub effort: Option<LetterGrade>,
    pub pe_games: Option<LetterGrade>,
    pub punctuality: Option<LetterGrade>,
}

impl GeneralProgress {
    pub fn get(&self, category: ProgressCategory) -> Option<LetterGrade> {
        match category {
            ProgressCategory::Art => self.art,
            ProgressCategory::Attendance => self.attendance,
            ProgressCategory::Conduct => self.conduct,
            ProgressCategory::Effort => self.effort,
            ProgressCategory::PeGames => self.pe_games,
            ProgressCategory::Punctuality => self.punctuality,
        }
    }

    fn slot_mut(&mut self, category: ProgressCategory) -> &mut Option<LetterGrade> {
        match category {
            ProgressCategory::Art => &mut self.art,
            ProgressCategory::Attendance => &mut self.attendance,
            ProgressCategory::Conduct => &mut self.conduct,
            ProgressCategory::Effort => &mut self.effort,
            ProgressCategory::PeGames => &mut self.pe_games,
            ProgressCategory::Punctuality => &mut self.punctuality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub age: String,
    pub campus_name: String,
    pub academic_year: String,
    pub subjects: Vec<SubjectMarks>,
    pub general_progress: GeneralProgress,
    pub clubs_comments: String,
    pub values_comments: String,
    pub class_teacher_comments: String,
    pub school_head_comments: String,
    pub class_teacher: String,
    pub head_of_school: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkComponent {
    Term,
    Exam,
}

/// One user edit against the form draft.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FormEdit {
    Identity {
        field: String,
        value: String,
    },
    Marks {
        subject: String,
        component: MarkComponent,
        value: Value,
    },
    Progress {
        category: String,
        #[serde(default)]
        grade: Option<String>,
    },
    Comment {
        field: String,
        value: String,
    },
    Authority {
        field: String,
        value: String,
    },
}

impl StudentRecord {
    /// Fresh draft: every mark zero, every text field empty.
    pub fn blank(default_academic_year: &str) -> Self {
        Self {
            name: String::new(),
            class_name: String::new(),
            section: String::new(),
            roll_no: String::new(),
            age: String::new(),
            campus_name: String::new(),
            academic_year: default_academic_year.to_string(),
            subjects: SUBJECTS
                .iter()
                .map(|s| SubjectMarks {
                    subject: (*s).to_string(),
                    marks: Marks::default(),
                })
                .collect(),
            general_progress: GeneralProgress::default(),
            clubs_comments: String::new(),
            values_comments: String::new(),
            class_teacher_comments: String::new(),
            school_head_comments: String::new(),
            class_teacher: String::new(),
            head_of_school: String::new(),
        }
    }

    #[allow(dead_code)]
    pub fn marks(&self, subject: &str) -> Option<Marks> {
        self.subjects
            .iter()
            .find(|s| s.subject == subject)
            .map(|s| s.marks)
    }

    /// Applies one edit and returns the next draft. The input is left untouched.
    pub fn reduce(&self, edit: &FormEdit) -> Result<StudentRecord, FormError> {
        let mut next = self.clone();
        match edit {
            FormEdit::Identity { field, value } => {
                let slot = match field.as_str() {
                    "name" => &mut next.name,
                    "className" => &mut next.class_name,
                    "section" => &mut next.section,
                    "rollNo" => &mut next.roll_no,
                    "age" => &mut next.age,
                    "campusName" => &mut next.campus_name,
                    "academicYear" => &mut next.academic_year,
                    _ => {
                        return Err(FormError::UnknownField {
                            section: "identity",
                            field: field.clone(),
                        })
                    }
                };
                *slot = value.clone();
            }
            FormEdit::Marks {
                subject,
                component,
                value,
            } => {
                let Some(entry) = next.subjects.iter_mut().find(|s| &s.subject == subject) else {
                    return Err(FormError::UnknownSubject(subject.clone()));
                };
                let mark = coerce_mark(value);
                match component {
                    MarkComponent::Term => entry.marks.term_marks = mark,
                    MarkComponent::Exam => entry.marks.exam_marks = mark,
                }
            }
            FormEdit::Progress { category, grade } => {
                let Some(cat) = ProgressCategory::parse(category) else {
                    return Err(FormError::UnknownCategory(category.clone()));
                };
                let parsed = match grade.as_deref().map(str::trim) {
                    None | Some("") => None,
                    Some(g) => Some(
                        LetterGrade::parse(g).ok_or_else(|| FormError::InvalidGrade(g.to_string()))?,
                    ),
                };
                *next.general_progress.slot_mut(cat) = parsed;
            }
            FormEdit::Comment { field, value } => {
                let slot = match field.as_str() {
                    "clubsComments" => &mut next.clubs_comments,
                    "valuesComments" => &mut next.values_comments,
                    "classTeacherComments" => &mut next.class_teacher_comments,
                    "schoolHeadComments" => &mut next.school_head_comments,
                    _ => {
                        return Err(FormError::UnknownField {
                            section: "comment",
                            field: field.clone(),
                        })
                    }
                };
                *slot = value.clone();
            }
            FormEdit::Authority { field, value } => {
                let slot = match field.as_str() {
                    "classTeacher" => &mut next.class_teacher,
                    "headOfSchool" => &mut next.head_of_school,
                    _ => {
                        return Err(FormError::UnknownField {
                            section: "authority",
                            field: field.clone(),
                        })
                    }
                };
                *slot = value.clone();
            }
        }
        Ok(next)
    }

    /// Required-field check run at submission. Comments and progress ratings may stay blank.
    pub fn validate_for_submit(&self) -> Result<(), FormError> {
        let required: [(&'static str, &str); 8] = [
            ("name", &self.name),
            ("className", &self.class_name),
            ("section", &self.section),
            ("rollNo", &self.roll_no),
            ("age", &self.age),
            ("campusName", &self.campus_name),
            ("classTeacher", &self.class_teacher),
            ("headOfSchool", &self.head_of_school),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FormError::Incomplete { missing })
        }
    }
}

/// Lenient mark parsing: leading integer of a string, truncated numbers.
/// Anything unparseable or outside 0..=100 becomes 0.
pub fn coerce_mark(value: &Value) -> u8 {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    };
    match parsed {
        Some(n) if (MARK_MIN..=MARK_MAX).contains(&n) => n as u8,
        _ => 0,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let t = s.trim_start();
    let (negative, rest) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let digits: &str = {
        let end = rest
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let n: i64 = digits.parse().ok()?;
    Some(if negative { -n } else { n })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn marks_edit(subject: &str, component: MarkComponent, value: Value) -> FormEdit {
        FormEdit::Marks {
            subject: subject.to_string(),
            component,
            value,
        }
    }

    #[test]
    fn blank_record_has_fixed_subjects_zeroed() {
        let r = StudentRecord::blank("2024");
        assert_eq!(r.subjects.len(), SUBJECTS.len());
        for (s, name) in r.subjects.iter().zip(SUBJECTS.iter()) {
            assert_eq!(s.subject, *name);
            assert_eq!(s.marks, Marks::default());
        }
        assert_eq!(r.academic_year, "2024");
        assert!(r.name.is_empty());
    }

    #[test]
    fn coerce_mark_follows_lenient_parse_rules() {
        assert_eq!(coerce_mark(&json!(85)), 85);
        assert_eq!(coerce_mark(&json!("85")), 85);
        assert_eq!(coerce_mark(&json!(" 72abc")), 72);
        assert_eq!(coerce_mark(&json!("12.7")), 12);
        assert_eq!(coerce_mark(&json!(99.9)), 99);
        assert_eq!(coerce_mark(&json!("abc")), 0);
        assert_eq!(coerce_mark(&json!("")), 0);
        assert_eq!(coerce_mark(&json!(null)), 0);
        assert_eq!(coerce_mark(&json!(101)), 0);
        assert_eq!(coerce_mark(&json!(-5)), 0);
        assert_eq!(coerce_mark(&json!("99999999999999999999999")), 0);
        assert_eq!(coerce_mark(&json!(100)), 100);
        assert_eq!(coerce_mark(&json!(0)), 0);
    }

    #[test]
    fn reduce_leaves_previous_state_untouched() {
        let before = StudentRecord::blank("2024");
        let after = before
            .reduce(&marks_edit("Mathematics", MarkComponent::Exam, json!(91)))
            .expect("edit");
        assert_eq!(before.marks("Mathematics").map(|m| m.exam_marks), Some(0));
        assert_eq!(after.marks("Mathematics").map(|m| m.exam_marks), Some(91));
        assert_eq!(after.marks("Mathematics").map(|m| m.term_marks), Some(0));
    }

    #[test]
    fn reduce_rejects_unknown_subject_and_category() {
        let r = StudentRecord::blank("2024");
        let e = r
            .reduce(&marks_edit("Physics", MarkComponent::Term, json!(50)))
            .unwrap_err();
        assert_eq!(e, FormError::UnknownSubject("Physics".into()));

        let e = r
            .reduce(&FormEdit::Progress {
                category: "music".into(),
                grade: Some("A".into()),
            })
            .unwrap_err();
        assert_eq!(e, FormError::UnknownCategory("music".into()));

        let e = r
            .reduce(&FormEdit::Progress {
                category: "art".into(),
                grade: Some("C".into()),
            })
            .unwrap_err();
        assert_eq!(e, FormError::InvalidGrade("C".into()));
    }

    #[test]
    fn progress_grade_can_be_cleared() {
        let r = StudentRecord::blank("2024")
            .reduce(&FormEdit::Progress {
                category: "peGames".into(),
                grade: Some("NI".into()),
            })
            .expect("set");
        assert_eq!(
            r.general_progress.get(ProgressCategory::PeGames),
            Some(LetterGrade::Ni)
        );
        let r = r
            .reduce(&FormEdit::Progress {
                category: "peGames".into(),
                grade: None,
            })
            .expect("clear");
        assert_eq!(r.general_progress.get(ProgressCategory::PeGames), None);
    }

    #[test]
    fn submit_validation_lists_missing_required_fields() {
        let r = StudentRecord::blank("2024")
            .reduce(&FormEdit::Identity {
                field: "name".into(),
                value: "Ayesha Khan".into(),
            })
            .expect("name");
        let Err(FormError::Incomplete { missing }) = r.validate_for_submit() else {
            panic!("expected incomplete");
        };
        assert!(!missing.contains(&"name"));
        assert!(missing.contains(&"classTeacher"));
        assert!(missing.contains(&"headOfSchool"));
        assert!(!missing.contains(&"academicYear"));
    }

    #[test]
    fn form_edit_deserializes_from_wire_shape() {
        let edit: FormEdit = serde_json::from_value(json!({
            "kind": "marks",
            "subject": "Urdu",
            "component": "term",
            "value": "77"
        }))
        .expect("parse edit");
        let r = StudentRecord::blank("2024").reduce(&edit).expect("apply");
        assert_eq!(r.marks("Urdu").map(|m| m.term_marks), Some(77));
    }
}
