use crate::record::StudentRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GRADE_A_MIN: i64 = 85;
pub const GRADE_B_MIN: i64 = 70;
pub const GRADE_S_MIN: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    S,
    #[serde(rename = "NI")]
    Ni,
}

impl LetterGrade {
    pub const ALL: [LetterGrade; 4] = [Self::A, Self::B, Self::S, Self::Ni];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "S" => Some(Self::S),
            "NI" => Some(Self::Ni),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::S => "S",
            Self::Ni => "NI",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::A => "Excellent",
            Self::B => "Good",
            Self::S => "Satisfactory",
            Self::Ni => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradingError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

pub fn letter_grade(score: i64) -> LetterGrade {
    if score >= GRADE_A_MIN {
        LetterGrade::A
    } else if score >= GRADE_B_MIN {
        LetterGrade::B
    } else if score >= GRADE_S_MIN {
        LetterGrade::S
    } else {
        LetterGrade::Ni
    }
}

/// Round-half-up of `num / den` for non-negative `num` and positive `den`:
/// `floor(num/den + 0.5)` kept in integers so .5 never drifts.
fn round_half_up_ratio(num: i64, den: i64) -> i64 {
    (2 * num + den).div_euclid(2 * den)
}

/// `round((term + exam) / 2)`, halves rounded up: (69, 70) -> 70.
pub fn subject_average(term: u8, exam: u8) -> i64 {
    round_half_up_ratio(i64::from(term) + i64::from(exam), 2)
}

pub fn overall_average(subject_averages: &[i64]) -> Result<i64, GradingError> {
    if subject_averages.is_empty() {
        return Err(GradingError::InvalidInput(
            "overall average needs at least one subject",
        ));
    }
    let sum: i64 = subject_averages.iter().sum();
    Ok(round_half_up_ratio(sum, subject_averages.len() as i64))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject: String,
    pub term: u8,
    pub exam: u8,
    pub average: i64,
    pub grade: LetterGrade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedResult {
    pub subjects: Vec<SubjectResult>,
    pub overall_average: i64,
    pub overall_grade: LetterGrade,
}

/// Grades a submitted record. Called once per snapshot; every consumer reads this result.
pub fn grade_record(record: &StudentRecord) -> Result<DerivedResult, GradingError> {
    let subjects: Vec<SubjectResult> = record
        .subjects
        .iter()
        .map(|s| {
            let average = subject_average(s.marks.term_marks, s.marks.exam_marks);
            SubjectResult {
                subject: s.subject.clone(),
                term: s.marks.term_marks,
                exam: s.marks.exam_marks,
                average,
                grade: letter_grade(average),
            }
        })
        .collect();
    let averages: Vec<i64> = subjects.iter().map(|s| s.average).collect();
    let overall = overall_average(&averages)?;
    tracing::debug!(
        subjects = subjects.len(),
        overall_average = overall,
        "graded record"
    );
    Ok(DerivedResult {
        subjects,
        overall_average: overall,
        overall_grade: letter_grade(overall),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_grade_boundaries() {
        assert_eq!(letter_grade(84), LetterGrade::B);
        assert_eq!(letter_grade(85), LetterGrade::A);
        assert_eq!(letter_grade(69), LetterGrade::S);
        assert_eq!(letter_grade(70), LetterGrade::B);
        assert_eq!(letter_grade(49), LetterGrade::Ni);
        assert_eq!(letter_grade(50), LetterGrade::S);
        assert_eq!(letter_grade(0), LetterGrade::Ni);
        assert_eq!(letter_grade(100), LetterGrade::A);
    }

    #[test]
    fn subject_average_rounds_half_up() {
        assert_eq!(subject_average(80, 90), 85);
        assert_eq!(subject_average(40, 40), 40);
        assert_eq!(subject_average(69, 70), 70);
        assert_eq!(subject_average(0, 1), 1);
        assert_eq!(subject_average(100, 99), 100);
        assert_eq!(subject_average(0, 0), 0);
    }

    #[test]
    fn overall_average_rejects_empty_input() {
        assert_eq!(
            overall_average(&[]),
            Err(GradingError::InvalidInput(
                "overall average needs at least one subject"
            ))
        );
    }

    #[test]
    fn overall_average_rounds_half_up() {
        assert_eq!(overall_average(&[50, 51]), Ok(51));
        assert_eq!(overall_average(&[50, 50, 51]), Ok(50));
        assert_eq!(overall_average(&[85; 8]), Ok(85));
        // 396 / 8 = 49.5
        assert_eq!(overall_average(&[49, 49, 49, 49, 50, 50, 50, 50]), Ok(50));
    }

    #[test]
    fn grade_labels_round_trip_through_text() {
        for g in LetterGrade::ALL {
            assert_eq!(LetterGrade::parse(g.as_str()), Some(g));
            assert_eq!(g.to_string(), g.as_str());
        }
        assert_eq!(LetterGrade::parse("ni"), None);
        assert_eq!(
            serde_json::to_string(&LetterGrade::Ni).expect("json"),
            "\"NI\""
        );
    }
}
