use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::models::StudentRecord;

const SEED_ROSTER: &str = include_str!("../data/students.json");

#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read roster file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("roster is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("student {student}: {reason}")]
    Invalid { student: String, reason: String },
    #[error("duplicate student id {0}")]
    DuplicateStudent(String),
}

#[derive(Deserialize)]
struct RosterFile {
    students: Vec<StudentRecord>,
}

/// Read-only provider of the full roster snapshot.
pub trait RosterSource {
    fn load(&self) -> Result<Vec<StudentRecord>, DataError>;
}

/// Roster compiled into the binary.
pub struct SeedRoster;

impl RosterSource for SeedRoster {
    fn load(&self) -> Result<Vec<StudentRecord>, DataError> {
        parse_roster(SEED_ROSTER)
    }
}

pub struct JsonFileRoster {
    path: PathBuf,
}

impl JsonFileRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RosterSource for JsonFileRoster {
    fn load(&self) -> Result<Vec<StudentRecord>, DataError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| DataError::Read {
            path: self.path.clone(),
            source,
        })?;
        let students = parse_roster(&raw)?;
        tracing::debug!(path = %self.path.display(), count = students.len(), "loaded roster file");
        Ok(students)
    }
}

pub fn source_for(path: Option<&Path>) -> Box<dyn RosterSource> {
    match path {
        Some(path) => Box::new(JsonFileRoster::new(path)),
        None => Box::new(SeedRoster),
    }
}

/// Accepts either `{"students": [...]}` or a bare array.
pub fn parse_roster(raw: &str) -> Result<Vec<StudentRecord>, DataError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let students = if value.is_array() {
        serde_json::from_value::<Vec<StudentRecord>>(value)?
    } else {
        serde_json::from_value::<RosterFile>(value)?.students
    };
    validate(&students)?;
    Ok(students)
}

pub fn validate(students: &[StudentRecord]) -> Result<(), DataError> {
    let mut seen = HashSet::new();
    for student in students {
        if !seen.insert(student.id.as_str()) {
            return Err(DataError::DuplicateStudent(student.id.clone()));
        }
        validate_student(student).map_err(|reason| DataError::Invalid {
            student: student.id.clone(),
            reason,
        })?;
    }
    Ok(())
}

fn validate_student(student: &StudentRecord) -> Result<(), String> {
    if student.id.trim().is_empty() {
        return Err("id must not be empty".to_string());
    }
    if !(0.0..=10.0).contains(&student.cgpa) {
        return Err(format!("cgpa {} is outside 0-10", student.cgpa));
    }
    if student.attendance > 100 {
        return Err(format!("attendance {} is outside 0-100", student.attendance));
    }

    let series = &student.attendance_data;
    if series.months.len() != series.attendance.len() {
        return Err(format!(
            "attendance series has {} months but {} values",
            series.months.len(),
            series.attendance.len()
        ));
    }
    if let Some(value) = series.attendance.iter().find(|value| **value > 100) {
        return Err(format!("attendance series value {value} is outside 0-100"));
    }

    unique_ids("achievement", student.achievements.iter().map(|a| a.id.as_str()))?;
    unique_ids("internship", student.internships.iter().map(|i| i.id.as_str()))?;
    unique_ids("research", student.research.iter().map(|r| r.id.as_str()))?;
    Ok(())
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), String> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(format!("duplicate {kind} id {id}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "id": "S1", "name": "Asha Verma", "course": "B.Tech", "branch": "CSE",
        "year": 2, "semester": 4, "cgpa": 8.2, "attendance": 91,
        "email": "asha@college.edu", "phone": "1"
    }"#;

    #[test]
    fn seed_roster_is_valid() {
        let students = SeedRoster.load().unwrap();
        assert!(students.len() >= 4);
        assert!(students.iter().any(|s| !s.achievements.is_empty()));
    }

    #[test]
    fn accepts_bare_array_and_wrapped_object() {
        let bare = format!("[{MINIMAL}]");
        let wrapped = format!(r#"{{"students": [{MINIMAL}]}}"#);
        assert_eq!(parse_roster(&bare).unwrap().len(), 1);
        assert_eq!(parse_roster(&wrapped).unwrap().len(), 1);
    }

    #[test]
    fn rejects_out_of_range_cgpa() {
        let raw = format!("[{}]", MINIMAL.replace("8.2", "11.5"));
        let err = parse_roster(&raw).unwrap_err();
        assert!(matches!(err, DataError::Invalid { ref student, .. } if student == "S1"));
    }

    #[test]
    fn rejects_duplicate_student_ids() {
        let raw = format!("[{MINIMAL}, {MINIMAL}]");
        assert!(matches!(
            parse_roster(&raw),
            Err(DataError::DuplicateStudent(id)) if id == "S1"
        ));
    }

    #[test]
    fn rejects_duplicate_achievement_ids_within_student() {
        let raw = format!(
            "[{}]",
            MINIMAL.replace(
                r#""phone": "1""#,
                r#""phone": "1", "achievements": [
                    {"id": "A1", "title": "x", "type": "Technical", "year": 2024, "verified": true},
                    {"id": "A1", "title": "y", "type": "Technical", "year": 2024, "verified": false}
                ]"#
            )
        );
        let err = parse_roster(&raw).unwrap_err();
        assert!(err.to_string().contains("duplicate achievement id A1"));
    }

    #[test]
    fn rejects_ragged_attendance_series() {
        let raw = format!(
            "[{}]",
            MINIMAL.replace(
                r#""phone": "1""#,
                r#""phone": "1", "attendanceData": {"months": ["Jan", "Feb"], "attendance": [90]}"#
            )
        );
        assert!(parse_roster(&raw).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let source = JsonFileRoster::new("/nonexistent/roster.json");
        let err = source.load().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roster.json"));
    }
}
