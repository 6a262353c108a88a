use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecruitmentStatus {
    #[default]
    Active,
    Disqualified,
}

impl fmt::Display for RecruitmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecruitmentStatus::Active => f.write_str("Active"),
            RecruitmentStatus::Disqualified => f.write_str("Disqualified"),
        }
    }
}

/// Canonical achievement taxonomy. Finer-grained labels such as
/// "competition" or "certification" live in [`Achievement::tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AchievementCategory {
    Educational,
    Technical,
    #[serde(rename = "Co-curricular")]
    CoCurricular,
}

impl AchievementCategory {
    pub const ALL: [AchievementCategory; 3] = [
        AchievementCategory::Educational,
        AchievementCategory::Technical,
        AchievementCategory::CoCurricular,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AchievementCategory::Educational => "Educational",
            AchievementCategory::Technical => "Technical",
            AchievementCategory::CoCurricular => "Co-curricular",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub category: AchievementCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub year: u16,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Internship {
    pub id: String,
    pub company: String,
    pub role: String,
    pub duration: String,
    pub year: u16,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Research {
    pub id: String,
    pub title: String,
    pub conference: String,
    pub year: u16,
    pub status: String,
    #[serde(default)]
    pub co_authors: Vec<String>,
}

/// Monthly attendance trend. Kept alongside the headline
/// [`StudentRecord::attendance`] value; the two are not derived from each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSeries {
    pub months: Vec<String>,
    pub attendance: Vec<u8>,
}

impl AttendanceSeries {
    pub fn points(&self) -> impl Iterator<Item = (&str, u8)> {
        self.months
            .iter()
            .map(String::as_str)
            .zip(self.attendance.iter().copied())
    }

    pub fn mean(&self) -> Option<f64> {
        if self.attendance.is_empty() {
            return None;
        }
        let total: u32 = self.attendance.iter().map(|value| u32::from(*value)).sum();
        Some(total as f64 / self.attendance.len() as f64)
    }

    /// Percentage-point change from the first to the last month.
    pub fn change(&self) -> Option<i16> {
        let first = *self.attendance.first()?;
        let last = *self.attendance.last()?;
        Some(i16::from(last) - i16::from(first))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub course: String,
    pub branch: String,
    pub year: u8,
    pub semester: u8,
    pub cgpa: f64,
    pub attendance: u8,
    #[serde(default)]
    pub backlogs: u32,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub status: RecruitmentStatus,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub internships: Vec<Internship>,
    #[serde(default)]
    pub research: Vec<Research>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub attendance_data: AttendanceSeries,
}

impl StudentRecord {
    pub fn verified_count(&self) -> usize {
        self.achievements
            .iter()
            .filter(|achievement| achievement.verified)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.achievements.len() - self.verified_count()
    }

    pub fn achievement(&self, achievement_id: &str) -> Option<&Achievement> {
        self.achievements
            .iter()
            .find(|achievement| achievement.id == achievement_id)
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_record() {
        let raw = r#"{
            "id": "S1",
            "name": "Asha Verma",
            "course": "B.Tech",
            "branch": "CSE",
            "year": 2,
            "semester": 4,
            "cgpa": 8.2,
            "attendance": 91,
            "email": "asha@college.edu",
            "phone": "+91 90000 00001",
            "status": "disqualified",
            "achievements": [
                {"id": "A1", "title": "Hackathon", "type": "Co-curricular", "tag": "competition", "year": 2024, "verified": false}
            ],
            "research": [
                {"id": "R1", "title": "Graph Sparsifiers", "conference": "ICML", "year": 2024, "status": "Published", "coAuthors": ["K. Rao"]}
            ],
            "skills": ["Python", "SQL"],
            "attendanceData": {"months": ["Jan", "Feb"], "attendance": [88, 94]}
        }"#;

        let student: StudentRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(student.status, RecruitmentStatus::Disqualified);
        assert_eq!(
            student.achievements[0].category,
            AchievementCategory::CoCurricular
        );
        assert_eq!(student.achievements[0].tag.as_deref(), Some("competition"));
        assert_eq!(student.research[0].co_authors, vec!["K. Rao".to_string()]);
        assert_eq!(student.backlogs, 0);
        assert!(student.internships.is_empty());
        assert_eq!(student.attendance_data.change(), Some(6));
    }

    #[test]
    fn category_parse_ignores_case() {
        assert_eq!(
            AchievementCategory::parse("co-curricular"),
            Some(AchievementCategory::CoCurricular)
        );
        assert_eq!(
            AchievementCategory::parse("TECHNICAL"),
            Some(AchievementCategory::Technical)
        );
        assert_eq!(AchievementCategory::parse("competition"), None);
    }

    #[test]
    fn attendance_mean_of_empty_series_is_none() {
        let series = AttendanceSeries::default();
        assert_eq!(series.mean(), None);
        assert_eq!(series.change(), None);

        let series = AttendanceSeries {
            months: vec!["Jan".into(), "Feb".into()],
            attendance: vec![80, 90],
        };
        assert_eq!(series.mean(), Some(85.0));
    }
}
