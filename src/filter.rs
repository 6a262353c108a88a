use std::collections::{BTreeSet, HashMap};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::models::{Achievement, AchievementCategory, StudentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecruitmentMode {
    #[default]
    Branch,
    Skill,
}

/// Branch-wise constraints. `None` means "all" / unset; every set
/// constraint must hold, bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchFilter {
    pub branch: Option<String>,
    pub year: Option<u8>,
    pub min_cgpa: Option<f64>,
    pub max_cgpa: Option<f64>,
    pub min_attendance: Option<u8>,
}

impl BranchFilter {
    pub fn matches(&self, student: &StudentRecord) -> bool {
        if let Some(branch) = &self.branch {
            if &student.branch != branch {
                return false;
            }
        }
        if let Some(year) = self.year {
            if student.year != year {
                return false;
            }
        }
        if let Some(min) = self.min_cgpa {
            if student.cgpa < min {
                return false;
            }
        }
        if let Some(max) = self.max_cgpa {
            if student.cgpa > max {
                return false;
            }
        }
        if let Some(min) = self.min_attendance {
            if student.attendance < min {
                return false;
            }
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.branch.is_some()
            || self.year.is_some()
            || self.min_cgpa.is_some()
            || self.max_cgpa.is_some()
            || self.min_attendance.is_some()
    }
}

/// Required skills. A student matches when every required skill is a
/// case-insensitive substring of at least one of the student's skills.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillFilter {
    pub skills: Vec<String>,
}

impl SkillFilter {
    pub fn new<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, student: &StudentRecord) -> bool {
        self.skills.iter().all(|required| {
            let required = required.to_lowercase();
            student
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(&required))
        })
    }

    /// Adds the skill if absent, removes it otherwise.
    pub fn toggle(&mut self, skill: &str) {
        if let Some(position) = self.skills.iter().position(|s| s == skill) {
            self.skills.remove(position);
        } else {
            self.skills.push(skill.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    Branch(BranchFilter),
    Skill(SkillFilter),
}

impl Default for FilterSpec {
    fn default() -> Self {
        FilterSpec::Branch(BranchFilter::default())
    }
}

impl FilterSpec {
    pub fn cleared(mode: RecruitmentMode) -> Self {
        match mode {
            RecruitmentMode::Branch => FilterSpec::Branch(BranchFilter::default()),
            RecruitmentMode::Skill => FilterSpec::Skill(SkillFilter::default()),
        }
    }

    pub fn mode(&self) -> RecruitmentMode {
        match self {
            FilterSpec::Branch(_) => RecruitmentMode::Branch,
            FilterSpec::Skill(_) => RecruitmentMode::Skill,
        }
    }

    pub fn matches(&self, student: &StudentRecord) -> bool {
        match self {
            FilterSpec::Branch(filter) => filter.matches(student),
            FilterSpec::Skill(filter) => filter.matches(student),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            FilterSpec::Branch(filter) => filter.is_active(),
            FilterSpec::Skill(filter) => !filter.skills.is_empty(),
        }
    }

    pub fn selected_skills(&self) -> &[String] {
        match self {
            FilterSpec::Skill(filter) => &filter.skills,
            FilterSpec::Branch(_) => &[],
        }
    }
}

/// Matching students in roster order.
pub fn apply<'a>(roster: &'a [StudentRecord], spec: &FilterSpec) -> Vec<&'a StudentRecord> {
    let matched: Vec<&StudentRecord> = roster.iter().filter(|s| spec.matches(s)).collect();
    tracing::debug!(
        mode = ?spec.mode(),
        total = roster.len(),
        matched = matched.len(),
        "applied roster filter"
    );
    matched
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterStats {
    pub count: usize,
    /// Rounded to two decimals; 0.0 for an empty subset.
    pub avg_cgpa: f64,
    /// Rounded to the nearest integer; 0 for an empty subset.
    pub avg_attendance: u32,
    pub total_achievements: usize,
    pub verified_achievements: usize,
}

impl RosterStats {
    pub fn compute<'a, I>(students: I) -> Self
    where
        I: IntoIterator<Item = &'a StudentRecord>,
    {
        let mut count = 0usize;
        let mut cgpa_total = 0.0f64;
        let mut attendance_total = 0u64;
        let mut total_achievements = 0usize;
        let mut verified_achievements = 0usize;

        for student in students {
            count += 1;
            cgpa_total += student.cgpa;
            attendance_total += u64::from(student.attendance);
            total_achievements += student.achievements.len();
            verified_achievements += student.verified_count();
        }

        let (avg_cgpa, avg_attendance) = if count == 0 {
            (0.0, 0)
        } else {
            let cgpa = cgpa_total / count as f64;
            let attendance = attendance_total as f64 / count as f64;
            ((cgpa * 100.0).round() / 100.0, attendance.round() as u32)
        };

        RosterStats {
            count,
            avg_cgpa,
            avg_attendance,
            total_achievements,
            verified_achievements,
        }
    }

    pub fn pending_achievements(&self) -> usize {
        self.total_achievements - self.verified_achievements
    }

    pub fn avg_cgpa_label(&self) -> String {
        format!("{:.2}", self.avg_cgpa)
    }
}

pub fn branches(roster: &[StudentRecord]) -> Vec<String> {
    roster
        .iter()
        .map(|s| s.branch.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn years(roster: &[StudentRecord]) -> Vec<u8> {
    roster
        .iter()
        .map(|s| s.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn skills(roster: &[StudentRecord]) -> Vec<String> {
    roster
        .iter()
        .flat_map(|s| s.skills.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn search_skills<'a>(skills: &'a [String], query: &str) -> Vec<&'a str> {
    let query = query.to_lowercase();
    skills
        .iter()
        .filter(|skill| skill.to_lowercase().contains(&query))
        .map(String::as_str)
        .collect()
}

/// Achievements narrowed by category; recruiters only see verified entries.
pub fn visible_achievements(
    achievements: &[Achievement],
    category: Option<AchievementCategory>,
    verified_only: bool,
) -> Vec<&Achievement> {
    achievements
        .iter()
        .filter(|a| !verified_only || a.verified)
        .filter(|a| category.map_or(true, |c| a.category == c))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: AchievementCategory,
    pub count: usize,
    pub verified: usize,
}

pub fn summarize_by_category<'a, I>(students: I) -> Vec<CategorySummary>
where
    I: IntoIterator<Item = &'a StudentRecord>,
{
    let mut map: HashMap<AchievementCategory, (usize, usize)> = HashMap::new();

    for student in students {
        for achievement in &student.achievements {
            let entry = map.entry(achievement.category).or_insert((0, 0));
            entry.0 += 1;
            if achievement.verified {
                entry.1 += 1;
            }
        }
    }

    let mut summaries: Vec<CategorySummary> = map
        .into_iter()
        .map(|(category, (count, verified))| CategorySummary {
            category,
            count,
            verified,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
    summaries
}
