use crate::filter::{self, FilterSpec, RosterStats};
use crate::models::{RecruitmentStatus, StudentRecord};

/// Session-local copy of the roster plus the current filter and the
/// selected "detail" record. The filtered subset is kept as indices into
/// the roster, so mutations are visible in both without copying.
#[derive(Debug, Clone)]
pub struct RosterView {
    roster: Vec<StudentRecord>,
    spec: FilterSpec,
    filtered: Vec<usize>,
    selected: Option<String>,
}

impl RosterView {
    pub fn new(roster: Vec<StudentRecord>, spec: FilterSpec) -> Self {
        let selected = roster.first().map(|student| student.id.clone());
        let mut view = RosterView {
            roster,
            spec,
            filtered: Vec::new(),
            selected,
        };
        view.refresh();
        view
    }

    pub fn roster(&self) -> &[StudentRecord] {
        &self.roster
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn filtered(&self) -> Vec<&StudentRecord> {
        self.filtered.iter().map(|&index| &self.roster[index]).collect()
    }

    pub fn stats(&self) -> RosterStats {
        RosterStats::compute(self.filtered.iter().map(|&index| &self.roster[index]))
    }

    pub fn selected(&self) -> Option<&StudentRecord> {
        let id = self.selected.as_deref()?;
        self.student(id)
    }

    pub fn student(&self, student_id: &str) -> Option<&StudentRecord> {
        self.roster.iter().find(|student| student.id == student_id)
    }

    pub fn set_filter(&mut self, spec: FilterSpec) {
        self.spec = spec;
        self.refresh();
    }

    /// Selects a record from the visible subset. Unknown or hidden ids
    /// leave the selection unchanged.
    pub fn select(&mut self, student_id: &str) -> bool {
        let visible = self
            .filtered
            .iter()
            .any(|&index| self.roster[index].id == student_id);
        if visible {
            self.selected = Some(student_id.to_string());
        } else {
            tracing::debug!(student_id, "selection target not in filtered subset");
        }
        visible
    }

    /// Sets the verified flag of one achievement on the selected record.
    pub fn set_verified(&mut self, achievement_id: &str, verified: bool) -> bool {
        match self.selected.clone() {
            Some(student_id) => self.set_verified_for(&student_id, achievement_id, verified),
            None => false,
        }
    }

    /// Flips the flag and returns the new value, or `None` when nothing matched.
    pub fn toggle_verified(&mut self, achievement_id: &str) -> Option<bool> {
        let current = self.selected()?.achievement(achievement_id)?.verified;
        self.set_verified(achievement_id, !current).then_some(!current)
    }

    pub fn set_verified_for(
        &mut self,
        student_id: &str,
        achievement_id: &str,
        verified: bool,
    ) -> bool {
        let Some(student) = self.roster.iter_mut().find(|s| s.id == student_id) else {
            tracing::debug!(student_id, "verification target student not found");
            return false;
        };
        let Some(achievement) = student
            .achievements
            .iter_mut()
            .find(|a| a.id == achievement_id)
        else {
            tracing::debug!(student_id, achievement_id, "achievement not found");
            return false;
        };

        achievement.verified = verified;
        self.refresh();
        true
    }

    pub fn set_status(&mut self, student_id: &str, status: RecruitmentStatus) -> bool {
        let Some(student) = self.roster.iter_mut().find(|s| s.id == student_id) else {
            tracing::debug!(student_id, "status target student not found");
            return false;
        };
        student.status = status;
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        self.filtered = self
            .roster
            .iter()
            .enumerate()
            .filter(|(_, student)| self.spec.matches(student))
            .map(|(index, _)| index)
            .collect();

        let selected_visible = self.selected.as_deref().is_some_and(|id| {
            self.filtered
                .iter()
                .any(|&index| self.roster[index].id == id)
        });
        if !selected_visible {
            if let Some(&first) = self.filtered.first() {
                self.selected = Some(self.roster[first].id.clone());
            }
        }
        tracing::debug!(
            total = self.roster.len(),
            visible = self.filtered.len(),
            selected = ?self.selected,
            "refreshed roster view"
        );
    }

    pub fn facets(&self) -> Facets {
        Facets {
            branches: filter::branches(&self.roster),
            years: filter::years(&self.roster),
            skills: filter::skills(&self.roster),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Facets {
    pub branches: Vec<String>,
    pub years: Vec<u8>,
    pub skills: Vec<String>,
}
