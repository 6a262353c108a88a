use std::fmt::Write;

use crate::filter::{self, FilterSpec, RecruitmentMode};
use crate::models::{AchievementCategory, RecruitmentStatus, StudentRecord};
use crate::view::RosterView;

pub fn student_dashboard(
    student: Option<&StudentRecord>,
    category: Option<AchievementCategory>,
) -> String {
    let mut output = String::new();
    let Some(student) = student else {
        let _ = writeln!(output, "Loading dashboard...");
        return output;
    };

    let _ = writeln!(output, "# Welcome back, {}!", student.first_name());
    let _ = writeln!(
        output,
        "{} | {} | Year {} | {}",
        student.id, student.course, student.year, student.branch
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Current CGPA: {}/10.0", student.cgpa);
    let _ = writeln!(output, "Attendance: {}%", student.attendance);
    let _ = writeln!(
        output,
        "Achievements: {} ({} verified, {} pending)",
        student.achievements.len(),
        student.verified_count(),
        student.pending_count()
    );
    let _ = writeln!(output, "Semester: {} of {}", student.semester, student.course);
    if student.backlogs > 0 {
        let _ = writeln!(output, "Backlogs: {}", student.backlogs);
    }

    write_achievements(&mut output, student, category, false);

    if !student.internships.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Internships ({} total)", student.internships.len());
        for internship in &student.internships {
            let _ = writeln!(
                output,
                "- {} at {} ({}, {})",
                internship.role, internship.company, internship.duration, internship.year
            );
            if !internship.description.is_empty() {
                let _ = writeln!(output, "  {}", internship.description);
            }
        }
    }

    if !student.research.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Research ({} total)", student.research.len());
        for paper in &student.research {
            let _ = writeln!(
                output,
                "- {} ({}, {}) [{}]",
                paper.title, paper.conference, paper.year, paper.status
            );
            if !paper.co_authors.is_empty() {
                let _ = writeln!(output, "  Co-authors: {}", paper.co_authors.join(", "));
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Skills");
    if student.skills.is_empty() {
        let _ = writeln!(output, "No skills listed.");
    } else {
        let _ = writeln!(output, "{}", student.skills.join(", "));
    }

    let series = &student.attendance_data;
    if let Some(mean) = series.mean() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Attendance Trend");
        for (month, value) in series.points() {
            let _ = writeln!(output, "{month:>4} {value:>3}% {}", "#".repeat(usize::from(value / 5)));
        }
        let change = series.change().unwrap_or(0);
        let since = series.months.first().map_or("start", String::as_str);
        let _ = writeln!(output, "Average {mean:.1}%, {change:+} points since {since}");
    }

    output
}

pub fn admin_dashboard(view: &RosterView) -> String {
    let mut output = String::new();
    if view.roster().is_empty() {
        let _ = writeln!(output, "Loading admin panel...");
        return output;
    }

    let _ = writeln!(output, "# Admin Dashboard");
    write_stats(&mut output, view);

    let summaries = filter::summarize_by_category(view.filtered());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Achievement Mix");
    if summaries.is_empty() {
        let _ = writeln!(output, "No achievements recorded.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- {}: {} achievements ({} verified)",
                summary.category, summary.count, summary.verified
            );
        }
    }

    write_roster(&mut output, view, false);
    if let Some(student) = view.selected() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Selected: {} ({})", student.name, student.id);
        write_achievements(&mut output, student, None, false);
    }
    output
}

pub fn recruiter_dashboard(view: &RosterView) -> String {
    let mut output = String::new();
    if view.roster().is_empty() {
        let _ = writeln!(output, "Loading recruiter panel...");
        return output;
    }

    let spec = view.spec();
    let title = match spec.mode() {
        RecruitmentMode::Branch => "Branch-wise",
        RecruitmentMode::Skill => "Skill-based",
    };
    let _ = writeln!(output, "# {title} Recruitment Dashboard");
    let _ = writeln!(output, "{}", filter_summary(spec));
    write_stats(&mut output, view);
    write_roster(&mut output, view, true);

    if let Some(student) = view.selected() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "## Selected: {} ({}) [{}]",
            student.name, student.id, student.status
        );
        let _ = writeln!(
            output,
            "{} | CGPA {} | Attendance {}% | Skills: {}",
            student.branch,
            student.cgpa,
            student.attendance,
            student.skills.join(", ")
        );
        write_achievements(&mut output, student, None, true);
    }
    output
}

fn filter_summary(spec: &FilterSpec) -> String {
    match spec {
        FilterSpec::Skill(filter) if filter.skills.is_empty() => {
            "Filter students by technical skills".to_string()
        }
        FilterSpec::Skill(filter) => format!(
            "Filter students by technical skills - {} skills selected: {}",
            filter.skills.len(),
            filter.skills.join(", ")
        ),
        FilterSpec::Branch(_) if spec.is_active() => {
            "Filter students by branch, CGPA, and year - Filters active".to_string()
        }
        FilterSpec::Branch(_) => "Filter students by branch, CGPA, and year".to_string(),
    }
}

fn write_stats(output: &mut String, view: &RosterView) {
    let stats = view.stats();
    let _ = writeln!(output);
    let _ = writeln!(output, "Total Students: {} of {}", stats.count, view.roster().len());
    let _ = writeln!(output, "Average CGPA: {}", stats.avg_cgpa_label());
    let _ = writeln!(output, "Average Attendance: {}%", stats.avg_attendance);
    let _ = writeln!(
        output,
        "Achievements: {} total, {} verified, {} pending",
        stats.total_achievements,
        stats.verified_achievements,
        stats.pending_achievements()
    );
}

fn write_roster(output: &mut String, view: &RosterView, show_status: bool) {
    let selected = view.selected().map(|student| student.id.as_str());
    let students = view.filtered();

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");
    if students.is_empty() {
        let _ = writeln!(output, "No students match the current filters.");
        return;
    }
    for student in students {
        let marker = if Some(student.id.as_str()) == selected { ">" } else { " " };
        let _ = write!(
            output,
            "{marker} {:<8} {:<20} {:<4} Y{} CGPA {:>4} Att {:>3}% Ach {}/{}",
            student.id,
            student.name,
            student.branch,
            student.year,
            student.cgpa,
            student.attendance,
            student.verified_count(),
            student.achievements.len()
        );
        if show_status && student.status == RecruitmentStatus::Disqualified {
            let _ = write!(output, " [Disqualified]");
        }
        let _ = writeln!(output);
    }
}

fn write_achievements(
    output: &mut String,
    student: &StudentRecord,
    category: Option<AchievementCategory>,
    verified_only: bool,
) {
    let achievements = filter::visible_achievements(&student.achievements, category, verified_only);
    let _ = writeln!(output);
    match category {
        Some(category) => {
            let _ = writeln!(output, "## Achievements ({category})");
        }
        None if verified_only => {
            let _ = writeln!(output, "## Verified Achievements");
        }
        None => {
            let _ = writeln!(output, "## Achievements");
        }
    }

    if achievements.is_empty() {
        let _ = writeln!(output, "No achievements to show.");
        return;
    }
    for achievement in achievements {
        let status = if achievement.verified { "Verified" } else { "Pending" };
        let _ = write!(
            output,
            "- [{}] {} ({}, {}) {status}",
            achievement.id, achievement.title, achievement.category, achievement.year
        );
        if let Some(tag) = &achievement.tag {
            let _ = write!(output, " #{tag}");
        }
        let _ = writeln!(output);
        if let Some(description) = &achievement.description {
            let _ = writeln!(output, "  {description}");
        }
    }
}
