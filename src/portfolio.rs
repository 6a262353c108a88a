use crate::layout::{Document, PageCursor, Rgb, PAGE_HEIGHT};
use crate::models::StudentRecord;

const TITLE: Rgb = Rgb(37, 99, 235);
const SECTION: Rgb = Rgb(75, 85, 99);
const META: Rgb = Rgb(100, 116, 139);
const FOOTER: Rgb = Rgb(150, 150, 150);

const TITLE_SIZE: f64 = 24.0;
const NAME_SIZE: f64 = 16.0;
const SECTION_SIZE: f64 = 14.0;
const ITEM_SIZE: f64 = 11.0;
const BODY_SIZE: f64 = 10.0;
const FOOTER_SIZE: f64 = 8.0;

/// Room a section header needs below it before it may start a page.
const HEADER_RESERVE: f64 = 20.0;
const SKILL_LINE: f64 = 6.0;
const DESCRIPTION_LINE: f64 = 5.0;

/// One enumerated entry: title line, metadata line, optional wrapped body.
struct Entry {
    title: String,
    meta: String,
    body: Option<String>,
}

pub fn render_portfolio(student: &StudentRecord) -> Document {
    let mut cursor = PageCursor::new();

    cursor.text(TITLE_SIZE, TITLE, "Student Portfolio");
    cursor.advance(15.0);
    cursor.text(
        NAME_SIZE,
        Rgb::BLACK,
        format!("{} - {}", student.name, student.course),
    );

    cursor.advance(20.0);
    cursor.text(SECTION_SIZE, SECTION, "Personal Information");
    cursor.advance(10.0);
    let personal = [
        format!("Email: {}", student.email),
        format!("Phone: {}", student.phone),
        format!("Semester: {}", student.semester),
        format!("CGPA: {}", student.cgpa),
        format!("Attendance: {}%", student.attendance),
    ];
    for (index, line) in personal.into_iter().enumerate() {
        if index > 0 {
            cursor.advance(6.0);
        }
        cursor.text(BODY_SIZE, Rgb::BLACK, line);
    }

    cursor.advance(15.0);
    cursor.text(SECTION_SIZE, SECTION, "Skills");
    cursor.advance(10.0);
    let lines = cursor.wrapped(BODY_SIZE, Rgb::BLACK, &student.skills.join(", "), SKILL_LINE);
    cursor.advance(lines as f64 * SKILL_LINE);

    cursor.advance(10.0);
    cursor.text(SECTION_SIZE, SECTION, "Achievements");
    let achievements = student.achievements.iter().map(|a| Entry {
        title: a.title.clone(),
        meta: format!(
            "   Type: {} | Year: {} | Status: {}",
            a.category,
            a.year,
            if a.verified { "Verified" } else { "Pending" }
        ),
        body: a.description.clone().filter(|d| !d.trim().is_empty()),
    });
    entries(&mut cursor, achievements);

    if !student.internships.is_empty() {
        section(&mut cursor, "Internships");
        let internships = student.internships.iter().map(|i| Entry {
            title: format!("{} at {}", i.role, i.company),
            meta: format!("   Duration: {} | Year: {}", i.duration, i.year),
            body: Some(i.description.clone()).filter(|d| !d.trim().is_empty()),
        });
        entries(&mut cursor, internships);
    }

    if !student.research.is_empty() {
        section(&mut cursor, "Research Publications");
        let research = student.research.iter().map(|r| Entry {
            title: r.title.clone(),
            meta: format!(
                "   Conference: {} | Year: {} | Status: {}",
                r.conference, r.year, r.status
            ),
            body: (!r.co_authors.is_empty())
                .then(|| format!("Co-authors: {}", r.co_authors.join(", "))),
        });
        entries(&mut cursor, research);
    }

    let mut document = cursor.finish();
    document.stamp_pages(PAGE_HEIGHT - 10.0, FOOTER_SIZE, FOOTER, |page, total| {
        format!("Generated by Smart Student Hub - Page {page} of {total}")
    });
    tracing::debug!(
        student = %student.id,
        pages = document.pages.len(),
        "laid out portfolio"
    );
    document
}

fn section(cursor: &mut PageCursor, title: &str) {
    cursor.advance(15.0);
    cursor.ensure_space(HEADER_RESERVE);
    cursor.text(SECTION_SIZE, SECTION, title);
}

fn entries(cursor: &mut PageCursor, entries: impl Iterator<Item = Entry>) {
    for (index, entry) in entries.enumerate() {
        cursor.advance(10.0);
        cursor.ensure_space(0.0);
        cursor.text(ITEM_SIZE, Rgb::BLACK, format!("{}. {}", index + 1, entry.title));

        cursor.advance(6.0);
        cursor.text(BODY_SIZE, META, entry.meta);

        if let Some(body) = entry.body {
            cursor.advance(6.0);
            let lines = cursor.wrapped(BODY_SIZE, META, &format!("   {body}"), DESCRIPTION_LINE);
            cursor.advance(lines as f64 * DESCRIPTION_LINE);
        }
    }
}

/// Download name for a student's portfolio.
pub fn portfolio_file_name(student: &StudentRecord) -> String {
    let name: String = student
        .name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{name}_Portfolio.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{achievement, student};
    use crate::layout::{BOTTOM_LIMIT, TOP};
    use crate::models::{AchievementCategory, Internship, Research};

    fn sample() -> StudentRecord {
        let mut s = student("S1", "CSE", 2, 8.2, 91);
        s.name = "Asha Verma".to_string();
        s.skills = vec!["Python".into(), "SQL".into()];
        s.achievements = vec![achievement("A1", AchievementCategory::Technical, true)];
        s
    }

    fn texts(document: &Document) -> Vec<&str> {
        document.text().collect()
    }

    #[test]
    fn short_portfolio_fits_one_page() {
        let document = render_portfolio(&sample());
        assert_eq!(document.pages.len(), 1);
        let text = texts(&document);
        assert_eq!(text[0], "Student Portfolio");
        assert_eq!(text[1], "Asha Verma - B.Tech");
        assert!(text.contains(&"CGPA: 8.2"));
        assert!(text.contains(&"Attendance: 91%"));
        assert!(text.contains(&"Python, SQL"));
        assert!(text.contains(&"1. Achievement A1"));
        assert!(text.contains(&"   Type: Technical | Year: 2024 | Status: Verified"));
        assert_eq!(
            text.last().copied(),
            Some("Generated by Smart Student Hub - Page 1 of 1")
        );
    }

    #[test]
    fn empty_internships_and_research_are_omitted() {
        let text = render_portfolio(&sample())
            .text()
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert!(!text.iter().any(|t| t == "Internships"));
        assert!(!text.iter().any(|t| t == "Research Publications"));
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let mut s = sample();
        s.internships = vec![Internship {
            id: "I1".into(),
            company: "Infosys".into(),
            role: "Intern".into(),
            duration: "2 months".into(),
            year: 2024,
            description: String::new(),
        }];
        s.research = vec![Research {
            id: "R1".into(),
            title: "Sparse Graphs".into(),
            conference: "ICML".into(),
            year: 2024,
            status: "Published".into(),
            co_authors: vec!["K. Rao".into(), "M. Iyer".into()],
        }];
        let document = render_portfolio(&s);
        let text = texts(&document);
        let position = |needle: &str| text.iter().position(|t| *t == needle).unwrap();

        assert!(position("Personal Information") < position("Skills"));
        assert!(position("Skills") < position("Achievements"));
        assert!(position("Achievements") < position("Internships"));
        assert!(position("Internships") < position("Research Publications"));
        assert!(text.contains(&"1. Intern at Infosys"));
        assert!(text.contains(&"   Co-authors: K. Rao, M. Iyer"));
    }

    #[test]
    fn long_portfolio_paginates_with_footer_on_every_page() {
        let mut s = sample();
        s.achievements = (0..40)
            .map(|i| {
                let mut a = achievement(&format!("A{i}"), AchievementCategory::Educational, i % 2 == 0);
                a.description = Some("Completed a semester long course with a capstone project.".into());
                a
            })
            .collect();
        let document = render_portfolio(&s);
        let total = document.pages.len();
        assert!(total > 2);

        for (index, page) in document.pages.iter().enumerate() {
            let footer = format!("Generated by Smart Student Hub - Page {} of {}", index + 1, total);
            assert!(page.runs.iter().any(|run| run.text == footer));
            for run in &page.runs {
                assert!(run.y <= PAGE_HEIGHT, "{run:?} falls off the page");
            }
        }

        // every enumerated item starts between the top margin and the limit
        for page in &document.pages {
            for run in page.runs.iter().filter(|r| r.size == ITEM_SIZE) {
                assert!(run.y >= TOP && run.y <= BOTTOM_LIMIT);
            }
        }
        assert_eq!(document.pages[1].runs[0].y, TOP);
    }

    #[test]
    fn file_name_derives_from_student_name() {
        let mut s = sample();
        assert_eq!(portfolio_file_name(&s), "Asha Verma_Portfolio.pdf");
        s.name = "A/B".into();
        assert_eq!(portfolio_file_name(&s), "A_B_Portfolio.pdf");
    }
}
