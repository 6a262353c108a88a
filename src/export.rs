use std::path::PathBuf;

use thiserror::Error;

use crate::filter::RecruitmentMode;
use crate::models::StudentRecord;

pub const BRANCH_REPORT_NAME: &str = "NAAC_Student_Report.csv";

const HEADER: [&str; 9] = [
    "Student ID",
    "Name",
    "Course",
    "CGPA",
    "Attendance %",
    "Total Achievements",
    "Verified Achievements",
    "Internships",
    "Research Papers",
];
const SKILLS_HEADER: &str = "Skills";
const SKILL_SEPARATOR: &str = "; ";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to encode report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("nothing to export: {0}")]
    NothingToExport(String),
}

/// One row per student with a fixed header row. Skill-mode reports add the
/// student's skills as a final column.
pub fn to_csv<'a, I>(students: I, mode: RecruitmentMode) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = &'a StudentRecord>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header: Vec<&str> = HEADER.to_vec();
    if mode == RecruitmentMode::Skill {
        header.push(SKILLS_HEADER);
    }
    writer.write_record(&header)?;

    let mut rows = 0usize;
    for student in students {
        let mut record = vec![
            student.id.clone(),
            student.name.clone(),
            student.course.clone(),
            student.cgpa.to_string(),
            student.attendance.to_string(),
            student.achievements.len().to_string(),
            student.verified_count().to_string(),
            student.internships.len().to_string(),
            student.research.len().to_string(),
        ];
        if mode == RecruitmentMode::Skill {
            record.push(student.skills.join(SKILL_SEPARATOR));
        }
        writer.write_record(&record)?;
        rows += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    tracing::debug!(rows, ?mode, "encoded csv report");
    Ok(bytes)
}

pub fn report_file_name(mode: RecruitmentMode, skills: &[String]) -> String {
    match mode {
        RecruitmentMode::Branch => BRANCH_REPORT_NAME.to_string(),
        RecruitmentMode::Skill => {
            let label = if skills.is_empty() {
                "All".to_string()
            } else {
                skills.join("_").replace(['/', '\\'], "-")
            };
            format!("Skill_Based_Report_{label}.csv")
        }
    }
}
