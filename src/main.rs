use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod artifact;
mod config;
mod export;
mod filter;
mod layout;
mod models;
mod pdf;
mod portfolio;
mod report;
mod roster;
mod session;
mod view;

use artifact::{Artifact, ExportKind, Notice, NoticeKind};
use config::Config;
use export::ExportError;
use filter::{BranchFilter, FilterSpec, RecruitmentMode, SkillFilter};
use models::{AchievementCategory, RecruitmentStatus};
use session::{LoginRequest, Mutation, Role, Session};
use view::RosterView;

#[derive(Parser)]
#[command(name = "student-hub")]
#[command(about = "Student records hub for students, administrators and recruiters", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session; any credentials are accepted
    Login {
        #[arg(value_enum)]
        role: Role,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// Recruitment mode, recruiters only
        #[arg(long, value_enum, default_value_t)]
        mode: RecruitmentMode,
    },
    /// Switch the recruiter between branch-wise and skill-based hiring
    Mode {
        #[arg(value_enum)]
        mode: RecruitmentMode,
    },
    /// End the session and discard its changes
    Logout,
    /// Show the current session
    Whoami,
    /// Show the dashboard for the logged-in role
    #[command(visible_alias = "roster")]
    Dashboard {
        /// Only show achievements of this category (student dashboard)
        #[arg(long, value_parser = parse_category)]
        category: Option<AchievementCategory>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Student to show in the detail panel
        #[arg(long)]
        select: Option<String>,
    },
    /// List branches, years and skills present in the roster
    Skills {
        #[arg(long)]
        search: Option<String>,
    },
    /// Mark an achievement as verified
    Verify {
        student_id: String,
        achievement_id: String,
        /// Mark as pending instead
        #[arg(long, conflicts_with = "toggle")]
        pending: bool,
        /// Flip the current state
        #[arg(long)]
        toggle: bool,
    },
    /// Disqualify or requalify a student for recruitment
    Status {
        student_id: String,
        #[arg(value_enum)]
        status: RecruitmentStatus,
    },
    /// Export a CSV report or a PDF portfolio
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },
}

#[derive(Subcommand)]
enum ExportTarget {
    /// Roster report; recruiters in skill mode export the matching students
    Csv {
        /// Required skill; repeat to require several, repeat a skill to drop it
        #[arg(long = "skill")]
        skills: Vec<String>,
    },
    /// PDF portfolio of one student
    Portfolio {
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Branch, or "all"
    #[arg(long)]
    branch: Option<String>,
    /// Year of study, or "all"
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    min_cgpa: Option<f64>,
    #[arg(long)]
    max_cgpa: Option<f64>,
    #[arg(long)]
    min_attendance: Option<u8>,
    /// Required skill; repeat to require several, repeat a skill to drop it
    #[arg(long = "skill")]
    skills: Vec<String>,
}

impl FilterArgs {
    fn has_branch_constraints(&self) -> bool {
        self.branch.is_some()
            || self.year.is_some()
            || self.min_cgpa.is_some()
            || self.max_cgpa.is_some()
            || self.min_attendance.is_some()
    }

    fn to_spec(&self, mode: RecruitmentMode) -> anyhow::Result<FilterSpec> {
        match mode {
            RecruitmentMode::Branch => {
                if !self.skills.is_empty() {
                    bail!("--skill needs skill mode; run `student-hub mode skill` first");
                }
                let year = unless_all(&self.year)
                    .map(|year| {
                        year.parse::<u8>()
                            .with_context(|| format!("invalid --year {year}"))
                    })
                    .transpose()?;
                Ok(FilterSpec::Branch(BranchFilter {
                    branch: unless_all(&self.branch).map(str::to_string),
                    year,
                    min_cgpa: self.min_cgpa,
                    max_cgpa: self.max_cgpa,
                    min_attendance: self.min_attendance,
                }))
            }
            RecruitmentMode::Skill => {
                if self.has_branch_constraints() {
                    bail!("branch filters need branch mode; run `student-hub mode branch` first");
                }
                Ok(FilterSpec::Skill(skill_filter(&self.skills)))
            }
        }
    }
}

fn unless_all(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|value| !value.eq_ignore_ascii_case("all"))
}

fn skill_filter(skills: &[String]) -> SkillFilter {
    let mut filter = SkillFilter::default();
    for skill in skills {
        filter.toggle(skill);
    }
    filter
}

fn parse_category(value: &str) -> Result<AchievementCategory, String> {
    AchievementCategory::parse(value).ok_or_else(|| {
        let known = AchievementCategory::ALL.map(AchievementCategory::label);
        format!("expected one of: {}", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = cli.config;
    let store = config.session_store();

    match cli.command {
        Commands::Login {
            role,
            id,
            password,
            mode,
        } => {
            let request = LoginRequest {
                user_id: id,
                password,
                mode,
            };
            let session = session::login(role, request).await?;
            store
                .save(&session)
                .context("failed to persist the new session")?;
            tracing::debug!(path = %store.path().display(), "session saved");
            match (&session.user_id, role) {
                (Some(id), _) => println!("Logged in as {role} ({id})."),
                (None, Role::Recruiter) => {
                    println!("Logged in as {role} in {:?} mode.", session.mode)
                }
                (None, _) => println!("Logged in as {role}."),
            }
        }
        Commands::Mode { mode } => {
            let mut session = store.current()?;
            session.require(&[Role::Recruiter])?;
            session.mode = mode;
            store.save(&session)?;
            tracing::info!(?mode, "recruitment mode changed");
            println!("Recruitment mode set to {mode:?}.");
        }
        Commands::Logout => {
            if store.clear()? {
                tracing::info!("session ended");
                println!("Logged out.");
            } else {
                println!("No active session.");
            }
        }
        Commands::Whoami => match store.load()? {
            Some(session) => {
                println!("Role: {}", session.role);
                if let Some(id) = &session.user_id {
                    println!("User: {id}");
                }
                if session.role == Role::Recruiter {
                    println!("Mode: {:?}", session.mode);
                }
                println!("Since: {}", session.logged_in_at.format("%Y-%m-%d %H:%M UTC"));
                println!("Pending changes: {}", session.journal.len());
            }
            None => println!("Not logged in."),
        },
        Commands::Dashboard {
            category,
            filters,
            select,
        } => {
            let session = store.current()?;
            dashboard(&config, &session, category, &filters, select.as_deref())?;
        }
        Commands::Skills { search } => {
            let session = store.current()?;
            session.require(&[Role::Admin, Role::Recruiter])?;
            let view = open_view(&config, &session, FilterSpec::default())?;
            let facets = view.facets();

            let years: Vec<String> = facets.years.iter().map(u8::to_string).collect();
            println!("Branches: {}", facets.branches.join(", "));
            println!("Years: {}", years.join(", "));
            let skills = match &search {
                Some(query) => filter::search_skills(&facets.skills, query),
                None => facets.skills.iter().map(String::as_str).collect(),
            };
            if skills.is_empty() {
                println!("No skills found.");
            } else {
                println!("Skills: {}", skills.join(", "));
            }
        }
        Commands::Verify {
            student_id,
            achievement_id,
            pending,
            toggle,
        } => {
            let mut session = store.current()?;
            session.require(&[Role::Admin, Role::Recruiter])?;
            let mut view = open_view(&config, &session, FilterSpec::cleared(session.mode))?;
            if !view.select(&student_id) {
                return Ok(());
            }

            let updated = if toggle {
                view.toggle_verified(&achievement_id)
            } else {
                let value = !pending;
                view.set_verified(&achievement_id, value).then_some(value)
            };
            let Some(verified) = updated else {
                return Ok(());
            };

            session.record(Mutation::Verify {
                student_id: student_id.clone(),
                achievement_id: achievement_id.clone(),
                verified,
            });
            store.save(&session)?;

            let title = view
                .student(&student_id)
                .and_then(|student| student.achievement(&achievement_id))
                .map_or(achievement_id.as_str(), |achievement| {
                    achievement.title.as_str()
                });
            let state = if verified { "verified" } else { "pending" };
            println!(
                "{}",
                Notice::new(
                    NoticeKind::Success,
                    "Achievement Updated",
                    format!("{title} has been marked as {state}"),
                )
            );
        }
        Commands::Status { student_id, status } => {
            let mut session = store.current()?;
            session.require(&[Role::Recruiter])?;
            let mut view = open_view(&config, &session, FilterSpec::cleared(session.mode))?;
            if !view.set_status(&student_id, status) {
                return Ok(());
            }

            session.record(Mutation::Status {
                student_id: student_id.clone(),
                status,
            });
            store.save(&session)?;

            let name = view
                .student(&student_id)
                .map_or(student_id.as_str(), |student| student.name.as_str());
            let notice = match status {
                RecruitmentStatus::Disqualified => Notice::new(
                    NoticeKind::Success,
                    "Student Disqualified",
                    format!("{name} has been disqualified from recruitment"),
                ),
                RecruitmentStatus::Active => Notice::new(
                    NoticeKind::Success,
                    "Student Qualified",
                    format!("{name} has been qualified for recruitment"),
                ),
            };
            println!("{notice}");
        }
        Commands::Export { target } => {
            let session = store.current()?;
            match target {
                ExportTarget::Csv { skills } => export_csv(&config, &session, &skills).await?,
                ExportTarget::Portfolio { id } => {
                    export_portfolio(&config, &session, id.as_deref()).await?
                }
            }
        }
    }

    Ok(())
}

/// Loads a fresh roster snapshot, replays the session's changes onto it and
/// then applies the filter.
fn open_view(config: &Config, session: &Session, spec: FilterSpec) -> anyhow::Result<RosterView> {
    let roster = config.load_roster().context("failed to load the student roster")?;
    let mut view = RosterView::new(roster, FilterSpec::cleared(spec.mode()));
    session.replay(&mut view);
    view.set_filter(spec);
    Ok(view)
}

fn dashboard(
    config: &Config,
    session: &Session,
    category: Option<AchievementCategory>,
    filters: &FilterArgs,
    select: Option<&str>,
) -> anyhow::Result<()> {
    let output = match session.role {
        Role::Student => {
            if filters.has_branch_constraints() || !filters.skills.is_empty() || select.is_some() {
                bail!("roster filters are only available to admins and recruiters");
            }
            let view = open_view(config, session, FilterSpec::default())?;
            report::student_dashboard(session.resolve_student(view.roster()), category)
        }
        Role::Admin | Role::Recruiter => {
            if category.is_some() {
                bail!("--category applies to the student dashboard");
            }
            let mode = match session.role {
                Role::Recruiter => session.mode,
                _ => RecruitmentMode::Branch,
            };
            let mut view = open_view(config, session, filters.to_spec(mode)?)?;
            if let Some(id) = select {
                view.select(id);
            }
            match session.role {
                Role::Recruiter => report::recruiter_dashboard(&view),
                _ => report::admin_dashboard(&view),
            }
        }
    };
    print!("{output}");
    Ok(())
}

async fn export_csv(config: &Config, session: &Session, skills: &[String]) -> anyhow::Result<()> {
    session.require(&[Role::Admin, Role::Recruiter])?;
    let mode = match session.role {
        Role::Recruiter => session.mode,
        _ => RecruitmentMode::Branch,
    };
    let spec = match mode {
        RecruitmentMode::Branch if !skills.is_empty() => {
            bail!("--skill needs skill mode; run `student-hub mode skill` first")
        }
        RecruitmentMode::Branch => FilterSpec::cleared(mode),
        RecruitmentMode::Skill => FilterSpec::Skill(skill_filter(skills)),
    };
    let view = open_view(config, session, spec)?;

    let label = match mode {
        RecruitmentMode::Branch => "NAAC",
        RecruitmentMode::Skill => "Skill-based",
    };
    let kind = ExportKind::Report {
        label: label.to_string(),
    };
    run_export(config, &kind, || {
        let bytes = match mode {
            RecruitmentMode::Branch => export::to_csv(view.roster(), mode)?,
            RecruitmentMode::Skill => export::to_csv(filter::apply(view.roster(), view.spec()), mode)?,
        };
        Ok(Artifact {
            file_name: export::report_file_name(mode, view.spec().selected_skills()),
            bytes,
        })
    })
    .await;
    Ok(())
}

async fn export_portfolio(
    config: &Config,
    session: &Session,
    student_id: Option<&str>,
) -> anyhow::Result<()> {
    session.require(&[Role::Student, Role::Admin])?;
    if session.role == Role::Student && student_id.is_some() {
        bail!("students can only export their own portfolio");
    }
    let view = open_view(config, session, FilterSpec::default())?;
    let student = match (session.role, student_id) {
        (Role::Student, _) => session.resolve_student(view.roster()),
        (_, Some(id)) => view.student(id),
        (_, None) => view.selected(),
    };

    run_export(config, &ExportKind::Portfolio, || {
        let student = student.ok_or_else(|| {
            ExportError::NothingToExport(format!(
                "no student record {}",
                student_id.unwrap_or("selected")
            ))
        })?;
        let document = portfolio::render_portfolio(student);
        Ok(Artifact {
            file_name: portfolio::portfolio_file_name(student),
            bytes: pdf::to_bytes(&document),
        })
    })
    .await;
    Ok(())
}

async fn run_export<F>(config: &Config, kind: &ExportKind, build: F)
where
    F: FnOnce() -> Result<Artifact, ExportError>,
{
    if let Some(notice) = kind.started() {
        println!("{notice}");
    }
    let delivery = artifact::deliver(&config.out_dir, kind, build).await;
    println!("{}", delivery.notice);
    if let Some(path) = delivery.path {
        println!("Saved to {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_means_unconstrained() {
        let args = FilterArgs {
            branch: Some("All".into()),
            year: Some("3".into()),
            min_cgpa: Some(7.5),
            ..Default::default()
        };
        let spec = args.to_spec(RecruitmentMode::Branch).unwrap();
        assert_eq!(
            spec,
            FilterSpec::Branch(BranchFilter {
                year: Some(3),
                min_cgpa: Some(7.5),
                ..Default::default()
            })
        );
    }

    #[test]
    fn filters_must_match_mode() {
        let branch = FilterArgs {
            branch: Some("CSE".into()),
            ..Default::default()
        };
        assert!(branch.to_spec(RecruitmentMode::Skill).is_err());

        let skill = FilterArgs {
            skills: vec!["Python".into()],
            ..Default::default()
        };
        assert!(skill.to_spec(RecruitmentMode::Branch).is_err());
        assert_eq!(skill.to_spec(RecruitmentMode::Skill).unwrap().selected_skills(), ["Python"]);
    }

    #[test]
    fn repeated_skill_is_dropped() {
        let skills = ["Python".to_string(), "SQL".to_string(), "Python".to_string()];
        assert_eq!(skill_filter(&skills).skills, vec!["SQL".to_string()]);
    }

    #[test]
    fn bad_year_is_rejected() {
        let args = FilterArgs {
            year: Some("third".into()),
            ..Default::default()
        };
        assert!(args.to_spec(RecruitmentMode::Branch).is_err());
    }

    #[test]
    fn category_parser_lists_choices() {
        assert_eq!(
            parse_category("co-curricular"),
            Ok(AchievementCategory::CoCurricular)
        );
        assert_eq!(
            parse_category("sports").unwrap_err(),
            "expected one of: Educational, Technical, Co-curricular"
        );
    }

    #[test]
    fn cli_parses_nested_export() {
        let cli = Cli::try_parse_from(["student-hub", "export", "csv", "--skill", "Python"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export {
                target: ExportTarget::Csv { .. }
            }
        ));
        let cli = Cli::try_parse_from(["student-hub", "roster", "--branch", "CSE"]).unwrap();
        assert!(matches!(cli.command, Commands::Dashboard { .. }));
    }
}
