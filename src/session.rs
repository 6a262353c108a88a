use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::RecruitmentMode;
use crate::models::{RecruitmentStatus, StudentRecord};
use crate::view::RosterView;

/// Student id used when the login form is submitted empty.
pub const DEV_STUDENT_ID: &str = "DEV_STU001";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
    Recruiter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => f.write_str("student"),
            Role::Admin => f.write_str("admin"),
            Role::Recruiter => f.write_str("recruiter"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not logged in; run `student-hub login <role>` first")]
    NotLoggedIn,
    #[error("this command requires the {required} role (logged in as {actual})")]
    WrongRole { required: String, actual: Role },
    #[error("session store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub mode: RecruitmentMode,
}

/// A session-local change to the roster snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mutation {
    Verify {
        student_id: String,
        achievement_id: String,
        verified: bool,
    },
    Status {
        student_id: String,
        status: RecruitmentStatus,
    },
}

impl Mutation {
    fn same_target(&self, other: &Mutation) -> bool {
        match (self, other) {
            (
                Mutation::Verify {
                    student_id: a,
                    achievement_id: x,
                    ..
                },
                Mutation::Verify {
                    student_id: b,
                    achievement_id: y,
                    ..
                },
            ) => a == b && x == y,
            (Mutation::Status { student_id: a, .. }, Mutation::Status { student_id: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }

    fn apply(&self, view: &mut RosterView) -> bool {
        match self {
            Mutation::Verify {
                student_id,
                achievement_id,
                verified,
            } => view.set_verified_for(student_id, achievement_id, *verified),
            Mutation::Status { student_id, status } => view.set_status(student_id, *status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub role: Role,
    pub user_id: Option<String>,
    #[serde(default)]
    pub mode: RecruitmentMode,
    pub logged_in_at: DateTime<Utc>,
    #[serde(default)]
    pub journal: Vec<Mutation>,
}

/// Stub authentication: every credential pair is accepted. Stands in for a
/// real authentication call, which is the only reason it is async.
pub async fn login(role: Role, request: LoginRequest) -> Result<Session, SessionError> {
    let user_id = request
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let user_id = match role {
        Role::Student => Some(user_id.unwrap_or_else(|| DEV_STUDENT_ID.to_string())),
        Role::Admin | Role::Recruiter => user_id,
    };
    let mode = match role {
        Role::Recruiter => request.mode,
        Role::Student | Role::Admin => RecruitmentMode::Branch,
    };

    tracing::info!(
        %role,
        user = ?user_id,
        ?mode,
        password_supplied = request.password.is_some(),
        "session started"
    );
    Ok(Session {
        role,
        user_id,
        mode,
        logged_in_at: Utc::now(),
        journal: Vec::new(),
    })
}

impl Session {
    pub fn require(&self, allowed: &[Role]) -> Result<(), SessionError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        let required = allowed
            .iter()
            .map(Role::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(SessionError::WrongRole {
            required,
            actual: self.role,
        })
    }

    /// Appends a mutation, dropping earlier entries for the same target.
    pub fn record(&mut self, mutation: Mutation) {
        self.journal.retain(|entry| !entry.same_target(&mutation));
        self.journal.push(mutation);
    }

    /// Re-applies the journal to a fresh snapshot. Entries whose target no
    /// longer exists are skipped. Returns how many applied.
    pub fn replay(&self, view: &mut RosterView) -> usize {
        let applied = self
            .journal
            .iter()
            .filter(|mutation| mutation.apply(view))
            .count();
        tracing::debug!(applied, recorded = self.journal.len(), "replayed session journal");
        applied
    }

    /// The logged-in student's record, or the first record when the id is
    /// not in the roster.
    pub fn resolve_student<'a>(&self, roster: &'a [StudentRecord]) -> Option<&'a StudentRecord> {
        self.user_id
            .as_deref()
            .and_then(|id| roster.iter().find(|student| student.id == id))
            .or_else(|| roster.first())
    }
}

/// Key-value persistence for the current session, owned by the CLI layer.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Store {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn current(&self) -> Result<Session, SessionError> {
        self.load()?.ok_or(SessionError::NotLoggedIn)
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let raw = serde_json::to_string_pretty(session).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, raw).map_err(|source| SessionError::Store {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns whether a session existed.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Store {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{achievement, student};
    use crate::filter::FilterSpec;
    use crate::models::AchievementCategory;

    fn roster() -> Vec<StudentRecord> {
        let mut s1 = student("S1", "CSE", 2, 8.2, 91);
        s1.achievements = vec![achievement("A1", AchievementCategory::Technical, false)];
        vec![s1, student("S2", "ECE", 3, 6.9, 74)]
    }

    #[tokio::test]
    async fn empty_student_id_falls_back_to_dev_id() {
        let request = LoginRequest {
            user_id: Some("  ".to_string()),
            password: Some("anything".to_string()),
            ..Default::default()
        };
        let session = login(Role::Student, request).await.unwrap();
        assert_eq!(session.user_id.as_deref(), Some(DEV_STUDENT_ID));
        assert_eq!(session.mode, RecruitmentMode::Branch);
        assert!(session.journal.is_empty());
    }

    #[tokio::test]
    async fn recruiter_keeps_requested_mode() {
        let request = LoginRequest {
            mode: RecruitmentMode::Skill,
            ..Default::default()
        };
        let session = login(Role::Recruiter, request).await.unwrap();
        assert_eq!(session.mode, RecruitmentMode::Skill);
        assert_eq!(session.user_id, None);
    }

    #[tokio::test]
    async fn role_guard_names_required_roles() {
        let session = login(Role::Student, LoginRequest::default()).await.unwrap();
        assert!(session.require(&[Role::Student]).is_ok());
        let err = session.require(&[Role::Admin, Role::Recruiter]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "this command requires the admin or recruiter role (logged in as student)"
        );
    }

    #[tokio::test]
    async fn unknown_student_resolves_to_first_record() {
        let roster = roster();
        let request = LoginRequest {
            user_id: Some("S2".to_string()),
            ..Default::default()
        };
        let session = login(Role::Student, request).await.unwrap();
        assert_eq!(session.resolve_student(&roster).unwrap().id, "S2");

        let session = login(Role::Student, LoginRequest::default()).await.unwrap();
        assert_eq!(session.resolve_student(&roster).unwrap().id, "S1");
        assert!(session.resolve_student(&[]).is_none());
    }

    #[tokio::test]
    async fn journal_replays_onto_fresh_snapshot() {
        let mut session = login(Role::Admin, LoginRequest::default()).await.unwrap();
        session.record(Mutation::Verify {
            student_id: "S1".into(),
            achievement_id: "A1".into(),
            verified: true,
        });
        session.record(Mutation::Status {
            student_id: "S2".into(),
            status: RecruitmentStatus::Disqualified,
        });
        session.record(Mutation::Status {
            student_id: "S9".into(),
            status: RecruitmentStatus::Disqualified,
        });

        let mut view = RosterView::new(roster(), FilterSpec::default());
        assert_eq!(session.replay(&mut view), 2);
        assert!(view.student("S1").unwrap().achievements[0].verified);
        assert_eq!(
            view.student("S2").unwrap().status,
            RecruitmentStatus::Disqualified
        );
    }

    #[tokio::test]
    async fn record_keeps_latest_entry_per_target() {
        let mut session = login(Role::Recruiter, LoginRequest::default()).await.unwrap();
        for status in [RecruitmentStatus::Disqualified, RecruitmentStatus::Active] {
            session.record(Mutation::Status {
                student_id: "S1".into(),
                status,
            });
        }
        assert_eq!(
            session.journal,
            vec![Mutation::Status {
                student_id: "S1".into(),
                status: RecruitmentStatus::Active,
            }]
        );
    }

    #[tokio::test]
    async fn store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
        assert!(matches!(store.current(), Err(SessionError::NotLoggedIn)));

        let mut session = login(Role::Admin, LoginRequest::default()).await.unwrap();
        session.record(Mutation::Verify {
            student_id: "S1".into(),
            achievement_id: "A1".into(),
            verified: true,
        });
        store.save(&session).unwrap();
        assert_eq!(store.current().unwrap(), session);

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_store_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SessionStore::new(&path);
        assert!(matches!(store.load(), Err(SessionError::Corrupt { .. })));
    }
}
