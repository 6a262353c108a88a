use std::path::PathBuf;

use clap::Args;

use crate::models::StudentRecord;
use crate::roster::{self, DataError};
use crate::session::SessionStore;

/// Settings shared by every command. Each flag can also come from the
/// environment.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Roster JSON file; the bundled sample roster is used when unset
    #[arg(long, global = true, env = "STUDENT_HUB_DATA")]
    pub data: Option<PathBuf>,

    /// Where the current session is kept between invocations
    #[arg(
        long,
        global = true,
        env = "STUDENT_HUB_SESSION",
        default_value = ".student-hub-session.json"
    )]
    pub session: PathBuf,

    /// Directory exported reports and portfolios are written to
    #[arg(long, global = true, env = "STUDENT_HUB_OUT", default_value = ".")]
    pub out_dir: PathBuf,

    /// Log filter directive (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

impl Config {
    pub fn load_roster(&self) -> Result<Vec<StudentRecord>, DataError> {
        let students = roster::source_for(self.data.as_deref()).load()?;
        tracing::debug!(
            source = ?self.data,
            count = students.len(),
            "roster loaded"
        );
        Ok(students)
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(&self.session)
    }
}
