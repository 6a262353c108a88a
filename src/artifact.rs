use std::fmt;
use std::path::{Path, PathBuf};

use crate::export::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Failure,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Notice {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            NoticeKind::Info => "..",
            NoticeKind::Success => "ok",
            NoticeKind::Failure => "!!",
        };
        write!(f, "[{marker}] {}: {}", self.title, self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportKind {
    /// CSV report; the label names the report in the success message.
    Report { label: String },
    Portfolio,
}

impl ExportKind {
    pub fn started(&self) -> Option<Notice> {
        match self {
            ExportKind::Report { .. } => None,
            ExportKind::Portfolio => Some(Notice::new(
                NoticeKind::Info,
                "Generating Portfolio",
                "Please wait while we create your PDF portfolio...",
            )),
        }
    }

    fn succeeded(&self) -> Notice {
        match self {
            ExportKind::Report { label } => Notice::new(
                NoticeKind::Success,
                "Report Exported",
                format!("{label} report has been downloaded successfully"),
            ),
            ExportKind::Portfolio => Notice::new(
                NoticeKind::Success,
                "Portfolio Generated!",
                "Your PDF portfolio has been downloaded successfully.",
            ),
        }
    }

    fn failed(&self) -> Notice {
        match self {
            ExportKind::Report { .. } => Notice::new(
                NoticeKind::Failure,
                "Export Failed",
                "Failed to export report. Please try again.",
            ),
            ExportKind::Portfolio => Notice::new(
                NoticeKind::Failure,
                "Error",
                "Failed to generate portfolio. Please try again.",
            ),
        }
    }
}

#[derive(Debug)]
pub struct Delivery {
    pub notice: Notice,
    pub path: Option<PathBuf>,
}

/// Writes the artifact next to its final name and renames it into place,
/// so a failed save never leaves a partial file under the final name.
pub async fn save(dir: &Path, artifact: &Artifact) -> Result<PathBuf, ExportError> {
    let path = dir.join(&artifact.file_name);
    let partial = dir.join(format!(".{}.part", artifact.file_name));

    if let Err(source) = tokio::fs::write(&partial, &artifact.bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(ExportError::Io {
            path: partial,
            source,
        });
    }
    if let Err(source) = tokio::fs::rename(&partial, &path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(ExportError::Io { path, source });
    }

    Ok(path)
}

/// Builds and saves an artifact, reducing the outcome to one notice.
pub async fn deliver<F>(dir: &Path, kind: &ExportKind, build: F) -> Delivery
where
    F: FnOnce() -> Result<Artifact, ExportError>,
{
    let saved = match build() {
        Ok(artifact) => save(dir, &artifact).await,
        Err(err) => Err(err),
    };

    match saved {
        Ok(path) => {
            tracing::info!(path = %path.display(), "artifact saved");
            Delivery {
                notice: kind.succeeded(),
                path: Some(path),
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "export failed");
            Delivery {
                notice: kind.failed(),
                path: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> Artifact {
        Artifact {
            file_name: "NAAC_Student_Report.csv".to_string(),
            bytes: b"Student ID\n".to_vec(),
        }
    }

    fn report() -> ExportKind {
        ExportKind::Report {
            label: "NAAC".to_string(),
        }
    }

    #[tokio::test]
    async fn save_writes_final_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(dir.path(), &artifact()).await.unwrap();

        assert_eq!(path, dir.path().join("NAAC_Student_Report.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"Student ID\n");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn successful_delivery_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let delivery = deliver(dir.path(), &report(), || Ok(artifact())).await;

        assert_eq!(delivery.notice.kind, NoticeKind::Success);
        assert_eq!(
            delivery.notice.description,
            "NAAC report has been downloaded successfully"
        );
        assert!(delivery.path.unwrap().exists());
    }

    #[tokio::test]
    async fn save_failure_becomes_one_generic_notice() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let delivery = deliver(&missing, &ExportKind::Portfolio, || Ok(artifact())).await;

        assert_eq!(delivery.notice.kind, NoticeKind::Failure);
        assert_eq!(delivery.notice.title, "Error");
        assert_eq!(
            delivery.notice.description,
            "Failed to generate portfolio. Please try again."
        );
        assert!(delivery.path.is_none());
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn build_failure_skips_saving() {
        let dir = tempfile::tempdir().unwrap();
        let delivery = deliver(dir.path(), &report(), || {
            Err(ExportError::NothingToExport("no students".to_string()))
        })
        .await;

        assert_eq!(delivery.notice.title, "Export Failed");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn notice_display_includes_title_and_description() {
        let notice = Notice::new(NoticeKind::Success, "Report Exported", "done");
        assert_eq!(notice.to_string(), "[ok] Report Exported: done");
    }
}
