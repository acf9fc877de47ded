//! Revision source backed by the git history of the archive repository.
//!
//! Revisions are the commits touching the data directory. A revision is
//! materialized through a scratch index (`read-tree` of the data subtree,
//! then `checkout-index` into a private working directory), so the user's
//! checkout and index are never modified and files added by later commits
//! cannot leak into earlier revisions.

use chrono::{DateTime, Utc};
use kek_core::model::Revision;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use crate::error::SourceError;
use crate::source::{DataDir, RevisionRange, RevisionSource};

const LOG_FORMAT: &str = "--format=%H|%cI|%s";

/// Revision source reading `git log` of a repository.
#[derive(Debug)]
pub struct GitRevisionSource {
    repo: PathBuf,
    data_subdir: PathBuf,
    work_dir: TempDir,
}

impl GitRevisionSource {
    /// Create a source for `data_subdir` (relative to the repository root)
    /// of the repository at `repo`.
    pub fn new(repo: impl Into<PathBuf>, data_subdir: impl Into<PathBuf>) -> Result<Self, SourceError> {
        Ok(Self {
            repo: repo.into(),
            data_subdir: data_subdir.into(),
            work_dir: TempDir::new()?,
        })
    }

    fn data_spec(&self) -> String {
        self.data_subdir.to_string_lossy().replace('\\', "/")
    }

    fn index_file(&self) -> PathBuf {
        self.work_dir.path().join("index")
    }

    fn checkout_root(&self) -> PathBuf {
        self.work_dir.path().join("data")
    }

    fn git(&self, args: &[&str], index: Option<&Path>) -> Result<String, SourceError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo).args(args);
        if let Some(index) = index {
            cmd.env("GIT_INDEX_FILE", index);
        }

        log::debug!("Running git {}", args.join(" "));
        let output = cmd.output().map_err(|source| SourceError::Spawn {
            program: "git",
            source,
        })?;

        if !output.status.success() {
            return Err(SourceError::Command {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn clear_checkout(&self) -> Result<(), SourceError> {
        let root = self.checkout_root();
        if root.exists() {
            std::fs::remove_dir_all(&root)?;
        }
        let index = self.index_file();
        if index.exists() {
            std::fs::remove_file(&index)?;
        }
        Ok(())
    }
}

impl RevisionSource for GitRevisionSource {
    fn list_revisions(&self, range: &RevisionRange) -> Result<Vec<Revision>, SourceError> {
        let mut args = vec!["log".to_string(), LOG_FORMAT.to_string()];
        if let Some(since) = range.since {
            args.push(format!("--since={since}"));
        }
        if let Some(until) = range.until {
            args.push(format!("--until={until}"));
        }
        if let Some(max) = range.max_count {
            args.push(format!("--max-count={max}"));
        }
        args.push("--".to_string());
        args.push(self.data_spec());

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.git(&args, None)?;
        parse_log(&stdout)
    }

    fn materialize(&self, revision: &Revision) -> Result<DataDir, SourceError> {
        self.clear_checkout()?;
        let root = self.checkout_root();
        std::fs::create_dir_all(&root)?;

        let index = self.index_file();
        let tree = format!("{}:{}", revision.id, self.data_spec());
        let prefix = format!("{}/", root.display());

        self.git(&["read-tree", &tree], Some(&index))
            .and_then(|_| self.git(&["checkout-index", "-a", "-f", &format!("--prefix={prefix}")], Some(&index)))
            .map_err(|e| SourceError::Materialize {
                revision: revision.id.clone(),
                message: e.to_string(),
            })?;

        Ok(DataDir::new(root))
    }

    fn restore(&self) -> Result<(), SourceError> {
        self.clear_checkout()
    }
}

/// Parse `git log --format=%H|%cI|%s` output.
fn parse_log(stdout: &str) -> Result<Vec<Revision>, SourceError> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_log_line)
        .collect()
}

fn parse_log_line(line: &str) -> Result<Revision, SourceError> {
    let mut parts = line.splitn(3, '|');
    let (Some(hash), Some(date), Some(message)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(SourceError::Parse {
            line: line.to_string(),
            message: "expected hash|date|subject".to_string(),
        });
    };

    let timestamp = DateTime::parse_from_rfc3339(date)
        .map_err(|e| SourceError::Parse {
            line: line.to_string(),
            message: e.to_string(),
        })?
        .with_timezone(&Utc);

    Ok(Revision::new(hash, timestamp, message))
}
