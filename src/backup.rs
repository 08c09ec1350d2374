//! Backups and staged writes.
//!
//! Patched content is first written to temp files next to each target
//! ([`Transaction::stage`]). Only when every target is staged does
//! [`Transaction::commit`] rename each original to `<name>.backup` and move the
//! staged file into its place. A failure part-way through commit puts the
//! already committed targets back the way they were.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const BACKUP_SUFFIX: &str = ".backup";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("backup already exists: {backup}")]
    BackupExists { backup: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> BackupError + '_ {
        move |source| BackupError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// `app.js` -> `app.js.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Fail if anything (file, directory, dangling symlink) occupies `backup`.
fn ensure_absent(backup: &Path) -> Result<(), BackupError> {
    match fs::symlink_metadata(backup) {
        Ok(_) => Err(BackupError::BackupExists {
            backup: backup.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BackupError::io(backup)(e)),
    }
}

struct StagedWrite {
    target: PathBuf,
    backup: PathBuf,
    temp: NamedTempFile,
    bytes: usize,
}

/// A target that was backed up and rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub target: PathBuf,
    pub backup: PathBuf,
    pub bytes: usize,
}

/// Writes staged for all targets, committed together.
#[derive(Default)]
pub struct Transaction {
    staged: Vec<StagedWrite>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write `content` to a synced temp file beside `target`.
    ///
    /// Fails before anything is touched if `target`'s backup slot is taken.
    pub fn stage(&mut self, target: &Path, content: &str) -> Result<(), BackupError> {
        let backup = backup_path(target);
        ensure_absent(&backup)?;

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(parent).map_err(BackupError::io(parent))?;
        temp.write_all(content.as_bytes())
            .map_err(BackupError::io(temp.path()))?;
        temp.as_file()
            .sync_all()
            .map_err(BackupError::io(temp.path()))?;

        // Keep the original's mode on the replacement
        let permissions = fs::metadata(target)
            .map_err(BackupError::io(target))?
            .permissions();
        temp.as_file()
            .set_permissions(permissions)
            .map_err(BackupError::io(temp.path()))?;

        self.staged.push(StagedWrite {
            target: target.to_path_buf(),
            backup,
            temp,
            bytes: content.len(),
        });
        Ok(())
    }

    /// Back up and replace every staged target, in staging order.
    pub fn commit(self) -> Result<Vec<Committed>, BackupError> {
        let mut committed: Vec<Committed> = Vec::with_capacity(self.staged.len());

        for staged in self.staged {
            match commit_one(staged) {
                Ok(done) => committed.push(done),
                Err(err) => {
                    rollback(&committed);
                    return Err(err);
                }
            }
        }

        Ok(committed)
    }
}

fn commit_one(staged: StagedWrite) -> Result<Committed, BackupError> {
    let StagedWrite {
        target,
        backup,
        temp,
        bytes,
    } = staged;

    // Re-check right before the rename; rename(2) would silently replace it.
    ensure_absent(&backup)?;
    fs::rename(&target, &backup).map_err(BackupError::io(&target))?;

    if let Err(err) = temp.persist(&target) {
        // Best effort: the persist error is the one worth reporting.
        let _ = fs::rename(&backup, &target);
        return Err(BackupError::Io {
            path: target,
            source: err.error,
        });
    }

    Ok(Committed {
        target,
        backup,
        bytes,
    })
}

fn rollback(committed: &[Committed]) {
    for done in committed.iter().rev() {
        let _ = fs::rename(&done.backup, &done.target);
    }
}

/// Outcome of restoring one target from its backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreResult {
    Restored { target: PathBuf, backup: PathBuf },
    NoBackup { target: PathBuf },
}

/// Move `<target>.backup` back over `target`.
pub fn restore(target: &Path) -> Result<RestoreResult, BackupError> {
    let backup = backup_path(target);
    match fs::symlink_metadata(&backup) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(RestoreResult::NoBackup {
                target: target.to_path_buf(),
            })
        }
        Err(e) => return Err(BackupError::io(&backup)(e)),
    }

    fs::rename(&backup, target).map_err(BackupError::io(&backup))?;
    Ok(RestoreResult::Restored {
        target: target.to_path_buf(),
        backup,
    })
}
