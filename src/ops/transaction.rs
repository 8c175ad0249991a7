//! Staged manifest writes.
//!
//! Every rewritten manifest is staged first and written on `commit()`, one
//! whole-file write per manifest, in staging order.
//!
//! ## Execution Guarantees
//!
//! - **Idempotency**: Files whose content would not change are never staged
//! - **Validation**: Staged files must still exist and be writable
//! - **Recovery**: If a write fails, files already written are restored
//!
//! Writes are plain `fs::write` calls, not replace-on-write: a crash in the
//! middle of a write can leave that one file truncated.
//!
//! ## Example
//!
//! ```no_run
//! # use cargo_inject::ops::Transaction;
//! # use std::path::PathBuf;
//! # fn example() -> cargo_inject::error::Result<()> {
//! let mut txn = Transaction::new(false);
//!
//! txn.update_file(
//!     PathBuf::from("crates/core/Cargo.toml"),
//!     "[dependencies]\n".into(),
//!     "[dependencies]\nlog = \"0.4\"\n".into(),
//! )?;
//!
//! txn.commit()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{InjectError, Result};

use colored::Colorize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A staged manifest write.
#[derive(Debug, Clone)]
pub struct Operation {
    pub path: PathBuf,
    /// Content read before rewriting, restored if a later write fails.
    pub original: String,
    pub new: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    /// Staging operations.
    Building,
    /// All operations succeeded.
    Committed,
    /// Validation or a write failed.
    Failed,
}

/// Transaction coordinating manifest writes.
///
/// ## Dry-Run Mode
///
/// When `dry_run = true`, operations are staged and listed in the summary but never
/// written.
#[must_use = "Transaction must be committed"]
pub struct Transaction {
    operations: Vec<Operation>,
    dry_run: bool,
    state: TransactionState,
    executed_indices: Vec<usize>,
}

impl Transaction {
    /// Creates a new transaction.
    pub fn new(dry_run: bool) -> Self {
        Self {
            operations: Vec::new(),
            dry_run,
            state: TransactionState::Building,
            executed_indices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns true if successfully committed.
    pub fn is_committed(&self) -> bool {
        self.state == TransactionState::Committed
    }

    /// Stages a file update.
    ///
    /// `original` is the content the rewrite started from. If `new_content` is
    /// identical, nothing is staged.
    pub fn update_file(
        &mut self,
        path: PathBuf,
        original: String,
        new_content: String,
    ) -> Result<()> {
        if self.state != TransactionState::Building {
            return Err(InjectError::Other(anyhow::anyhow!(
                "Cannot modify transaction after commit"
            )));
        }

        if original == new_content {
            log::debug!("Content unchanged, skipping: {}", path.display());
            return Ok(());
        }

        if self.dry_run {
            log::info!("Would update: {}", path.display());
        } else {
            log::debug!("Staging update for: {}", path.display());
        }

        self.operations.push(Operation {
            path,
            original,
            new: new_content,
        });

        Ok(())
    }

    /// Validates all staged operations.
    ///
    /// Checks:
    /// - No duplicate paths
    /// - Files still exist
    /// - Files are writable
    fn validate(&self) -> Result<()> {
        let mut paths = HashSet::new();

        for op in &self.operations {
            if !paths.insert(&op.path) {
                return Err(InjectError::Other(anyhow::anyhow!(
                    "Duplicate file operation: {}",
                    op.path.display()
                )));
            }

            if !op.path.exists() {
                return Err(InjectError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File no longer exists: {}", op.path.display()),
                )));
            }

            if let Ok(metadata) = fs::metadata(&op.path) {
                if metadata.permissions().readonly() {
                    return Err(InjectError::Io(std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        format!("File is read-only: {}", op.path.display()),
                    )));
                }
            }
        }

        Ok(())
    }

    /// Writes all staged operations in order.
    ///
    /// If a write fails, every file already written is restored before the
    /// error is returned.
    pub fn commit(&mut self) -> Result<()> {
        if self.state != TransactionState::Building {
            return Err(InjectError::Other(anyhow::anyhow!(
                "Transaction already committed"
            )));
        }

        if self.dry_run {
            self.state = TransactionState::Committed;
            return Ok(());
        }

        if let Err(e) = self.validate() {
            self.state = TransactionState::Failed;
            return Err(e);
        }

        for idx in 0..self.operations.len() {
            let op = &self.operations[idx];
            if let Err(e) = fs::write(&op.path, &op.new) {
                let err = InjectError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write {}: {}", op.path.display(), e),
                ));
                self.state = TransactionState::Failed;
                if let Err(rollback_err) = self.restore_written() {
                    log::error!("{}", rollback_err);
                }
                return Err(err);
            }
            self.executed_indices.push(idx);
            log::debug!("Updated: {}", op.path.display());
        }

        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Restores the files written so far, newest first.
    fn restore_written(&mut self) -> Result<()> {
        let mut errors = Vec::new();

        for &idx in self.executed_indices.iter().rev() {
            let op = &self.operations[idx];
            if let Err(e) = fs::write(&op.path, &op.original) {
                errors.push(format!("Failed to restore {}: {}", op.path.display(), e));
            }
        }
        self.executed_indices.clear();

        if errors.is_empty() {
            log::info!("Restored files written before the failure");
            Ok(())
        } else {
            Err(InjectError::RollbackFailed(errors.join("; ")))
        }
    }

    /// Prints the list of updated manifests to stdout.
    ///
    /// Paths are relative to `base_dir` with forward slashes.
    pub fn print_summary(&self, base_dir: &Path) {
        if self.operations.is_empty() {
            println!("\n{}", "No changes needed".yellow());
            return;
        }

        let display_path = |path: &Path| -> String {
            let relative =
                pathdiff::diff_paths(path, base_dir).unwrap_or_else(|| path.to_path_buf());
            relative.to_string_lossy().replace('\\', "/")
        };

        if self.dry_run {
            println!("\n{}", "DRY RUN - No changes will be made".yellow().bold());
        } else {
            println!("\n{}", "Changes applied:".green().bold());
        }

        let count = self.operations.len();
        println!(
            "\n{} Manifests ({} file{})",
            "📦".bold(),
            count,
            if count == 1 { "" } else { "s" }
        );
        for op in &self.operations {
            let path = display_path(&op.path);
            if self.dry_run {
                println!("   • {}", path.dimmed());
            } else {
                println!("   {} {}", "✓".green(), path.dimmed());
            }
        }

        println!();
        if self.dry_run {
            println!(
                "{} {} will be modified. Run without {} to apply.",
                count.to_string().cyan().bold(),
                if count > 1 { "files" } else { "file" },
                "--dry-run".cyan()
            );
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Building && !self.operations.is_empty() && !self.dry_run
        {
            log::warn!("Transaction dropped without commit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn stage(txn: &mut Transaction, path: &Path, new: &str) {
        let original = fs::read_to_string(path).unwrap();
        txn.update_file(path.to_path_buf(), original, new.to_string())
            .unwrap();
    }

    #[test]
    fn test_new_transaction() {
        let txn = Transaction::new(false);
        assert!(txn.is_empty());
        assert!(!txn.is_committed());
        assert_eq!(txn.len(), 0);
    }

    #[test]
    fn test_update_file_stages_operation() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("Cargo.toml");
        fs::write(&file_path, "original content").unwrap();

        let mut txn = Transaction::new(true); // dry-run
        stage(&mut txn, &file_path, "new content");

        assert_eq!(txn.len(), 1);

        // File should NOT be changed yet (dry-run)
        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "original content");
    }

    #[test]
    fn test_update_file_no_change_skips() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("Cargo.toml");
        fs::write(&file_path, "same content").unwrap();

        let mut txn = Transaction::new(false);
        stage(&mut txn, &file_path, "same content");

        assert_eq!(txn.len(), 0);
    }

    #[test]
    fn test_commit_writes_files() {
        let temp = TempDir::new().unwrap();
        let file1 = temp.path().join("a.toml");
        let file2 = temp.path().join("b.toml");
        fs::write(&file1, "a").unwrap();
        fs::write(&file2, "b").unwrap();

        let mut txn = Transaction::new(false);
        stage(&mut txn, &file1, "a2");
        stage(&mut txn, &file2, "b2");
        txn.commit().unwrap();

        assert!(txn.is_committed());
        assert_eq!(fs::read_to_string(&file1).unwrap(), "a2");
        assert_eq!(fs::read_to_string(&file2).unwrap(), "b2");
    }

    #[test]
    fn test_dry_run_does_not_modify_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Cargo.toml");
        fs::write(&file, "before").unwrap();

        let mut txn = Transaction::new(true);
        stage(&mut txn, &file, "after");
        txn.commit().unwrap();

        assert!(txn.is_committed());
        assert_eq!(fs::read_to_string(&file).unwrap(), "before");
    }

    #[test]
    fn test_commit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Cargo.toml");
        fs::write(&file, "before").unwrap();

        let mut txn = Transaction::new(false);
        stage(&mut txn, &file, "after");
        fs::remove_file(&file).unwrap();

        assert!(txn.commit().is_err());
        assert!(!file.exists());
    }

    #[test]
    fn test_failed_write_restores_earlier_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.toml");
        fs::write(&file, "before").unwrap();
        // A directory passes validation but cannot be written as a file.
        let dir = temp.path().join("b.toml");
        fs::create_dir(&dir).unwrap();

        let mut txn = Transaction::new(false);
        stage(&mut txn, &file, "after");
        txn.update_file(dir.clone(), "x".to_string(), "y".to_string())
            .unwrap();

        assert!(matches!(txn.commit(), Err(InjectError::Io(_))));
        assert!(!txn.is_committed());
        assert_eq!(fs::read_to_string(&file).unwrap(), "before");
        assert!(dir.is_dir());
    }

    #[test]
    fn test_cannot_stage_after_commit() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Cargo.toml");
        fs::write(&file, "before").unwrap();

        let mut txn = Transaction::new(false);
        txn.commit().unwrap();

        let result = txn.update_file(file, "before".to_string(), "after".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_double_commit_fails() {
        let mut txn = Transaction::new(false);
        txn.commit().unwrap();
        assert!(txn.commit().is_err());
    }
}
