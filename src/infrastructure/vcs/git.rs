//! Git source provider
//!
//! Shells out to the git CLI with prompts disabled. Exports are produced with
//! `git archive | tar -x`, so the export holds exactly the committed tree.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use fs2::FileExt;

use crate::domain::ports::{SourceError, SourceProvider, SourceResult};
use crate::domain::value_objects::branch::remote_name;

/// Git working tree at `srcdir`
#[derive(Debug, Clone)]
pub struct GitSourceProvider {
    srcdir: PathBuf,
}

impl GitSourceProvider {
    pub fn new(srcdir: impl Into<PathBuf>) -> Self {
        Self {
            srcdir: srcdir.into(),
        }
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.srcdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }

    fn git_stdout(&self, args: &[&str]) -> SourceResult<String> {
        let output = self.git().args(args).output()?;
        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn replace_with_export(&self, branch: &str, destination: &Path) -> SourceResult<()> {
        if destination.exists() {
            fs::remove_dir_all(destination)?;
        }
        fs::create_dir_all(destination)?;
        self.archive_into(branch, destination)
    }

    fn archive_into(&self, branch: &str, destination: &Path) -> SourceResult<()> {
        let mut archive = self
            .git()
            .args(["archive", "--format=tar", branch])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let tar_input = archive.stdout.take().ok_or_else(|| SourceError::CommandFailed {
            command: format!("git archive {}", branch),
            stderr: "archive output unavailable".to_string(),
        })?;

        let tar = Command::new("tar")
            .arg("-x")
            .arg("-C")
            .arg(destination)
            .stdin(Stdio::from(tar_input))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();
        let archive = archive.wait_with_output()?;
        let tar = tar?;

        if !archive.status.success() {
            return Err(SourceError::CommandFailed {
                command: format!("git archive {}", branch),
                stderr: String::from_utf8_lossy(&archive.stderr).into_owned(),
            });
        }
        if !tar.status.success() {
            return Err(SourceError::CommandFailed {
                command: format!("tar -x -C {}", destination.display()),
                stderr: String::from_utf8_lossy(&tar.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

impl SourceProvider for GitSourceProvider {
    fn exists(&self) -> bool {
        self.git()
            .args(["rev-parse", "--git-dir"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn current_branch(&self) -> SourceResult<String> {
        Ok(self
            .git_stdout(&["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    fn available_branches(&self) -> SourceResult<Vec<String>> {
        Ok(parse_branch_list(
            &self.git_stdout(&["branch", "-a", "--no-color"])?,
        ))
    }

    fn update_branch(&self, branch: &str) -> SourceResult<()> {
        let remote =
            remote_name(branch).ok_or_else(|| SourceError::NotRemoteBranch(branch.to_string()))?;
        self.git_stdout(&["remote", "update", "--prune", remote])?;
        Ok(())
    }

    fn export(&self, branch: &str, destination: &Path) -> SourceResult<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = destination.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|source| SourceError::ExportLocked {
                path: destination.to_path_buf(),
                source,
            })?;

        let result = self.replace_with_export(branch, destination);

        let _ = lock_file.unlock();
        let _ = fs::remove_file(&lock_path);
        result
    }
}

/// Branch names from `git branch -a` output
///
/// Drops the current-branch marker, symbolic refs (`remotes/origin/HEAD -> ...`)
/// and detached-HEAD placeholders.
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim_start_matches('*').trim())
        .filter(|line| !line.is_empty() && !line.contains(" -> ") && !line.starts_with('('))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_branch_list_strips_markers_and_aliases() {
        let output = "\
* main
  develop
  remotes/origin/HEAD -> origin/main
  remotes/origin/main
  remotes/origin/feature/login
";
        assert_eq!(
            parse_branch_list(output),
            vec![
                "main",
                "develop",
                "remotes/origin/main",
                "remotes/origin/feature/login"
            ]
        );
    }

    #[test]
    fn parse_branch_list_skips_detached_head() {
        let output = "* (HEAD detached at 1a2b3c4)\n  main\n";
        assert_eq!(parse_branch_list(output), vec!["main"]);
    }

    #[test]
    fn update_branch_requires_remote_branch() {
        let provider = GitSourceProvider::new(".");
        assert!(matches!(
            provider.update_branch("main"),
            Err(SourceError::NotRemoteBranch(ref b)) if b == "main"
        ));
    }

    #[test]
    fn plain_directory_is_not_version_controlled() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GitSourceProvider::new(dir.path());
        assert!(!provider.exists());
    }

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .args(args)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_CONFIG_GLOBAL", "/dev/null")
            .env("GIT_AUTHOR_NAME", "beam")
            .env("GIT_AUTHOR_EMAIL", "beam@example.com")
            .env("GIT_COMMITTER_NAME", "beam")
            .env("GIT_COMMITTER_EMAIL", "beam@example.com")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    #[cfg(unix)]
    #[test]
    fn export_writes_committed_tree_only() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir(&repo).unwrap();
        git(&repo, &["init", "-q"]);
        git(&repo, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        fs::write(repo.join("index.php"), "<?php echo 1;").unwrap();
        git(&repo, &["add", "index.php"]);
        git(&repo, &["commit", "-q", "-m", "init"]);
        fs::write(repo.join("untracked.txt"), "local only").unwrap();

        let provider = GitSourceProvider::new(&repo);
        assert!(provider.exists());
        assert_eq!(provider.current_branch().unwrap(), "main");
        assert_eq!(provider.available_branches().unwrap(), vec!["main"]);

        let export = dir.path().join("_temp");
        fs::create_dir_all(&export).unwrap();
        fs::write(export.join("stale.txt"), "old").unwrap();

        provider.export("main", &export).unwrap();
        assert!(export.join("index.php").exists());
        assert!(!export.join("untracked.txt").exists());
        assert!(!export.join("stale.txt").exists());
        assert!(!dir.path().join("_temp.lock").exists());
    }
}
