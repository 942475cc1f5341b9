use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as GitCommand;

/// A historical commit message, split into subject and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub subject: String,
    pub body: String,
}

/// Everything the commit flow needs from git.
pub trait Git {
    /// Path to the git directory (e.g. `.git`).
    fn git_dir(&self) -> Result<PathBuf>;

    /// The full staged diff.
    fn staged_diff(&self) -> Result<String>;

    /// The last `depth` commit messages, newest first. Empty for a repository without commits.
    fn recent_commits(&self, depth: u32) -> Result<Vec<CommitRecord>>;

    /// Run `git commit` with the given arguments, attached to the terminal.
    /// Returns the process exit code.
    fn commit(&self, args: &[String]) -> Result<i32>;
}

/// Plain patch text regardless of `color.ui` or a configured `diff.external`.
const STAGED_DIFF_ARGS: &[&str] = &["diff", "--cached", "--no-color", "--no-ext-diff"];

/// `Git` backed by the `git` executable on PATH.
pub struct SystemGit;

/// Run a git command and capture stdout as String.
pub fn git_output(args: &[&str]) -> Result<String> {
    let output = GitCommand::new("git")
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {:?}", args))?;

    if !output.status.success() {
        return Err(anyhow!(
            "git {:?} exited with status {:?}: {}",
            args,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

impl Git for SystemGit {
    fn git_dir(&self) -> Result<PathBuf> {
        let dir = git_output(&["rev-parse", "--git-dir"])
            .context("not inside a git repository")?
            .trim()
            .to_string();
        Ok(PathBuf::from(dir))
    }

    fn staged_diff(&self) -> Result<String> {
        git_output(STAGED_DIFF_ARGS)
    }

    fn recent_commits(&self, depth: u32) -> Result<Vec<CommitRecord>> {
        // An unborn HEAD has no history to learn from.
        if git_output(&["rev-parse", "--verify", "--quiet", "HEAD"]).is_err() {
            return Ok(vec![]);
        }

        let limit = depth.to_string();
        let log_output = git_output(&[
            "log",
            "-n",
            &limit,
            "--pretty=format:%s%n%b%n---END---",
        ])?;

        Ok(parse_log(&log_output))
    }

    fn commit(&self, args: &[String]) -> Result<i32> {
        log::info!("Running git commit {:?}", args);

        let status = GitCommand::new("git")
            .arg("commit")
            .args(args)
            .status()
            .context("failed to run git commit")?;

        // Killed by a signal: report like a shell would.
        Ok(status.code().unwrap_or(128))
    }
}

/// Split `git log --pretty=format:%s%n%b%n---END---` output into records.
pub fn parse_log(log_output: &str) -> Vec<CommitRecord> {
    let mut records = Vec::new();

    for block in log_output.split("---END---") {
        let block = block.trim_matches('\n');
        if block.trim().is_empty() {
            continue;
        }

        let mut lines = block.lines();
        let subject = lines.next().unwrap_or("").trim().to_string();
        let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();

        records.push(CommitRecord { subject, body });
    }

    records
}

/// Write the commit message next to the git directory's own COMMIT_EDITMSG so
/// `git commit --file` can pick it up. Returns the path written.
pub fn write_message_file(git_dir: &Path, message: &str) -> Result<PathBuf> {
    let path = git_dir.join("AI_COMMIT_EDITMSG");
    let mut content = message.trim_end().to_string();
    content.push('\n');
    fs::write(&path, content)
        .with_context(|| format!("failed to write commit message to {:?}", path))?;
    Ok(path)
}
