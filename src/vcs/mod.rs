use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

pub fn check_git() -> Result<()> {
    let output = Command::new("git")
        .arg("--version")
        .output()
        .context("Git not found")?;

    if !output.status.success() {
        bail!("Git command failed");
    }

    Ok(())
}

/// Initializes a repository in the scaffolded project and commits everything
/// in one initial commit. Remote setup stays manual.
pub fn init_repo(project_dir: &Path) -> Result<()> {
    if project_dir.join(".git").exists() {
        return Ok(());
    }

    check_git()?;

    run_git(project_dir, &["init"])?;
    run_git(project_dir, &["add", "."])?;
    run_git(project_dir, &["commit", "-m", "Initial project scaffold"])?;

    Ok(())
}

fn run_git(project_dir: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(project_dir)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn git_available() -> bool {
        which::which("git").is_ok()
    }

    #[test]
    fn test_init_repo_creates_initial_commit() {
        if !git_available() {
            println!("Skipping test: git not installed");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("manage.py"), "#!/usr/bin/env python\n").unwrap();

        // Commit identity may be unset on CI machines.
        let configured = Command::new("git")
            .args(["config", "--global", "user.email"])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if !configured {
            println!("Skipping test: git identity not configured");
            return;
        }

        init_repo(dir.path()).unwrap();
        assert!(dir.path().join(".git").exists());

        // Idempotent once a repo exists.
        init_repo(dir.path()).unwrap();
    }
}
