//! Virtualenv provisioning and package installation. All child processes run
//! synchronously with an explicit working directory; exit statuses are
//! checked and non-zero statuses propagate as errors.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::ui;

/// Handle to a project's virtualenv. Binaries are addressed directly inside
/// the venv, so the environment never needs activating.
#[derive(Debug, Clone)]
pub struct Venv {
    root: PathBuf,
}

impl Venv {
    pub fn at(project_dir: &Path, venv_dir: &str) -> Self {
        Venv {
            root: project_dir.join(venv_dir),
        }
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        self.bin_dir().join(exe("python"))
    }

    pub fn pip(&self) -> PathBuf {
        self.bin_dir().join(exe("pip"))
    }

    pub fn django_admin(&self) -> PathBuf {
        self.bin_dir().join(exe("django-admin"))
    }
}

fn exe(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Creates the venv inside `project_dir`. The caller is expected to have
/// checked `Venv::exists` first; an existing directory is an error here.
pub fn create(project_dir: &Path, python: &str, venv_dir: &str) -> Result<Venv> {
    let venv = Venv::at(project_dir, venv_dir);
    if venv.exists() {
        bail!("venv already exists at {}", venv.root.display());
    }

    which::which(python)
        .with_context(|| format!("{} not found in PATH", python))?;

    run_checked(
        Command::new(python)
            .args(["-m", "venv", venv_dir])
            .current_dir(project_dir),
        "venv creation",
    )?;

    Ok(venv)
}

pub fn upgrade_pip(venv: &Venv, project_dir: &Path) -> Result<()> {
    run_checked(
        Command::new(venv.python())
            .args(["-m", "pip", "install", "--upgrade", "pip"])
            .current_dir(project_dir),
        "pip upgrade",
    )
}

pub fn install_requirements(venv: &Venv, project_dir: &Path, manifest: &Path) -> Result<()> {
    run_checked(
        Command::new(venv.pip())
            .arg("install")
            .arg("-r")
            .arg(manifest)
            .current_dir(project_dir),
        "package installation",
    )
}

/// Runs a blocking child process behind a spinner and turns a non-zero exit
/// into an error carrying the captured stderr.
pub fn run_checked(command: &mut Command, what: &str) -> Result<()> {
    let pb = ui::spinner(what);

    let output = command
        .output()
        .with_context(|| format!("Failed to start {}", what))?;

    pb.finish_and_clear();

    if !output.status.success() {
        bail!(
            "{} failed: {}",
            what,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(())
}
