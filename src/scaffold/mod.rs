//! Project and app bootstrap orchestration. Every operation takes explicit
//! paths; the process working directory is read once in main and never
//! mutated, child processes get their working directory via `current_dir`.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::cfg::Config;
use crate::resources;
use crate::settings;
use crate::ui;
use crate::vcs;
use crate::venv::{self, Venv};

/// Presence of this file marks a directory as an existing project root.
pub const PROJECT_SENTINEL: &str = "manage.py";

/// manage.py subcommands touched as empty placeholder files so shells offer
/// them for tab completion.
const TOUCH_COMMANDS: [&str; 4] = ["makemigrations", "migrate", "runserver", "createsuperuser"];

/// Path separators are stripped from app names before any filesystem use,
/// so `a/b` becomes an app literally named `ab`.
pub fn sanitize_app_name(name: &str) -> String {
    name.chars().filter(|c| *c != '/' && *c != '\\').collect()
}

fn project_package_dir(project_dir: &Path) -> Result<PathBuf> {
    let name = project_dir
        .file_name()
        .with_context(|| format!("{} has no directory name", project_dir.display()))?;
    Ok(project_dir.join(name))
}

/// Full project bootstrap: venv, packages, django-admin scaffold, gitignore,
/// command placeholders, secrets extraction, the prebuilt ui app, migrations,
/// and an initial git commit.
///
/// No-ops with a status message if `root` already holds a project or a
/// directory named `name` already exists.
pub fn create_project(root: &Path, name: &str, config: &Config) -> Result<()> {
    if root.join(PROJECT_SENTINEL).is_file() {
        ui::progress("manage.py found in this directory, will not create new project.");
        return Ok(());
    }

    let project_dir = root.join(name);
    if project_dir.is_dir() {
        ui::progress("Project already exists. Aborting.");
        return Ok(());
    }

    fs::create_dir(&project_dir)
        .with_context(|| format!("Failed to create {}", project_dir.display()))?;

    ui::progress("Creating venv");
    let venv = Venv::at(&project_dir, &config.general.venv_dir);
    if venv.exists() {
        ui::progress("venv already exists");
    } else {
        venv::create(&project_dir, &config.general.python, &config.general.venv_dir)?;
    }

    ui::progress("Upgrading pip");
    venv::upgrade_pip(&venv, &project_dir)?;

    ui::progress("Installing packages with pip");
    let manifest = materialize_requirements()?;
    venv::install_requirements(&venv, &project_dir, manifest.path())?;

    ui::progress("Running django-admin");
    venv::run_checked(
        Command::new(venv.django_admin())
            .args(["startproject", name, ".", "--verbosity", "2"])
            .current_dir(&project_dir),
        "project scaffold",
    )?;

    ui::progress("Copying .gitignore");
    fs::write(project_dir.join(".gitignore"), resources::GITIGNORE)?;

    ui::progress("Touching manage.py commands: makemigrations, migrate, runserver");
    for command in TOUCH_COMMANDS {
        fs::write(project_dir.join(command), resources::TOUCH_PLACEHOLDER)?;
    }

    ui::progress("Extracting secrets");
    let pkg_dir = project_dir.join(name);
    settings::extract_secrets(&pkg_dir)?;

    ui::progress("Generating ui app");
    create_app(&project_dir, "ui", config, false)?;
    resources::write_ui_app(&project_dir.join("ui"))?;

    ui::progress("Substituting project's urls.py");
    fs::write(pkg_dir.join("urls.py"), resources::MAIN_URLS)?;

    ui::progress("Copying ui/views.py");
    fs::write(project_dir.join("ui").join("views.py"), resources::UI_VIEWS)?;

    ui::progress("Migrating default apps");
    venv::run_checked(
        Command::new(venv.python())
            .args(["manage.py", "migrate"])
            .current_dir(&project_dir),
        "database migration",
    )?;

    ui::progress("Creating an initial Git repository. Add remote and push manually.");
    vcs::init_repo(&project_dir)?;

    ui::progress("End of proj creation");
    println!();
    ui::progress("Now, run these commands:");
    ui::progress(&format!("cd {}", name));
    if cfg!(windows) {
        ui::progress("source venv/Scripts/activate");
    } else {
        ui::progress("source venv/bin/activate");
    }
    ui::progress("python manage.py createsuperuser");

    if let Some(username) = &config.github.username {
        ui::hint(&format!(
            "git remote add origin git@github.com:{}/{}.git",
            username, name
        ));
    }

    Ok(())
}

/// Creates one app inside an existing project: `manage.py startapp`, a
/// namespaced `urls.py`, URL inclusion and INSTALLED_APPS registration, and
/// optionally a namespaced templates directory with an empty base.html.
///
/// No-ops with a status message if the app directory already exists.
pub fn create_app(
    project_dir: &Path,
    raw_name: &str,
    config: &Config,
    create_templates: bool,
) -> Result<()> {
    let app_name = sanitize_app_name(raw_name);

    let app_dir = project_dir.join(&app_name);
    if app_dir.is_dir() {
        ui::progress("App already exists. Aborting.");
        return Ok(());
    }

    ui::progress(&format!(
        "Creating new app {} in {}",
        app_name,
        project_dir.display()
    ));

    let venv = Venv::at(project_dir, &config.general.venv_dir);
    venv::run_checked(
        Command::new(venv.python())
            .args(["manage.py", "startapp", &app_name, "-v", "2"])
            .current_dir(project_dir),
        "app scaffold",
    )?;

    ui::progress(&format!("Creating {}/urls.py", app_name));
    write_app_urls(&app_dir, &app_name)?;

    let pkg_dir = project_package_dir(project_dir)?;
    settings::include_urls(&pkg_dir, &app_name)?;

    ui::progress("Installing app in settings.py");
    settings::install_app(&pkg_dir, &app_name)?;

    if create_templates {
        ui::progress("Creating templates directory");
        let template_dir = app_dir.join("templates").join(&app_name);
        fs::create_dir_all(&template_dir)
            .with_context(|| format!("Failed to create {}", template_dir.display()))?;
        fs::write(template_dir.join("base.html"), resources::BASE_HTML)?;
    }

    ui::progress("End of app creation");
    Ok(())
}

fn write_app_urls(app_dir: &Path, app_name: &str) -> Result<()> {
    let urls_path = app_dir.join("urls.py");
    let mut urls = String::new();
    urls.push_str(resources::APP_URLS_HEADER);
    urls.push_str(&format!("app_name = '{}'\n\n", app_name));
    urls.push_str(resources::APP_URLS_FOOTER);

    fs::write(&urls_path, urls)
        .with_context(|| format!("Failed to write {}", urls_path.display()))
}

/// Writes the embedded requirements manifest to a temp file so pip can read
/// it from disk. The handle keeps the file alive until installation is done.
fn materialize_requirements() -> Result<tempfile::NamedTempFile> {
    let mut manifest =
        tempfile::NamedTempFile::new().context("Failed to create requirements temp file")?;
    manifest.write_all(resources::REQUIREMENTS.as_bytes())?;
    manifest.flush()?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::Config;

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize_app_name("a/b"), "ab");
        assert_eq!(sanitize_app_name("..\\evil"), "..evil");
        assert_eq!(sanitize_app_name("blog"), "blog");
    }

    #[test]
    fn test_create_project_noops_inside_existing_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_SENTINEL), "").unwrap();

        create_project(dir.path(), "mysite", &Config::default()).unwrap();

        // Nothing was scaffolded.
        assert!(!dir.path().join("mysite").exists());
    }

    #[test]
    fn test_create_project_noops_when_directory_exists() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("mysite")).unwrap();

        create_project(dir.path(), "mysite", &Config::default()).unwrap();

        // The existing directory is left untouched.
        assert_eq!(
            fs::read_dir(dir.path().join("mysite")).unwrap().count(),
            0
        );
    }

    #[test]
    fn test_create_app_noops_when_app_directory_exists() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("ab")).unwrap();

        // Sanitization happens before the existence check, so a/b aborts on
        // the ab directory without ever reaching the venv interpreter.
        create_app(dir.path(), "a/b", &Config::default(), true).unwrap();

        assert!(!dir.path().join("ab").join("urls.py").exists());
    }

    #[test]
    fn test_app_urls_module_shape() {
        let dir = tempfile::tempdir().unwrap();
        write_app_urls(dir.path(), "blog").unwrap();

        let urls = fs::read_to_string(dir.path().join("urls.py")).unwrap();
        assert!(urls.starts_with("from django.urls import path"));
        assert!(urls.contains("app_name = 'blog'"));
        assert!(urls.contains("urlpatterns = ["));
    }
}
