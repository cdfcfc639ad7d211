//! Static resource bundle copied verbatim into generated projects.

use anyhow::{Context, Result};
use include_dir::{include_dir, Dir, DirEntry};
use std::fs;
use std::path::Path;

/// Tail of `settings.py`, appended after the secrets extraction cuts the
/// generated file at the internationalization section.
pub static SETTINGS_FOOTER: &str = include_str!("settings_footer.txt");

/// Header and footer wrapped around `app_name = '<app>'` in each generated
/// per-app `urls.py`.
pub static APP_URLS_HEADER: &str = include_str!("app_urls_header.txt");
pub static APP_URLS_FOOTER: &str = include_str!("app_urls_footer.txt");

/// Empty base markup template for a new app's templates directory.
pub static BASE_HTML: &str = include_str!("base.html");

pub static GITIGNORE: &str = include_str!("gitignore.txt");
pub static REQUIREMENTS: &str = include_str!("requirements.txt");

/// Content of the `makemigrations`/`migrate`/`runserver`/`createsuperuser`
/// placeholder files touched into the project root.
pub static TOUCH_PLACEHOLDER: &str = include_str!("touch_placeholder.txt");

/// Replacement for the project `urls.py`, routing `/` into the ui app.
pub static MAIN_URLS: &str = include_str!("main_urls.py");

/// Replacement for `ui/views.py`, rendering the bundled index page.
pub static UI_VIEWS: &str = include_str!("ui_views.py");

/// Prebuilt ui application tree (templates and static assets), overlaid on
/// the scaffolded ui app.
static UI_APP: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/resources/ui");

/// Writes the embedded ui tree under `dest`, creating directories as needed.
/// Existing files are overwritten.
pub fn write_ui_app(dest: &Path) -> Result<()> {
    write_dir(&UI_APP, dest)
}

// Embedded paths are relative to the included root, so nested files land in
// the right place without tracking the recursion depth.
fn write_dir(dir: &'static Dir, dest: &Path) -> Result<()> {
    for entry in dir.entries() {
        match entry {
            DirEntry::File(file) => {
                let target = dest.join(file.path());
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory {}", parent.display())
                    })?;
                }
                fs::write(&target, file.contents())
                    .with_context(|| format!("Failed to write {}", target.display()))?;
            }
            DirEntry::Dir(subdir) => write_dir(subdir, dest)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_footer_defines_expected_settings() {
        for key in ["LANGUAGE_CODE", "TIME_ZONE", "STATIC_URL", "DEFAULT_AUTO_FIELD"] {
            assert!(SETTINGS_FOOTER.contains(key), "footer is missing {}", key);
        }
    }

    #[test]
    fn test_app_urls_pieces_assemble_into_valid_module() {
        assert!(APP_URLS_HEADER.contains("from django.urls import path"));
        assert!(APP_URLS_FOOTER.contains("urlpatterns = ["));
    }

    #[test]
    fn test_gitignore_hides_secrets_and_venv() {
        assert!(GITIGNORE.contains("mysecrets.py"));
        assert!(GITIGNORE.contains("venv/"));
    }

    #[test]
    fn test_ui_tree_extracts() {
        let dir = tempfile::tempdir().unwrap();
        write_ui_app(dir.path()).unwrap();

        assert!(dir.path().join("templates/ui/index.html").exists());
        assert!(dir.path().join("static/ui/style.css").exists());
    }
}
