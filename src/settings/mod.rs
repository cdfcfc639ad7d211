//! The three rewrite jobs that edit Django's generated configuration:
//! secrets extraction, INSTALLED_APPS registration, and URL inclusion.
//!
//! Each job reads the file once, builds both output buffers in memory, and
//! persists the primary buffer over the original through a temp-file rename.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::resources;
use crate::rewrite::{persist, Action, MarkerRule, RewriteJob};

/// Module the secret settings are moved into, next to `settings.py`.
pub const SECRETS_MODULE: &str = "mysecrets.py";

const SECRETS_IMPORT: &str = "from .mysecrets import SECRET_KEY, DEBUG";

/// Moves `SECRET_KEY` and `DEBUG` out of `settings.py` into `mysecrets.py`,
/// imports them back, and replaces everything from the internationalization
/// section down with the bundled footer.
pub fn extract_secrets(pkg_dir: &Path) -> Result<()> {
    let settings_path = pkg_dir.join("settings.py");

    let job = RewriteJob::new(vec![
        MarkerRule::contains("SECRET_KEY =", Action::Divert).required(),
        MarkerRule::contains(
            "import os",
            Action::CopyThenAppend(vec![SECRETS_IMPORT.to_string()]),
        )
        .required(),
        MarkerRule::contains("DEBUG", Action::Divert),
        MarkerRule::contains("Internationalization", Action::Stop),
    ])
    .with_footer(resources::SETTINGS_FOOTER);

    let out = job
        .run_on_file(&settings_path)
        .with_context(|| format!("Failed to extract secrets from {}", settings_path.display()))?;

    let secrets_path = pkg_dir.join(SECRETS_MODULE);
    let mut secrets = out.secondary.join("\n");
    secrets.push('\n');
    fs::write(&secrets_path, secrets)
        .with_context(|| format!("Failed to write {}", secrets_path.display()))?;

    persist(&settings_path, &out.primary)
}

/// Appends `'{app}',` to the INSTALLED_APPS list in `settings.py`.
pub fn install_app(pkg_dir: &Path, app_name: &str) -> Result<()> {
    let settings_path = pkg_dir.join("settings.py");

    let job = RewriteJob::new(vec![MarkerRule::contains(
        "INSTALLED_APPS",
        Action::CopyThenAppend(vec![format!("    '{}',", app_name)]),
    )
    .required()]);

    let out = job
        .run_on_file(&settings_path)
        .with_context(|| format!("Failed to install {} in {}", app_name, settings_path.display()))?;

    persist(&settings_path, &out.primary)
}

/// Routes `{app}/` into the app's namespaced urls module in the project's
/// `urls.py`, upgrading the import line to also bring in `include`.
pub fn include_urls(pkg_dir: &Path, app_name: &str) -> Result<()> {
    let urls_path = pkg_dir.join("urls.py");

    // The import rule stays optional: once a first app has been wired the
    // line already reads `path, include` and legitimately never matches again.
    let job = RewriteJob::new(vec![
        MarkerRule::exact(
            "from django.urls import path",
            Action::ReplaceWith(vec!["from django.urls import path, include".to_string()]),
        ),
        MarkerRule::contains(
            "]",
            Action::PrependThenCopy(vec![format!(
                "    path('{}/', include('{}.urls')),",
                app_name, app_name
            )]),
        )
        .required(),
    ]);

    let out = job
        .run_on_file(&urls_path)
        .with_context(|| format!("Failed to route {} in {}", app_name, urls_path.display()))?;

    persist(&urls_path, &out.primary)
}
