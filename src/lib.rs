//! djstrap - Bootstrap Django projects the same way every time.
//!
//! This library provides the core functionality for djstrap, including:
//! - The line-marker rewriter that edits generated configuration files
//! - Secrets extraction, app installation, and URL wiring for settings/urls
//! - Virtualenv provisioning and package installation
//! - Project and app scaffolding orchestration
//! - Version control initialization
//! - The embedded static resource bundle

pub mod cfg;
pub mod resources;
pub mod rewrite;
pub mod scaffold;
pub mod settings;
pub mod ui;
pub mod vcs;
pub mod venv;
