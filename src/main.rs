use anyhow::{Context, Result};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Parser, Subcommand};

use djstrap::{cfg, scaffold, ui};

const USAGE: &str = "Usage: djstrap COMMAND ARGS";
const VALID_COMMANDS: &str = "Valid commands: proj, app, startproject, startapp";

/// djstrap - Bootstrap Django projects: venv, secrets, apps, URLs, templates
#[derive(Parser)]
#[command(name = "djstrap")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap a new project in the current directory
    #[command(alias = "startproject")]
    Proj {
        /// Name of the project (and of its directory)
        project_name: String,

        /// Trailing arguments are accepted and ignored
        #[arg(hide = true)]
        extra: Vec<String>,
    },

    /// Create one or more apps in the current project
    #[command(alias = "startapp")]
    App {
        /// App names; path separators are stripped
        #[arg(required = true)]
        app_names: Vec<String>,
    },
}

fn main() {
    ui::init();

    // Dispatch on argument count before looking at the command: anything
    // shorter than COMMAND plus one argument gets the usage notice, even a
    // lone unknown command. Wrapper scripts rely on this precedence.
    if std::env::args().len() < 3 {
        println!("{}", USAGE);
        println!("{}", VALID_COMMANDS);
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Misuse is reported on stdout and exits 0; scripts wrapping the
        // original tool rely on that.
        Err(err) => {
            report_usage(err);
            return;
        }
    };

    if let Err(e) = run(cli) {
        ui::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn report_usage(err: clap::Error) {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
        }
        ErrorKind::InvalidSubcommand => {
            let unknown = err
                .get(ContextKind::InvalidSubcommand)
                .and_then(|value| match value {
                    ContextValue::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .unwrap_or("");
            println!("Unknown command {}", unknown);
            println!("{}", VALID_COMMANDS);
        }
        _ => {
            println!("{}", USAGE);
            println!("{}", VALID_COMMANDS);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config = cfg::load(&cwd)?;

    match cli.command {
        Commands::Proj { project_name, .. } => {
            scaffold::create_project(&cwd, &project_name, &config)
        }
        Commands::App { app_names } => {
            for name in &app_names {
                scaffold::create_app(&cwd, name, &config, config.general.app_templates)?;
            }
            Ok(())
        }
    }
}
