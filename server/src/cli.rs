//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::app::{self, App};

/// Dashboard API for PM2-supervised apps on a remote host
#[derive(Parser)]
#[command(name = "lightdeck", version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve(ServeArgs),

    /// Load project definitions from a YAML file into the store
    Seed(SeedArgs),
}

#[derive(Args, Default)]
pub struct ServeArgs {
    /// Override LIGHTDECK_LISTEN_ADDR
    #[arg(long)]
    pub listen: Option<String>,
}

#[derive(Args)]
pub struct SeedArgs {
    /// YAML file holding a list of projects
    #[arg(long, short)]
    pub file: PathBuf,
}

impl Cli {
    /// # Errors
    ///
    /// Whatever the selected command fails with.
    pub async fn run(self) -> Result<()> {
        match self.command.unwrap_or(Command::Serve(ServeArgs::default())) {
            Command::Serve(args) => {
                let mut app = App::from_env()?;
                if let Some(listen) = args.listen {
                    app.config.listen_addr = listen;
                }
                app.serve().await
            }
            Command::Seed(args) => {
                let defs = app::load_seed_file(&args.file)?;
                let app = App::from_env()?;
                let result = app::seed_projects(&app.state.projects, defs).await;
                app.close().await;
                let summary = result?;
                tracing::info!(
                    created = summary.created.len(),
                    skipped = summary.skipped.len(),
                    "seeding complete"
                );
                Ok(())
            }
        }
    }
}
