mod cli;
mod cli_modes;
mod render;

use anyhow::Result;
use cli::{Cli, Command};
use daybook_core::Config;
use render::{RenderOptions, Renderer};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("daybook: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout only carries journal output. `RUST_LOG` overrides the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::new();
    let config = Config::load()?;
    let dir = cli_modes::journal_dir(&cli.dir, &config);

    let renderer = Renderer::new(Some(RenderOptions {
        date_format: "%a, %d %b %Y".to_string(),
        use_color: cli.color.use_color(),
    }));

    match &cli.command {
        Command::Init { name } => cli_modes::init_mode(&renderer, dir, name).await,
        Command::Path => {
            println!("{}", dir.display());
            Ok(())
        }
        command => {
            let mut session = cli_modes::open_ready(dir).await?;
            match command {
                Command::Write(args) => cli_modes::write_mode(args, &renderer, &mut session, &config.editor).await,
                Command::Show { date } => cli_modes::show_mode(date, &renderer, &mut session).await,
                Command::List(args) => cli_modes::list_mode(args, &renderer, &mut session).await,
                Command::Delete { date } => cli_modes::delete_mode(date, &renderer, &mut session).await,
                Command::Tags => cli_modes::tags_mode(&renderer, &session),
                Command::Tag(tag_command) => cli_modes::tag_mode(tag_command, &renderer, &mut session).await,
                Command::Init { .. } | Command::Path => Ok(()),
            }
        }
    }
}
