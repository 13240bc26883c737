use anyhow::{Result, bail};
use daybook_core::{Config, FsDirectory, FsPicker, Readiness, Session};
use std::path::PathBuf;

/// Journal directory from `--dir`, falling back to the config file.
pub fn journal_dir(cli_dir: &Option<PathBuf>, config: &Config) -> PathBuf {
    cli_dir.clone().unwrap_or_else(|| config.journal_dir.clone())
}

/// Opens the journal at `dir` and insists on a profile being present.
pub async fn open_ready(dir: PathBuf) -> Result<Session<FsDirectory>> {
    tracing::debug!(dir = %dir.display(), "opening journal");
    let mut session = Session::new();
    let readiness = session.choose_directory(&FsPicker { path: Some(dir.clone()) }).await?;
    match readiness {
        Readiness::Ready => Ok(session),
        Readiness::AwaitingProfile => {
            bail!("no journal in {} yet; run `daybook init --name <name>` first", dir.display())
        }
        Readiness::PermissionNeeded => bail!("cannot access {}", dir.display()),
        Readiness::Uninitialized => bail!("no journal directory selected"),
    }
}
