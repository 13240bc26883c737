use crate::render::Renderer;
use anyhow::{Result, bail};
use daybook_core::{FsDirectory, FsPicker, Profile, Readiness, Session};
use std::path::PathBuf;

/// Creates (or renames) the journal profile, creating the directory if needed.
/// Settings of an existing profile other than the name are kept.
pub async fn init_mode(renderer: &Renderer, dir: PathBuf, name: &str) -> Result<()> {
    let mut session: Session<FsDirectory> = Session::new();
    let readiness = session.choose_directory(&FsPicker { path: Some(dir.clone()) }).await?;
    if readiness == Readiness::PermissionNeeded {
        bail!("cannot access {}", dir.display());
    }
    let profile = Profile {
        name: name.trim().to_string(),
        auto_weather: session.profile().and_then(|p| p.auto_weather),
    };
    session.save_profile(profile).await?;
    renderer.print_info(&format!(
        "Journal for {} ready in {} ({} entries).",
        name.trim(),
        dir.display(),
        session.index().len()
    ));
    Ok(())
}
