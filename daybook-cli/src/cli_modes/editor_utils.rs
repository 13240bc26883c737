use anyhow::{Context, Result};
use std::{fs, io::Write, path::Path, process::Command};

pub fn resolve_editor(editor: &Option<String>) -> String {
    editor
        .as_deref()
        .map(str::to_string)
        .or_else(|| std::env::var("VISUAL").ok())
        .or_else(|| std::env::var("EDITOR").ok())
        .unwrap_or_else(|| "vim".into())
}

/// Opens `editor_cmd` on a temporary file seeded with `initial` and returns what was saved.
pub fn create_editor_buffer(editor_cmd: &str, initial: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("daybook")
        .suffix(".md")
        .tempfile()
        .context("creating editor buffer")?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    let path = file.path().to_path_buf();
    open_file_in_editor(editor_cmd, &path)?;
    Ok(fs::read_to_string(&path)?)
}

fn open_file_in_editor(editor_cmd: &str, path: &Path) -> Result<()> {
    let status = Command::new(editor_cmd)
        .arg(path)
        .status()
        .with_context(|| format!("launching editor {editor_cmd:?}"))?;
    if !status.success() {
        anyhow::bail!("Editor exited with status {}", status);
    }
    Ok(())
}
