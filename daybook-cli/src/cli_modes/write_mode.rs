use super::editor_utils::{create_editor_buffer, resolve_editor};
use crate::{cli::WriteArgs, render::Renderer};
use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use daybook_core::{
    EntryDraft, FsDirectory, Mood, Session, StoreError, dates::resolve_date, tag::parse_tag_list,
};
use std::str::FromStr;

/// Writes the day's entry, reusing whatever the existing entry has for fields not given.
pub async fn write_mode(
    args: &WriteArgs,
    renderer: &Renderer,
    session: &mut Session<FsDirectory>,
    editor: &Option<String>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let date = resolve_date(&args.date, today)?;
    let existing = match session.read_entry(date).await {
        Err(StoreError::CorruptEntry { name, reason }) => {
            renderer.print_info(&format!("Existing {name} is unreadable ({reason}); it will be replaced."));
            None
        }
        other => other?,
    };

    let mood = match &args.mood {
        Some(raw) => Mood::from_str(raw).with_context(|| format!("unknown mood {raw:?}"))?,
        None => existing.as_ref().map(|r| r.entry.mood).unwrap_or(Mood::Neutral),
    };
    let Some(title) = args
        .title
        .clone()
        .or_else(|| existing.as_ref().map(|r| r.entry.title.clone()))
    else {
        bail!("a new entry needs a title (--title)");
    };
    let tags = match &args.tags {
        Some(raw) => parse_tag_list(raw),
        None => existing.as_ref().map(|r| r.entry.tags.clone()).unwrap_or_default(),
    };
    let body = match &args.body {
        Some(body) => body.clone(),
        None => {
            let seed = existing.as_ref().map(|r| r.body.as_str()).unwrap_or_default();
            let text = create_editor_buffer(&resolve_editor(editor), seed)?;
            if text.trim().is_empty() && existing.is_none() {
                renderer.print_info("No entry to save, because no text was received.");
                return Ok(());
            }
            text
        }
    };

    let draft = EntryDraft {
        title,
        mood,
        tags,
        body,
        weather_context: None,
    };
    // No weather service is wired into the terminal, so entries are saved as written.
    let saved = session.save_entry(date, draft).await?;
    renderer.print_info(&format!(
        "{} entry for {}",
        if existing.is_some() { "Updated" } else { "Added" },
        saved.date
    ));
    renderer.print_entry_line(&saved);
    Ok(())
}

pub async fn delete_mode(
    date: &str,
    renderer: &Renderer,
    session: &mut Session<FsDirectory>,
) -> Result<()> {
    let date: NaiveDate = resolve_date(date, Local::now().date_naive())?;
    let existed = session.index().contains_key(&date);
    // Also clears a half-written pair that never made it into the index.
    session.delete_entry(date).await?;
    if existed {
        renderer.print_info(&format!("Deleted entry for {date}."));
    } else {
        renderer.print_info(&format!("No entry for {date}."));
    }
    Ok(())
}
