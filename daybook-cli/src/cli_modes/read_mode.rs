use crate::{cli::ListArgs, render::Renderer};
use anyhow::Result;
use chrono::Local;
use daybook_core::{
    FilterMode, FsDirectory, Session, dates::resolve_date, tag::parse_tag_list, tag_index,
};

pub async fn show_mode(date: &str, renderer: &Renderer, session: &mut Session<FsDirectory>) -> Result<()> {
    let date = resolve_date(date, Local::now().date_naive())?;
    match session.read_entry(date).await? {
        Some(record) => renderer.print_entry(&record),
        None => renderer.print_info(&format!("No entry for {date}.")),
    }
    Ok(())
}

pub async fn list_mode(args: &ListArgs, renderer: &Renderer, session: &mut Session<FsDirectory>) -> Result<()> {
    if let Some(raw) = &args.tags {
        let mode = if args.all { FilterMode::And } else { FilterMode::Or };
        session.set_selection(parse_tag_list(raw), mode);
    }
    let mut entries = session.visible_entries();
    if let Some(query) = &args.search {
        entries = tag_index::search(&entries, query);
    }

    if entries.is_empty() {
        renderer.print_info("No entries found");
    } else {
        renderer.print_info(&format!("{} entries found.", entries.len()));
        if args.long {
            for date in entries.keys() {
                if let Some(record) = session.read_entry(*date).await? {
                    renderer.print_entry(&record);
                }
            }
        } else {
            renderer.print_entries(&entries);
        }
    }
    // Records skipped when the journal was opened; no second listing needed.
    renderer.print_errors(session.skipped());
    Ok(())
}

pub fn tags_mode(renderer: &Renderer, session: &Session<FsDirectory>) -> Result<()> {
    let stats = tag_index::stats(&session.index());
    if stats.is_empty() {
        renderer.print_info("No tags found");
    } else {
        renderer.print_info(&format!("{} unique tags found.", stats.len()));
        renderer.print_tag_stats(&stats);
    }
    Ok(())
}
