use crate::{cli::TagCommand, render::Renderer};
use anyhow::Result;
use daybook_core::{FsDirectory, Session, Tag, TagOperationReport, tag::parse_tag_list};

/// Runs a rename/delete/merge across the journal and reports every touched entry.
/// A partially applied batch is an error; running the same command again finishes it.
pub async fn tag_mode(
    command: &TagCommand,
    renderer: &Renderer,
    session: &mut Session<FsDirectory>,
) -> Result<()> {
    let report: TagOperationReport = match command {
        TagCommand::Rename { old, new } => {
            session.rename_tag(&Tag::parse(old)?, &Tag::parse(new)?).await?
        }
        TagCommand::Delete { tag } => session.delete_tag(&Tag::parse(tag)?).await?,
        TagCommand::Merge { sources, into } => {
            session
                .merge_tags(&parse_tag_list(sources), &Tag::parse(into)?)
                .await?
        }
    };

    if report.outcomes.is_empty() {
        renderer.print_info("No entries carry that tag.");
        return Ok(());
    }
    renderer.print_report(&report);
    let report = report.into_result()?;
    renderer.print_info(&format!("{} entries updated.", report.written().len()));
    Ok(())
}
