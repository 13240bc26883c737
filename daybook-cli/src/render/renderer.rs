use super::theme::OneDark;
use daybook_core::{
    EntryIndex, JournalEntry, JournalEntryWithBody, StoreError, Tag, TagOperationReport, TagStats,
    WriteStatus, dates::date_key,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use termimad::{
    MadSkin,
    crossterm::style::{Color, Stylize},
};

static BLOCK_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|blockquote)>").expect("valid regex"));
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Clone)]
pub struct RenderOptions {
    pub date_format: String,
    pub use_color: bool,
}

pub struct Renderer {
    skin: MadSkin,
    opts: RenderOptions,
}

impl Renderer {
    pub fn new(config: Option<RenderOptions>) -> Self {
        Self {
            skin: OneDark::skin(),
            opts: config.unwrap_or(RenderOptions {
                date_format: "%a, %d %b %Y".to_string(),
                use_color: true,
            }),
        }
    }

    pub fn print_md(&self, md: &str) {
        if self.opts.use_color {
            self.skin.print_text(md);
        } else {
            println!("{md}");
        }
    }

    pub fn print_info(&self, message: &str) {
        if self.opts.use_color {
            println!("{}", message.with(OneDark::COMMENT));
        } else {
            println!("{message}");
        }
    }

    pub fn print_entry_line(&self, entry: &JournalEntry) {
        let mut date = date_key(entry.date);
        let mut mood = format!("({})", entry.mood);
        let mut title = entry.title.clone();
        let mut tags = String::new();
        if !entry.tags.is_empty() {
            tags = format!("[{}]", join_tags(&entry.tags));
        }
        if self.opts.use_color {
            date = date.with(Color::Cyan).to_string();
            mood = mood.with(Color::Blue).to_string();
            title = title.with(Color::Yellow).to_string();
            tags = tags.with(Color::Green).to_string();
        }
        println!("{date} {mood} {title} {tags}");
    }

    pub fn print_entries(&self, entries: &EntryIndex) {
        for entry in entries.values() {
            self.print_entry_line(entry);
        }
    }

    pub fn print_entry(&self, record: &JournalEntryWithBody) {
        let entry = &record.entry;
        let date = entry.date.format(&self.opts.date_format);
        let mut md = format!("## {date}: {}\n", entry.title.trim());

        let mut meta = format!("*{}*", entry.mood);
        if !entry.tags.is_empty() {
            let tags: Vec<String> = entry.tags.iter().map(|t| format!("`{t}`")).collect();
            meta.push_str(&format!(" · {}", tags.join(" ")));
        }
        md.push_str(&meta);
        md.push('\n');

        if let Some(context) = &entry.weather_context {
            md.push_str(&format!(
                "> {}, {} · {} {:.0}°\n",
                context.location.city,
                context.location.country,
                context.weather.description,
                context.weather.temp
            ));
        }

        let body = plain_text(&record.body);
        if !body.is_empty() {
            md.push('\n');
            md.push_str(&body);
            md.push('\n');
        }
        self.print_md(&md);
    }

    pub fn print_tag_stats(&self, stats: &BTreeMap<Tag, TagStats>) {
        let mut md = String::from("|:-|:-:|:-|\n|**tag**|**entries**|**last used**|\n|-|-|-|\n");
        for (tag, stat) in stats {
            let last_used = date_key(stat.last_used.date_naive());
            md.push_str(&format!("|{tag}|{}|{last_used}|\n", stat.count));
        }
        md.push_str("|-|-|-|\n");
        if self.opts.use_color {
            self.skin.print_text(&md);
        } else {
            for (tag, stat) in stats {
                println!("{tag}\t{}", stat.count);
            }
        }
    }

    pub fn print_report(&self, report: &TagOperationReport) {
        for outcome in &report.outcomes {
            let date = date_key(outcome.date);
            match &outcome.status {
                WriteStatus::Written => self.print_info(&format!("updated {date}")),
                WriteStatus::Missing => self.print_info(&format!("skipped {date}: entry no longer exists")),
                WriteStatus::Failed(error) => self.print_md(&format!("* **{date}**: {error}")),
            }
        }
    }

    pub fn print_errors(&self, errors: &[StoreError]) {
        if errors.is_empty() {
            return;
        }
        self.print_md("\n# Skipped:");
        for error in errors {
            self.print_md(&format!("* {error}"));
        }
    }
}

fn join_tags(tags: &[Tag]) -> String {
    tags.iter().map(Tag::as_str).collect::<Vec<_>>().join(", ")
}

/// Renders stored markup as terminal text: block ends become line breaks, other tags go.
fn plain_text(markup: &str) -> String {
    let with_breaks = BLOCK_END.replace_all(markup, "\n");
    let text = MARKUP.replace_all(&with_breaks, "");
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
