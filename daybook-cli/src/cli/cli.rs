use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::render::ColorMode;

/// daybook: one entry per day, stored as plain files
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Journal directory to use instead of the configured one.
    #[arg(long, global = true, env = "DAYBOOK_DIR")]
    pub dir: Option<PathBuf>,
    /// Control ANSI colors in output.
    /// By default, colors are disabled when output is redirected (e.g with `>` or `|`).
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates the journal profile (e.g. `daybook init --name Ada`)
    Init {
        #[arg(long)]
        name: String,
    },
    /// Prints the journal directory
    Path,
    /// Writes the entry for a day. Opens your $EDITOR when no text is given.
    /// eg. `daybook write yesterday -t "Long walk" -m peaceful --tags outdoors`
    Write(WriteArgs),
    /// Shows the full entry for a day (e.g. `daybook show today`)
    Show { date: String },
    /// Lists entries, optionally narrowed by tags or a search term
    List(ListArgs),
    /// Deletes the entry for a day
    Delete { date: String },
    /// Prints every tag with its usage
    Tags,
    /// Renames, deletes or merges tags across all entries
    #[command(subcommand)]
    Tag(TagCommand),
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Day to write (`YYYY-MM-DD`, `today`, `yesterday`, `tomorrow`).
    #[arg(default_value = "today")]
    pub date: String,
    #[arg(long, short)]
    pub title: Option<String>,
    /// One of peaceful, content, neutral, reflective, heavy.
    #[arg(long, short)]
    pub mood: Option<String>,
    /// Replaces the entry's tags (e.g., `--tags dogs "long walks"`)
    #[arg(long, num_args(1..))]
    pub tags: Option<Vec<String>>,
    /// Body text. Skips the editor.
    #[arg(long, short)]
    pub body: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only entries carrying these tags (any of them, or all with `--all`).
    #[arg(long, short, num_args(1..))]
    pub tags: Option<Vec<String>>,
    /// Require every tag given with `--tags`.
    #[arg(long, requires = "tags")]
    pub all: bool,
    /// Case-insensitive match on titles and tags.
    #[arg(long, short)]
    pub search: Option<String>,
    /// Prints the bodies too.
    #[arg(long)]
    pub long: bool,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// `daybook tag rename walks hiking`
    Rename { old: String, new: String },
    /// Removes a tag from every entry
    Delete { tag: String },
    /// Folds the source tags into the target (e.g. `daybook tag merge dog dogs --into pets`)
    Merge {
        #[arg(required = true, num_args(1..))]
        sources: Vec<String>,
        #[arg(long)]
        into: String,
    },
}

impl Cli {
    pub fn new() -> Self {
        Cli::parse()
    }
}
