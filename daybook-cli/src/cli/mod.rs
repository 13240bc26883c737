mod cli;

pub use cli::{Cli, Command, ListArgs, TagCommand, WriteArgs};
