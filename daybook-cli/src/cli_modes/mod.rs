mod editor_utils;
mod init_mode;
mod journal;
mod read_mode;
mod tag_mode;
mod write_mode;

pub use init_mode::init_mode;
pub use journal::{journal_dir, open_ready};
pub use read_mode::{list_mode, show_mode, tags_mode};
pub use tag_mode::tag_mode;
pub use write_mode::{delete_mode, write_mode};
