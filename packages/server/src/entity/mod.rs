pub mod content;
pub mod entry;
