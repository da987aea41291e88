mod common;

mod content;
mod dedup;
mod savings;
