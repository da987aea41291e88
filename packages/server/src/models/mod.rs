pub mod entry;
pub mod shared;
