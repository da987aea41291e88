pub mod multipart;
pub mod query;
