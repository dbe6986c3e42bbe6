pub mod format;
pub mod multipart;
pub mod validate;
