pub mod canonicalize;
pub mod classify;
pub mod truncate;
