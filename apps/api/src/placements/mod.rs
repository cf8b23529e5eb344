pub mod handlers;
pub mod spreadsheet;
pub mod stats;
