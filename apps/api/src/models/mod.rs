pub mod career;
pub mod catalog;
pub mod chat;
pub mod placement;
pub mod resume;
pub mod review;
pub mod user;
