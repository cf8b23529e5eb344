pub mod affiliates;
pub mod catalog;
pub mod notifications;
pub mod users;
