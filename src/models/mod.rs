//! Data models for the GlassLib server

pub mod book;
pub mod borrow_request;
pub mod fine;
pub mod loan;
pub mod profile;
pub mod setting;
