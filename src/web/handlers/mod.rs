//! HTTP request handlers organized by endpoint group

pub mod cache;
pub mod fill;
pub mod health;
