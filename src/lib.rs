//! On-demand image preview proxy
//!
//! `GET /fill/{width}/{height}/{url}` fetches the source image, resizes it to
//! fill the requested box and serves it, keeping recent results in a bounded
//! LRU cache backed by a flat artifact directory.

pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;
pub mod web;
