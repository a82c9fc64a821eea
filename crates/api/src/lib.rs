//! HTTP API over the inventory sync core.

pub mod app;
pub mod config;
