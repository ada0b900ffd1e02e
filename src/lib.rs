//! Sharpei: a personal task tracker.
//!
//! The store lives in [`db`] as `impl Database` blocks, one per concern
//! (categories, tasks, ordering, query, archive). [`tools`] exposes it as MCP
//! tools and [`api`] as a JSON HTTP API.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod tools;
pub mod types;
