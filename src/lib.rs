// src/lib.rs

//! sitewatch: sitemap change monitoring with notification fan-out.

pub mod commands;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod models;
pub mod monitor;
pub mod notify;
pub mod registry;
pub mod scheduler;
pub mod sitemap;
pub mod store;
pub mod summary;
pub mod utils;
