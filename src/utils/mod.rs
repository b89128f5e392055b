// src/utils/mod.rs

//! Shared utility helpers.

pub mod url;
