// src/commands/mod.rs
pub mod calculate;
pub mod export;
pub mod format;
pub mod import;
pub mod list;
pub mod report;
pub mod stats;
