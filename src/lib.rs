// ABOUTME: Library module for mysql-dump-curator
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod analyze;
pub mod assemble;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod mysql;
pub mod plan;
pub mod utils;
