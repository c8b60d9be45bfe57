//! Timecard - A command-line time tracker that keeps its records in an HTML
//! timesheet
//!
//! This library provides the core functionality for Timecard, including:
//! - Reading and writing the timesheet document
//! - Entry model and column access
//! - Positional store and transactional ledger operations
//! - Day, week and month scope filtering
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use timecard::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repo;
pub mod utils;
