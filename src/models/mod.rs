// Core data models for the timesheet

pub mod entry;

pub use entry::*;
