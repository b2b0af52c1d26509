//! Browse a git repository as a directories-first file tree annotated with
//! working tree status.

pub mod app;
pub mod cli;
pub mod config;
pub mod git;
pub mod models;
