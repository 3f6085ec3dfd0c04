//! # gpctl
//!
//! gpctl is a small command-line client for Greenplum (and any other
//! Postgres-compatible server). It checks that a connection works, bulk
//! loads CSV files with the `COPY` protocol and runs ad-hoc SQL files.
//!
//! ## Features
//!
//! - **Connection check**: `test-conn` opens and closes one connection
//! - **Bulk loading**: `load` streams a CSV file through `COPY ... FROM STDIN`,
//!   optionally truncating the target table after an interactive confirmation
//! - **Queries**: `query` runs the statement in a SQL file and writes the rows
//!   to a CSV file or prints them as a table
//!
//! Connection settings come from `~/.gpctl` (YAML) or the file given with
//! `--config`, overridden by `GPCTL_*` environment variables. The password is
//! always asked for interactively.
//!
//! ## Modules
//!
//! - `config`: settings loading and the per-invocation `Session`
//! - `db`: the connection seam and its `tokio-postgres` implementation
//! - `normalize`: typed column values and their display strings
//! - `output`: CSV and terminal table writers
//! - `prompt`: password and confirmation prompts
//! - `commands`: the `test-conn`, `load` and `query` handlers

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod normalize;
pub mod output;
pub mod prompt;

pub use config::{Session, Settings};
pub use db::DatabaseConnection;
pub use error::{Error, Result};
