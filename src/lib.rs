//! stanctl - Instana integration package tooling
//!
//! This crate provides the core functionality for the `stanctl-integration`
//! CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`package`] - Import/export of integration packages
//! - [`api`] - Remote HTTP client and smart alert endpoints
//! - [`lint`] - Package checks run before publishing
//! - [`scaffold`] - New package skeletons
//! - [`npm`] - npm registry operations
//! - [`config`] - Connection, logging and path settings
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod lint;
pub mod npm;
pub mod package;
pub mod scaffold;

pub use error::{Error, Result};
