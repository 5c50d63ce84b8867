//! mochi - markdown flashcard decks kept in sync with Mochi
//!
//! This crate provides the core functionality for the `mochi` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Card, Deck)
//! - [`sync`] - Deck file codec, snapshots and the three-way merge engine
//! - [`remote`] - Mochi HTTP gateway
//! - [`curation`] - Embedding dedupe and LLM grading
//! - [`validate`] - Deck file validation
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod curation;
pub mod error;
pub mod model;
pub mod remote;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
