//! A terminal toolbox for developers, backed by an OpenAI-compatible chat model.
//!
//! `devcli` bundles a handful of everyday tools behind a single interactive menu (or direct subcommands):
//!
//! - Conventional commit messages generated from the staged diff
//! - README and doc generation from a manifest, a source file or manual input
//! - Regex suggestions, extracted from the AI answer and validated locally
//! - An HTTP client with an AI summary of the response
//! - A large file scanner
//! - A dependency audit of `package.json` and `requirements.txt`
//! - An idle-aware activity timer

#![forbid(unsafe_code)]

pub mod ai;
pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod model;
pub mod process;
pub mod service;
pub mod utils;
