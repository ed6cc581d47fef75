//! Core abstractions for diagram processing
//!
//! This module defines the fundamental traits that diagram plugins implement,
//! together with the shared error, logging, text and geometry helpers.

pub mod chumsky_utils;
mod database;
mod detector;
mod error;
mod layout;
pub mod logging;
mod parser;
mod text;
mod types;

pub use database::*;
pub use detector::*;
pub use error::*;
pub use layout::*;
pub use logging::*;
pub use parser::*;
pub use text::*;
pub use types::*;
