//! Core domain model for kek-archive.
//!
//! This crate defines the stable identifiers, the record shapes found in
//! the archived media-ownership JSON documents, the SQLite schema with its
//! snapshot/history tables, and the error taxonomy shared by the import
//! pipeline.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod dates;
pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
