//! Carlot Core - Shared types library.
//!
//! This crate provides common types used across all Carlot components:
//! - `site` - Public listings site and seller dashboard
//! - `integration-tests` - End-to-end tests against a mock backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The
//! backend assigns opaque string identifiers, so the ID newtypes here
//! wrap `String` rather than integers.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, phone numbers, and
//!   the accepted photo formats

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
