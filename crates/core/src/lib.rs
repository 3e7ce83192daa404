//! Shoplens Core - Shared types library.
//!
//! This crate provides the domain model shared across all Shoplens
//! components:
//! - `server` - Ingestion service and insights API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Tenant-scoped entities mirrored from Shopify plus the sync
//!   summary types exposed to API callers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
