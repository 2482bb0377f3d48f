//! E-commerce core - shared types library.
//!
//! This crate provides the types shared by every component of the workspace:
//! - `api` - The HTTP service and its stores
//! - `cli` - Command-line tools for migrations, seeding and resets
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps validation usable from both the server and the
//! CLI seeder.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`validation`] - Field-level checks over untyped JSON payloads
//! - [`input`] - Validated field sets accepted by the stores

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod input;
pub mod types;
pub mod validation;

pub use input::{NewOrder, NewProduct, NewUser, OrderChanges};
pub use types::*;
pub use validation::{FromPayload, ValidationErrors};
