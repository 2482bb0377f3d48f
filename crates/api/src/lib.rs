//! E-commerce API library.
//!
//! JSON REST API over users, products, orders and the order/product
//! association. The binary in `main.rs` only loads configuration, picks a
//! store and serves [`app::build_app`]; everything else lives here so it can
//! be tested and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
