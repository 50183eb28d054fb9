//! `tasklist` development backend library.
//!
//! Exposes the row store and its HTTP surface for use in tests and
//! embedding. The server speaks the same PostgREST-style query shapes as the
//! hosted store the client normally talks to.

pub mod config;
pub mod server;
pub mod table;
