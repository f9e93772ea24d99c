//! Filter-to-query compiler for SQLite datasets
//!
//! Untrusted request parameters are validated against the live table
//! schema, translated into SQL predicates with bound values and executed
//! against a SQLite store. Served over HTTP and from the command line.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
