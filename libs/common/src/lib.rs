//! Common library for the user authentication service
//!
//! This crate provides the infrastructure shared by the service binaries:
//! PostgreSQL connection pooling and the database error taxonomy.

pub mod database;
pub mod error;
