//! # Kosan Pekanbaru API Server Library
//!
//! Boarding-house marketplace backend: paid owner registration, session
//! authentication, owner listing management and the public catalogue.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Page guard and security headers
//! - `payment`: Payment gateway abstraction and Midtrans Snap client
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod payment;
pub mod routes;
