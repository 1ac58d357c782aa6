//! # Kosan Shared Library
//!
//! Domain types, persistence and authentication primitives for the kosan
//! listing service. The HTTP surface lives in `kosan-api`.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, session tokens, session extraction, ownership
//! - `db`: Connection pool and migrations
//! - `models`: Users, pending registrations and listings
//! - `phone`: WhatsApp number normalization

pub mod auth;
pub mod db;
pub mod models;
pub mod phone;
