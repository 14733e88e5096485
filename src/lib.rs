//! Atelier - marketplace backend for independent creators
//!
//! This library provides the core functionality for the Atelier marketplace:
//! article listing, search and filtering, creator and buyer accounts, and
//! token-based authentication.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
