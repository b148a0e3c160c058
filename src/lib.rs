//! Techzone site console
//!
//! Backend-for-frontend for the Techzone content site: the admin gate, the
//! blog editor workflow and the listing views, all over the external
//! content API.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod models;
pub mod services;
