// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Route Prefix: /orders/*
// Middleware: require_auth. Handlers take an `Identity` extractor for the caller.

pub mod orders;

pub use orders::{create_order, my_orders};
