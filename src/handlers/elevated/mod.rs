// handlers/elevated/mod.rs - Elevated handlers (ADMIN bearer token required)
//
// Route Prefix: /admin/*
// Middleware: require_auth, then require_admin. Rejected requests never reach
// a handler, so nothing here is mutated on their behalf.

pub mod admin;

pub use admin::{list_orders, list_users, set_user_role, stats};
