// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route Prefix: /auth/*, /products/*, /health
// Middleware: none by default. Product writes pick up the auth and admin
// gates when CATALOG_REQUIRE_ADMIN_FOR_WRITES is enabled.

pub mod auth;
pub mod health;
pub mod products;

pub use health::health;
