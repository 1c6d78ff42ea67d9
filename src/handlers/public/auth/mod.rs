// handlers/public/auth/mod.rs - Account registration and token acquisition

pub mod login;
pub mod register;

pub use login::login;
pub use register::register;
