//! Middleware del sistema
//!
//! CORS y trazas de requests HTTP.

pub mod cors;
pub mod trace;

pub use cors::*;
pub use trace::*;
