//! Services module
//!
//! Lógica sin estado compartida por los controllers: emisión de tokens de
//! calificación y agregaciones de reportes.

pub mod rating_token;
pub mod reporting;
