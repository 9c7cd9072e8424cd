//! Emisión de tokens de calificación
//!
//! Tokens opacos de 32 bytes aleatorios codificados en base64 URL-safe,
//! válidos durante un TTL configurable y de un solo uso.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::models::rating::NewRatingLink;

pub const TOKEN_BYTES: usize = 32;

/// Genera un token aleatorio URL-safe
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Nuevo enlace que vence `ttl_hours` después de `now`
pub fn new_link(now: DateTime<Utc>, ttl_hours: i64) -> NewRatingLink {
    NewRatingLink {
        token: generate_token(),
        created_at: now,
        expires_at: now + Duration::hours(ttl_hours),
    }
}

/// URL pública del formulario de calificación
pub fn rating_url(base_url: &str, token: &str) -> String {
    format!("{}/rate/{}", base_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_url_safe_and_unique() {
        let first = generate_token();
        let second = generate_token();
        assert_ne!(first, second);
        // 32 bytes sin padding
        assert_eq!(first.len(), 43);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_link_expiry() {
        let now = Utc::now();
        let link = new_link(now, 168);
        assert_eq!(link.created_at, now);
        assert_eq!(link.expires_at - now, Duration::days(7));
    }

    #[test]
    fn test_rating_url() {
        assert_eq!(
            rating_url("http://localhost:5173/", "abc"),
            "http://localhost:5173/rate/abc"
        );
        assert_eq!(rating_url("https://lavado.mx", "xyz"), "https://lavado.mx/rate/xyz");
    }
}
