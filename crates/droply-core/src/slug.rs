//! Share-slug generation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;

/// Number of random bytes behind each slug. 128 bits makes collisions
/// negligible, so uniqueness is not re-checked on insert.
const SLUG_BYTES: usize = 16;

/// Generate a URL-safe, unguessable slug for a share link.
pub fn generate_slug() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; SLUG_BYTES] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_url_safe_and_fixed_length() {
        let slug = generate_slug();
        // 16 bytes -> 22 base64 chars without padding
        assert_eq!(slug.len(), 22);
        assert!(slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn slugs_do_not_repeat() {
        let a = generate_slug();
        let b = generate_slug();
        assert_ne!(a, b);
    }
}
