//! Blob key generation.
//!
//! Keys are opaque, unique per store, and never reused. Each key is a fresh
//! UUIDv4 token (122 bits from the OS CSPRNG) combined with the requested
//! extension, so identical payloads always produce distinct keys.

use uuid::Uuid;

/// Generate a fresh key for the given extension hint.
///
/// The extension is normalized first; an empty hint yields a bare token.
pub fn generate(extension: &str) -> String {
    format!("{}{}", Uuid::new_v4().simple(), normalize_extension(extension))
}

/// Normalize an extension hint: empty stays empty, anything else gains a
/// leading dot if missing.
pub fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_carry_the_extension() {
        let key = generate(".txt");
        assert!(key.ends_with(".txt"));
        assert_eq!(key.len(), 32 + 4);
    }

    #[test]
    fn missing_dot_is_added() {
        assert_eq!(normalize_extension("png"), ".png");
        assert_eq!(normalize_extension(".png"), ".png");
        assert_eq!(normalize_extension(""), "");
    }

    #[test]
    fn empty_extension_yields_bare_token() {
        let key = generate("");
        assert_eq!(key.len(), 32);
        assert!(!key.contains('.'));
    }

    #[test]
    fn keys_are_unique() {
        let a = generate(".bin");
        let b = generate(".bin");
        assert_ne!(a, b);
    }
}
