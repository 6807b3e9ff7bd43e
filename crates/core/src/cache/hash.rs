//! URL fingerprints used as cache keys.

use sha2::{Digest, Sha256};

/// Compute the fixed-size cache key for a URL.
///
/// Callers pass the canonical form so that equivalent spellings of a URL
/// share one entry.
pub fn fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stability() {
        let hash1 = fingerprint("https://example.com/");
        let hash2 = fingerprint("https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_fingerprint_distinct_urls() {
        assert_ne!(fingerprint("https://example.com/a"), fingerprint("https://example.com/b"));
    }

    #[test]
    fn test_fingerprint_format() {
        let hash = fingerprint("https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_fixed_size_for_long_input() {
        let long = format!("https://example.com/{}", "x".repeat(10_000));
        assert_eq!(fingerprint(&long).len(), 64);
    }
}
