//! Cache Key Module
//!
//! Deterministic cache keys built from an operation prefix and a hash of the
//! normalized request parameters.

use std::fmt;

use sha2::{Digest, Sha256};

/// Prefix for geocoding results.
pub const GEOCODE_PREFIX: &str = "geocode";
/// Prefix for route results.
pub const ROUTE_PREFIX: &str = "route";

// Keeps ("a b", "c") and ("a", "b c") apart.
const PARAM_SEPARATOR: u8 = 0x1f;

// == Cache Key ==
/// A `prefix:hash` cache key.
///
/// Parameters are trimmed and lower-cased before hashing, so requests that
/// differ only in case or surrounding whitespace share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(prefix: &str, params: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                hasher.update([PARAM_SEPARATOR]);
            }
            hasher.update(normalize(param).as_bytes());
        }
        let hash = hex::encode(&hasher.finalize()[..16]);
        Self(format!("{}:{}", prefix, hash))
    }

    pub fn geocode(address: &str) -> Self {
        Self::new(GEOCODE_PREFIX, &[address])
    }

    pub fn route(origin: &str, destination: &str) -> Self {
        Self::new(ROUTE_PREFIX, &[origin, destination])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims and lower-cases an input parameter.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_case_and_whitespace_insensitive() {
        let a = CacheKey::geocode("  São Paulo, SP ");
        let b = CacheKey::geocode("são paulo, sp");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_has_operation_prefix() {
        assert!(CacheKey::geocode("Curitiba").as_str().starts_with("geocode:"));
        assert!(CacheKey::route("Curitiba", "Santos").as_str().starts_with(ROUTE_PREFIX));
    }

    #[test]
    fn test_route_key_is_directional() {
        assert_ne!(
            CacheKey::route("Curitiba", "Santos"),
            CacheKey::route("Santos", "Curitiba")
        );
    }

    #[test]
    fn test_param_boundaries_matter() {
        assert_ne!(
            CacheKey::new("route", &["a b", "c"]),
            CacheKey::new("route", &["a", "b c"])
        );
    }

    #[test]
    fn test_prefixes_do_not_collide() {
        assert_ne!(
            CacheKey::new(GEOCODE_PREFIX, &["x"]),
            CacheKey::new(ROUTE_PREFIX, &["x"])
        );
    }
}
