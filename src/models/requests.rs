//! Request DTOs for the resolution API
//!
//! All inputs arrive as query-string parameters. Missing text parameters
//! deserialize as empty strings so the resolvers report them as invalid
//! input with the usual JSON error body.

use serde::Deserialize;

/// Query for `GET /geocode`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeQuery {
    #[serde(default)]
    pub address: String,
}

/// Query for `GET /route`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteQuery {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
}

/// Query for `DELETE /cache`
///
/// # Fields
/// - `prefix`: Only clear keys starting with this prefix (`geocode`, `route`);
///   everything is cleared when absent or blank
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ClearCacheQuery {
    /// The prefix to clear by, ignoring blank values.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_query_deserialize() {
        let json = r#"{"origin": "São Paulo", "destination": "Santos"}"#;
        let query: RouteQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.origin, "São Paulo");
        assert_eq!(query.destination, "Santos");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let query: RouteQuery = serde_json::from_str("{}").unwrap();
        assert!(query.origin.is_empty());
        let query: GeocodeQuery = serde_json::from_str("{}").unwrap();
        assert!(query.address.is_empty());
    }

    #[test]
    fn test_blank_prefix_means_everything() {
        let query = ClearCacheQuery {
            prefix: Some("  ".to_string()),
        };
        assert_eq!(query.prefix(), None);

        let query = ClearCacheQuery {
            prefix: Some(" route ".to_string()),
        };
        assert_eq!(query.prefix(), Some("route"));
    }
}
