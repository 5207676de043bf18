//! UUID utilities

use uuid::Uuid;

use crate::{Error, Result};

/// Generate a new UUIDv4 in its stored (hyphenated string) form
pub fn generate_string() -> String {
    Uuid::new_v4().to_string()
}

/// Parse an id (stored column or request path segment) into a UUID
pub fn parse(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::InvalidInput(format!("Invalid UUID '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_strings_parse() {
        let id = generate_string();
        assert_eq!(parse(&id).unwrap().to_string(), id);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_string(), generate_string());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse("not-a-uuid").is_err());
    }
}
