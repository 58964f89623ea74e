//! Token definition schema.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Fungibility of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TokenKind {
    /// Interchangeable units.
    #[serde(rename = "fungible")]
    Fungible,
    /// Distinct items, one per 10⁸ sub-units of supply.
    #[serde(rename = "non-fungible")]
    NonFungible,
}

/// The JSON document carried by a `token` transaction's content.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenDefinition {
    /// Total supply in sub-units.
    pub supply: u64,
    /// Human-readable name.
    pub name: String,
    /// Fungibility.
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Ticker symbol.
    pub symbol: String,
    /// Free-form token properties.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    /// Per-item properties of a non-fungible collection.
    #[serde(default)]
    pub collection: Option<Vec<Map<String, Value>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fungible_definition_parses() {
        let doc = r#"{"supply": 100000000, "name": "Demo", "type": "fungible", "symbol": "DMO"}"#;
        let def: TokenDefinition = serde_json::from_str(doc).unwrap();
        assert_eq!(def.kind, TokenKind::Fungible);
        assert_eq!(def.supply, 100_000_000);
        assert!(def.collection.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let doc = r#"{"supply": 1, "name": "x", "type": "fungible", "symbol": "X", "extra": 1}"#;
        assert!(serde_json::from_str::<TokenDefinition>(doc).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let doc = r#"{"supply": 1, "name": "x", "type": "semi-fungible", "symbol": "X"}"#;
        assert!(serde_json::from_str::<TokenDefinition>(doc).is_err());
    }
}
