//! Riot-style identifier normalization
//!
//! Compound identifiers such as `TFT_Item_GuinsoosRageblade` or
//! `TFT14_Trait_Sorcerer` carry a namespace prefix; only the part after the
//! last `_` is kept.

use serde_json::Value;

const NAMESPACE_DELIMITER: char = '_';

/// Keep only the suffix after the last delimiter. `None` and `""` yield `""`.
pub fn normalize(raw: Option<&str>) -> String {
    match raw {
        Some(s) if !s.is_empty() => s
            .rsplit(NAMESPACE_DELIMITER)
            .next()
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Normalize a resolved column value. Strings are normalized, anything else passes through.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize(Some(&s))),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Some("TFT14_Trait_Sorcerer")), "Sorcerer");
        assert_eq!(normalize(Some("TFT_Item_GuinsoosRageblade")), "GuinsoosRageblade");
        assert_eq!(normalize(Some("Ahri")), "Ahri");
        assert_eq!(normalize(Some("")), "");
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some("Trailing_")), "");
    }

    #[test]
    fn test_normalize_value_passes_non_strings() {
        assert_eq!(normalize_value(json!("TFT14_Ahri")), json!("Ahri"));
        assert_eq!(normalize_value(Value::Null), Value::Null);
        assert_eq!(normalize_value(json!(3)), json!(3));
    }
}
