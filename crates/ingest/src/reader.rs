use serde_json::Value;
use tracing::error;

pub struct JsonReader;

impl JsonReader {
    /// Re-serialize an uploaded JSON document with indentation.
    ///
    /// `None` means the document did not parse.
    pub fn pretty(raw: &str) -> Option<String> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Error parsing JSON");
                return None;
            }
        };

        match serde_json::to_string_pretty(&value) {
            Ok(pretty) => Some(pretty),
            Err(e) => {
                error!(error = %e, "Error serializing JSON");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_json_is_none() {
        assert_eq!(JsonReader::pretty(r#"{"a":"#), None);
        assert_eq!(JsonReader::pretty(""), None);
    }

    #[test]
    fn test_pretty_roundtrips_to_same_value() {
        let raw = r#"{"name":"Widget","tags":["a","b"],"price":{"amount":9.5,"currency":"EUR"}}"#;

        let pretty = JsonReader::pretty(raw).unwrap();

        assert!(pretty.contains("\n  \"name\""));
        let original: Value = serde_json::from_str(raw).unwrap();
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_key_order_preserved() {
        let pretty = JsonReader::pretty(r#"{"z":1,"a":2}"#).unwrap();
        assert!(pretty.find("\"z\"").unwrap() < pretty.find("\"a\"").unwrap());
    }

    #[test]
    fn test_large_integers_kept_exact() {
        let raw = r#"{"sku":123456789012345678901234567890,"gtin":18446744073709551616,"price":19.99}"#;

        let pretty = JsonReader::pretty(raw).unwrap();

        assert!(pretty.contains("\"sku\": 123456789012345678901234567890"));
        assert!(pretty.contains("\"gtin\": 18446744073709551616"));
        assert!(pretty.contains("\"price\": 19.99"));
        let original: Value = serde_json::from_str(raw).unwrap();
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(original, reparsed);
    }
}
