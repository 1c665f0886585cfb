// Wed Jan 21 2026 - Alex

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Groups rows into independent units of work.
///
/// Only JSON integers and strings form keys; any other value type in the key
/// column leaves the row unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartitionKey {
    Int(i64),
    Str(String),
}

impl PartitionKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(PartitionKey::Int),
            Value::String(s) => Some(PartitionKey::Str(s.clone())),
            _ => None,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (PartitionKey::Int(k), Value::Number(n)) => n.as_i64() == Some(*k),
            (PartitionKey::Str(k), Value::String(s)) => k == s,
            _ => false,
        }
    }

    /// Tagged byte form, stable across runs.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PartitionKey::Int(v) => {
                let mut bytes = vec![b'i'];
                bytes.extend_from_slice(&v.to_le_bytes());
                bytes
            }
            PartitionKey::Str(s) => {
                let mut bytes = vec![b's'];
                bytes.extend_from_slice(s.as_bytes());
                bytes
            }
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKey::Int(v) => write!(f, "{}", v),
            PartitionKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for PartitionKey {
    fn from(v: i64) -> Self {
        PartitionKey::Int(v)
    }
}

impl From<&str> for PartitionKey {
    fn from(s: &str) -> Self {
        PartitionKey::Str(s.to_string())
    }
}

impl From<String> for PartitionKey {
    fn from(s: String) -> Self {
        PartitionKey::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        assert_eq!(PartitionKey::from_value(&json!(7)), Some(PartitionKey::Int(7)));
        assert_eq!(PartitionKey::from_value(&json!("A")), Some(PartitionKey::from("A")));
        assert_eq!(PartitionKey::from_value(&json!(1.5)), None);
        assert_eq!(PartitionKey::from_value(&json!(null)), None);
        assert_eq!(PartitionKey::from_value(&json!(true)), None);
    }

    #[test]
    fn test_matches_is_type_strict() {
        let key = PartitionKey::Int(3);
        assert!(key.matches(&json!(3)));
        assert!(!key.matches(&json!("3")));
        assert!(PartitionKey::from("3").matches(&json!("3")));
    }

    #[test]
    fn test_untagged_serde() {
        assert_eq!(serde_json::to_string(&PartitionKey::Int(4)).unwrap(), "4");
        assert_eq!(serde_json::to_string(&PartitionKey::from("x")).unwrap(), "\"x\"");
        let key: PartitionKey = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(key, PartitionKey::from("x"));
    }

    #[test]
    fn test_bytes_distinguish_types() {
        assert_ne!(PartitionKey::Int(1).to_bytes(), PartitionKey::from("1").to_bytes());
    }
}
