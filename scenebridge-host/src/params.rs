//! Typed reads over a command's parameter object.

use serde_json::{Map, Value};

/// Borrowed view over `parameters`.
///
/// String reads are lenient: numbers and booleans are accepted and rendered
/// as text, `null` counts as absent. Numeric reads are strict: only JSON
/// numbers (integer or floating point) are taken, anything else is absent.
#[derive(Clone, Copy)]
pub struct Params<'a>(&'a Map<String, Value>);

impl<'a> Params<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Like [`Params::string`], with the empty string treated as absent.
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.string(key).filter(|s| !s.is_empty())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_string_reads() {
        let m = map(json!({ "a": "text", "b": 3, "c": true, "d": null, "e": "" }));
        let params = Params::new(&m);
        assert_eq!(params.string("a").as_deref(), Some("text"));
        assert_eq!(params.string("b").as_deref(), Some("3"));
        assert_eq!(params.string("c").as_deref(), Some("true"));
        assert_eq!(params.string("d"), None);
        assert_eq!(params.string("missing"), None);
        assert_eq!(params.string("e").as_deref(), Some(""));
        assert_eq!(params.non_empty("e"), None);
    }

    #[test]
    fn test_number_reads() {
        let m = map(json!({ "i": 5, "f": 2.5, "s": "7", "b": false }));
        let params = Params::new(&m);
        assert_eq!(params.number("i"), Some(5.0));
        assert_eq!(params.number("f"), Some(2.5));
        assert_eq!(params.number("s"), None);
        assert_eq!(params.number("b"), None);
    }
}
