//! Policy parameters
//!
//! Parameters are the metadata a policy hands back alongside its answer:
//! which branch of a combinator succeeded, the relationship a dependency
//! resolved, the message of a halted policy. They are threaded forward
//! through `all` chains and returned to the caller on success.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which a halted policy's message is stored
pub const ERROR_MESSAGE_KEY: &str = "error_message";

/// Decision metadata produced during evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Merge `other` into `self`; keys of `other` win on collision
    pub fn merge(&mut self, other: &Params) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Message left by a halted policy, if any
    pub fn error_message(&self) -> Option<&str> {
        self.get_str(ERROR_MESSAGE_KEY)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_last_writer_wins() {
        let mut first = Params::new().with("owner", "john").with("shared", 1);
        let second = Params::new().with("shared", 2).with("extra", true);

        first.merge(&second);

        assert_eq!(first.get_str("owner"), Some("john"));
        assert_eq!(first.get("shared"), Some(&json!(2)));
        assert_eq!(first.get_bool("extra"), Some(true));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_error_message() {
        let params = Params::new().with(ERROR_MESSAGE_KEY, "account suspended");
        assert_eq!(params.error_message(), Some("account suspended"));
        assert!(Params::new().error_message().is_none());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let params: Params = [("author_policy?", true)].into_iter().collect();
        let encoded = serde_json::to_value(&params).unwrap();
        assert_eq!(encoded, json!({ "author_policy?": true }));

        let decoded: Params = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, params);
    }
}
