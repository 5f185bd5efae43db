use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque key that identifies one counter in a [crate::CounterStore].
///
/// Keys built with [BucketKey::compose] are namespaced and encode their parts
/// as a JSON array, so two different sequences of parts never produce the same
/// key even when a part contains separator characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketKey(String);

impl BucketKey {
    /// Build a key from a namespace and an ordered list of parts.
    pub fn compose<P>(namespace: &str, parts: &[P]) -> Self
    where
        P: AsRef<str>,
    {
        let encoded = Value::Array(
            parts
                .iter()
                .map(|part| Value::String(part.as_ref().to_owned()))
                .collect(),
        );
        BucketKey(format!("{namespace}:{encoded}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BucketKey {
    fn from(value: String) -> Self {
        BucketKey(value)
    }
}

impl From<&str> for BucketKey {
    fn from(value: &str) -> Self {
        BucketKey(value.to_owned())
    }
}

impl AsRef<str> for BucketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::BucketKey;

    #[test]
    fn it_prefixes_composed_keys_with_the_namespace() {
        let key = BucketKey::compose("fair-tenant", &["SomeJob", "foo"]);
        assert_eq!(key.as_str(), r#"fair-tenant:["SomeJob","foo"]"#);
    }

    #[test]
    fn it_does_not_collide_when_parts_contain_separators() {
        let left = BucketKey::compose("ns", &["a:b", "c"]);
        let right = BucketKey::compose("ns", &["a", "b:c"]);
        let quoted = BucketKey::compose("ns", &["a\",\"b", "c"]);

        assert_ne!(left, right);
        assert_ne!(quoted, BucketKey::compose("ns", &["a", "b", "c"]));
    }
}
