//! The `{"type": "FeatureCollection", "<key>": [...]}` response envelope.

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const COLLECTION_TAG: &str = "FeatureCollection";

/// A tagged list of records under a named key.
///
/// Serializes as `{"type": "FeatureCollection", key: items}`. Parsing accepts
/// exactly one list key next to the tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection<T> {
    key: String,
    items: Vec<T>,
}

impl<T> FeatureCollection<T> {
    #[must_use]
    pub fn new(key: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            key: key.into(),
            items,
        }
    }

    #[must_use]
    pub fn stations(items: Vec<T>) -> Self {
        Self::new("stations", items)
    }

    #[must_use]
    pub fn restaurants(items: Vec<T>) -> Self {
        Self::new("restaurants", items)
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T: Serialize> Serialize for FeatureCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", COLLECTION_TAG)?;
        map.serialize_entry(&self.key, &self.items)?;
        map.end()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for FeatureCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;

        match object.remove("type") {
            Some(serde_json::Value::String(tag)) if tag == COLLECTION_TAG => {}
            other => {
                return Err(D::Error::custom(format!(
                    "expected \"type\": \"{COLLECTION_TAG}\", got {other:?}"
                )))
            }
        }

        let mut entries = object.into_iter();
        let (key, value) = entries
            .next()
            .ok_or_else(|| D::Error::custom("feature collection has no item list"))?;
        if entries.next().is_some() {
            return Err(D::Error::custom(
                "feature collection has more than one item list",
            ));
        }

        let items = serde_json::from_value::<Vec<T>>(value).map_err(D::Error::custom)?;
        Ok(Self { key, items })
    }
}
