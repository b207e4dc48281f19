//! Response envelopes and shape normalization.
//!
//! The upstream API is not uniform: the same kind of list may arrive as a bare
//! array, as `{data: [...]}`, as `{data: {clients: [...]}}` or as `{users: [...]}`.
//! Every wrapper funnels its body through [`normalize_list`] or
//! [`normalize_record`] with the collection keys its resource uses.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub const FEATURE_DISABLED: &str = "Feature disabled";

/// `(alternate, canonical)` spellings of the same record field. Document-store
/// backends may send both at once; the canonical one is kept.
const KEY_ALIASES: &[(&str, &str)] = &[("_id", "id"), ("fileName", "name")];

/// Normalized result of a wrapper call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
    pub status_text: String,
}

impl<T> ApiResponse<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            status: self.status,
            status_text: self.status_text,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<ApiResponse<U>, E> {
        Ok(ApiResponse {
            data: f(self.data)?,
            status: self.status,
            status_text: self.status_text,
        })
    }

    /// True when this came from a feature-flag short-circuit, not the network.
    pub fn is_feature_disabled(&self) -> bool {
        self.status_text == FEATURE_DISABLED
    }
}

impl<T: Default> ApiResponse<T> {
    /// Neutral envelope returned by a switched-off wrapper group.
    pub fn disabled() -> Self {
        Self {
            data: T::default(),
            status: 200,
            status_text: FEATURE_DISABLED.to_string(),
        }
    }
}

fn take_array(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Vec<Value>> {
    keys.iter().find_map(|key| match map.remove(*key) {
        Some(Value::Array(items)) => Some(items),
        Some(other) => {
            map.insert((*key).to_string(), other);
            None
        }
        None => None,
    })
}

/// Drop alternate keys from every object that also carries the canonical key,
/// so models that alias one to the other don't see a duplicate field.
pub fn canonicalize_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (alternate, canonical) in KEY_ALIASES {
                if map.contains_key(*canonical) {
                    map.remove(*alternate);
                }
            }
            map.values_mut().for_each(canonicalize_keys);
        }
        Value::Array(items) => items.iter_mut().for_each(canonicalize_keys),
        _ => {}
    }
}

/// Pull the item list out of any known envelope shape; empty if none matches.
pub fn extract_list(value: Value, keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            match map.remove("data") {
                Some(Value::Array(items)) => return items,
                Some(Value::Object(mut inner)) => {
                    if let Some(items) = take_array(&mut inner, keys) {
                        return items;
                    }
                }
                _ => {}
            }
            take_array(&mut map, keys).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Deserialize every item of a list envelope, skipping items that don't fit.
pub fn normalize_list<T: DeserializeOwned>(value: Value, keys: &[&str]) -> Vec<T> {
    extract_list(value, keys)
        .into_iter()
        .enumerate()
        .filter_map(|(index, mut item)| {
            canonicalize_keys(&mut item);
            match serde_json::from_value::<T>(item) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    tracing::warn!(index, error = %err, "skipping malformed list item");
                    None
                }
            }
        })
        .collect()
}

/// Pull a single record out of `{data: {...}}`, `{<key>: {...}}` or a bare object.
pub fn extract_record(value: Value, keys: &[&str]) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };

    if matches!(map.get("data"), Some(Value::Object(_))) {
        if let Some(Value::Object(mut inner)) = map.remove("data") {
            for key in keys {
                if matches!(inner.get(*key), Some(Value::Object(_))) {
                    return inner.remove(*key).unwrap_or(Value::Null);
                }
            }
            return Value::Object(inner);
        }
    }

    for key in keys {
        if matches!(map.get(*key), Some(Value::Object(_))) {
            return map.remove(*key).unwrap_or(Value::Null);
        }
    }
    Value::Object(map)
}

pub fn normalize_record<T: DeserializeOwned>(
    value: Value,
    keys: &[&str],
) -> Result<T, serde_json::Error> {
    let mut record = extract_record(value, keys);
    canonicalize_keys(&mut record);
    serde_json::from_value(record)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    const KEYS: &[&str] = &["clients", "users"];

    #[test]
    fn accepts_every_known_list_shape() {
        let shapes = [
            json!([{"id": 1}, {"id": 2}]),
            json!({"data": [{"id": 1}, {"id": 2}]}),
            json!({"data": {"clients": [{"id": 1}, {"id": 2}], "total": 2}}),
            json!({"users": [{"id": 1}, {"id": 2}]}),
            json!({"success": true, "clients": [{"id": 1}, {"id": 2}]}),
        ];
        for shape in shapes {
            let items: Vec<Item> = normalize_list(shape.clone(), KEYS);
            assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }], "shape: {shape}");
        }
    }

    #[test]
    fn unknown_shapes_fall_back_to_empty() {
        for shape in [json!(null), json!("x"), json!({"data": null}), json!({"items": {}})] {
            assert!(normalize_list::<Item>(shape, KEYS).is_empty());
        }
    }

    #[test]
    fn malformed_items_are_skipped() {
        let items: Vec<Item> = normalize_list(json!([{"id": 1}, {"id": "two"}, {"id": 3}]), KEYS);
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 3 }]);
    }

    #[test]
    fn record_shapes() {
        let keys = &["client"];
        assert_eq!(extract_record(json!({"id": 1}), keys), json!({"id": 1}));
        assert_eq!(extract_record(json!({"data": {"id": 1}}), keys), json!({"id": 1}));
        assert_eq!(
            extract_record(json!({"data": {"client": {"id": 1}}, "message": "ok"}), keys),
            json!({"id": 1})
        );
        assert_eq!(
            extract_record(json!({"client": {"id": 1}, "message": "ok"}), keys),
            json!({"id": 1})
        );
    }

    #[test]
    fn records_sending_both_id_spellings_still_parse() {
        use casedesk_core::{Client, ClientId, Document};

        let clients: Vec<Client> = normalize_list(
            json!({"data": [{"_id": "c1", "id": "c1", "firstName": "Ana", "email": "ana@x.com"}]}),
            KEYS,
        );
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, Some(ClientId::new("c1")));

        let doc: Document = normalize_record(
            json!({"document": {"_id": "d0", "id": "d1", "name": "visa.pdf", "fileName": "upload-1.pdf"}}),
            &["document"],
        )
        .unwrap();
        assert_eq!(doc.id.map(String::from).as_deref(), Some("d1"));
        assert_eq!(doc.name, "visa.pdf");

        let only_alternate: Document = normalize_record(json!({"_id": "d2", "fileName": "i94.pdf"}), &[]).unwrap();
        assert_eq!(only_alternate.name, "i94.pdf");
    }

    #[test]
    fn canonicalization_reaches_nested_records() {
        let mut value = json!({"workflows": [{"id": "w1", "_id": "w1", "client": {"_id": "c1", "id": "c1"}}]});
        canonicalize_keys(&mut value);
        assert_eq!(value, json!({"workflows": [{"id": "w1", "client": {"id": "c1"}}]}));
    }

    #[test]
    fn disabled_envelope_is_neutral() {
        let res: ApiResponse<Vec<Item>> = ApiResponse::disabled();
        assert!(res.data.is_empty());
        assert_eq!(res.status, 200);
        assert!(res.is_feature_disabled());
    }
}
