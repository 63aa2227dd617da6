//! Token metadata: CIP-25 (label 721) and CIP-68 reference datums.

use serde_json::{json, Map, Value};

use crate::cardano::PlutusData;

/// Transaction metadata label for CIP-25 NFT metadata.
pub const CIP25_LABEL: u64 = 721;

/// Asset-name prefix of a CIP-68 reference token (label 100).
pub const CIP68_REFERENCE_PREFIX: &str = "000643b0";

/// Asset-name prefix of a CIP-68 user NFT (label 222).
pub const CIP68_USER_PREFIX: &str = "000de140";

/// Version field of the CIP-68 datum.
const CIP68_VERSION: i128 = 1;

/// Longest string a metadata text value may hold, in bytes.
const METADATA_TEXT_MAX: usize = 64;

pub fn reference_asset_name(name_hex: &str) -> String {
    format!("{}{}", CIP68_REFERENCE_PREFIX, name_hex)
}

pub fn user_asset_name(name_hex: &str) -> String {
    format!("{}{}", CIP68_USER_PREFIX, name_hex)
}

/// Whether an asset unit carries a CIP-68 reference or user label.
pub fn is_cip68_unit(unit: &str) -> bool {
    unit.contains(CIP68_REFERENCE_PREFIX) || unit.contains(CIP68_USER_PREFIX)
}

/// Hex encoding of a UTF-8 token name.
pub fn asset_name_hex(name: &str) -> String {
    hex::encode(name.as_bytes())
}

/// Metadata text value: a plain string when short enough, otherwise an
/// array of chunks of at most 64 bytes split on character boundaries.
pub fn metadata_text(value: &str) -> Value {
    if value.len() <= METADATA_TEXT_MAX {
        return Value::String(value.to_string());
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in value.chars() {
        if current.len() + c.len_utf8() > METADATA_TEXT_MAX {
            chunks.push(Value::String(std::mem::take(&mut current)));
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(Value::String(current));
    }
    Value::Array(chunks)
}

/// Fields of a CIP-25 NFT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cip25Fields {
    pub name: String,
    pub image: String,
    pub description: String,
    pub media_type: String,
}

/// Label-721 payload: `{policy_id: {name: {name, image, description, mediaType}}}`.
pub fn cip25_metadata(policy_id: &str, fields: &Cip25Fields) -> Value {
    let asset = json!({
        "name": metadata_text(&fields.name),
        "image": metadata_text(&fields.image),
        "description": metadata_text(&fields.description),
        "mediaType": metadata_text(&fields.media_type),
    });
    let mut by_name = Map::new();
    by_name.insert(fields.name.clone(), asset);
    let mut by_policy = Map::new();
    by_policy.insert(policy_id.to_string(), Value::Object(by_name));
    Value::Object(by_policy)
}

/// Ordered CIP-68 metadata entries. Later inserts of an existing key
/// replace its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cip68Metadata {
    entries: Vec<(String, String)>,
}

impl Cip68Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert user-supplied pairs, skipping blank keys or values.
    pub fn extend_pairs<'a>(&mut self, pairs: impl IntoIterator<Item = &'a (String, String)>) {
        for (key, value) in pairs {
            if !key.trim().is_empty() && !value.is_empty() {
                self.insert(key.trim(), value.clone());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Reference datum: `Constr0[{key bytes: value bytes}, 1]`.
    pub fn to_datum(&self) -> PlutusData {
        let map = self
            .entries
            .iter()
            .map(|(k, v)| (PlutusData::utf8(k), PlutusData::utf8(v)))
            .collect();
        PlutusData::constr0(vec![PlutusData::Map(map), PlutusData::Int(CIP68_VERSION)])
    }

    /// Read entries back from a reference datum. Non-text entries are skipped.
    pub fn from_datum(datum: &PlutusData) -> Option<Self> {
        let fields = datum.constr_fields(0)?;
        let PlutusData::Map(map) = fields.first()? else {
            return None;
        };
        let mut metadata = Self::new();
        for (k, v) in map {
            let key = k.as_bytes().and_then(|b| std::str::from_utf8(b).ok());
            let value = v.as_bytes().and_then(|b| std::str::from_utf8(b).ok());
            if let (Some(key), Some(value)) = (key, value) {
                metadata.insert(key, value);
            }
        }
        Some(metadata)
    }

    /// Entries from provider JSON metadata, stringifying non-string values.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let mut metadata = Self::new();
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Array(parts) if parts.iter().all(Value::is_string) => parts
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<String>(),
                other => other.to_string(),
            };
            metadata.insert(key.clone(), text);
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(reference_asset_name("4e4654"), "000643b04e4654");
        assert_eq!(user_asset_name("4e4654"), "000de1404e4654");
        assert!(is_cip68_unit(&format!("{}000de1404e4654", "ab".repeat(28))));
        assert!(!is_cip68_unit(&format!("{}4e4654", "ab".repeat(28))));
        assert_eq!(asset_name_hex("NFT"), "4e4654");
    }

    #[test]
    fn test_long_text_is_chunked() {
        let long = "ipfs://".to_string() + &"Q".repeat(100);
        let Value::Array(chunks) = metadata_text(&long) else {
            panic!("expected chunks");
        };
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_str().unwrap().len(), 64);
        let joined: String = chunks.iter().filter_map(Value::as_str).collect();
        assert_eq!(joined, long);
        assert_eq!(metadata_text("short"), json!("short"));
    }

    #[test]
    fn test_cip25_shape() {
        let fields = Cip25Fields {
            name: "Cat".into(),
            image: "ipfs://Qm".into(),
            description: "A cat".into(),
            media_type: "image/jpg".into(),
        };
        let metadata = cip25_metadata("pol", &fields);
        assert_eq!(metadata["pol"]["Cat"]["image"], "ipfs://Qm");
        assert_eq!(metadata["pol"]["Cat"]["mediaType"], "image/jpg");
    }

    #[test]
    fn test_cip68_datum_roundtrip() {
        let mut metadata = Cip68Metadata::new();
        metadata.insert("name", "Cat");
        metadata.insert("image", "ipfs://Qm");
        metadata.insert("name", "Dog");
        metadata.extend_pairs(&[
            ("rarity".to_string(), "rare".to_string()),
            ("  ".to_string(), "ignored".to_string()),
            ("empty".to_string(), String::new()),
        ]);

        assert_eq!(metadata.entries().len(), 3);
        assert_eq!(metadata.get("name"), Some("Dog"));

        let datum = metadata.to_datum();
        let fields = datum.constr_fields(0).unwrap();
        assert_eq!(fields[1], PlutusData::Int(1));

        let decoded = PlutusData::from_cbor(&datum.to_cbor().unwrap()).unwrap();
        assert_eq!(Cip68Metadata::from_datum(&decoded).unwrap(), metadata);
    }

    #[test]
    fn test_from_json() {
        let map = json!({ "name": "Cat", "image": ["ipfs://", "Qm"], "edition": 3 });
        let metadata = Cip68Metadata::from_json(map.as_object().unwrap());
        assert_eq!(metadata.get("image"), Some("ipfs://Qm"));
        assert_eq!(metadata.get("edition"), Some("3"));
    }
}
