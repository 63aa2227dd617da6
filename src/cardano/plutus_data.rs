//! Plutus data: datums, redeemers and script parameters.
//!
//! Values are built in Rust, handed to the transaction engine in the
//! detailed JSON schema, and decoded back from inline-datum CBOR when a
//! workflow has to read what a locked output carries.

use ciborium::value::{Integer, Value};
use serde::{Serialize, Serializer};
use serde_json::json;

use crate::cardano::types::{ChainError, ChainResult};

const CONSTR_TAG_BASE: u64 = 121;
const CONSTR_TAG_EXTENDED_BASE: u64 = 1280;
const CONSTR_TAG_GENERAL: u64 = 102;
const BIGNUM_POS_TAG: u64 = 2;
const BIGNUM_NEG_TAG: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Constr(u64, Vec<PlutusData>),
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Int(i128),
    Bytes(Vec<u8>),
}

impl PlutusData {
    /// Constructor 0, the shape of most datums and redeemers.
    pub fn constr0(fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr(0, fields)
    }

    /// Bytes from a hex string such as a key hash.
    pub fn bytes_hex(value: &str) -> ChainResult<Self> {
        hex::decode(value)
            .map(PlutusData::Bytes)
            .map_err(|e| ChainError::Decode(format!("invalid hex '{}': {}", value, e)))
    }

    /// Bytes holding the UTF-8 encoding of `value`.
    pub fn utf8(value: &str) -> Self {
        PlutusData::Bytes(value.as_bytes().to_vec())
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            PlutusData::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PlutusData::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Fields of a constructor with the expected alternative.
    pub fn constr_fields(&self, alternative: u64) -> Option<&[PlutusData]> {
        match self {
            PlutusData::Constr(alt, fields) if *alt == alternative => Some(fields),
            _ => None,
        }
    }

    /// Detailed-schema JSON (`{"constructor":0,"fields":[...]}`, `{"bytes":"..."}`, ...).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PlutusData::Constr(alt, fields) => json!({
                "constructor": alt,
                "fields": fields.iter().map(PlutusData::to_json).collect::<Vec<_>>(),
            }),
            PlutusData::Map(entries) => json!({
                "map": entries
                    .iter()
                    .map(|(k, v)| json!({ "k": k.to_json(), "v": v.to_json() }))
                    .collect::<Vec<_>>(),
            }),
            PlutusData::List(items) => json!({
                "list": items.iter().map(PlutusData::to_json).collect::<Vec<_>>(),
            }),
            PlutusData::Int(i) => match i64::try_from(*i) {
                Ok(small) => json!({ "int": small }),
                Err(_) => match u64::try_from(*i) {
                    Ok(big) => json!({ "int": big }),
                    Err(_) => json!({ "int": i.to_string() }),
                },
            },
            PlutusData::Bytes(b) => json!({ "bytes": hex::encode(b) }),
        }
    }

    pub fn to_cbor(&self) -> ChainResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&self.to_value()?, &mut buf)
            .map_err(|e| ChainError::Decode(format!("plutus data encoding failed: {}", e)))?;
        Ok(buf)
    }

    pub fn to_cbor_hex(&self) -> ChainResult<String> {
        Ok(hex::encode(self.to_cbor()?))
    }

    pub fn from_cbor(bytes: &[u8]) -> ChainResult<Self> {
        let value: Value = ciborium::de::from_reader(bytes)
            .map_err(|e| ChainError::Decode(format!("invalid CBOR: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_cbor_hex(value: &str) -> ChainResult<Self> {
        let bytes = hex::decode(value)
            .map_err(|e| ChainError::Decode(format!("invalid datum hex: {}", e)))?;
        Self::from_cbor(&bytes)
    }

    fn to_value(&self) -> ChainResult<Value> {
        Ok(match self {
            PlutusData::Constr(alt, fields) => {
                let fields = Value::Array(
                    fields
                        .iter()
                        .map(PlutusData::to_value)
                        .collect::<ChainResult<Vec<_>>>()?,
                );
                match *alt {
                    0..=6 => Value::Tag(CONSTR_TAG_BASE + alt, Box::new(fields)),
                    7..=127 => Value::Tag(CONSTR_TAG_EXTENDED_BASE + alt - 7, Box::new(fields)),
                    _ => Value::Tag(
                        CONSTR_TAG_GENERAL,
                        Box::new(Value::Array(vec![Value::from(*alt), fields])),
                    ),
                }
            }
            PlutusData::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.to_value()?, v.to_value()?)))
                    .collect::<ChainResult<Vec<_>>>()?,
            ),
            PlutusData::List(items) => Value::Array(
                items
                    .iter()
                    .map(PlutusData::to_value)
                    .collect::<ChainResult<Vec<_>>>()?,
            ),
            PlutusData::Int(i) => Value::Integer(Integer::try_from(*i).map_err(|_| {
                ChainError::Decode(format!("integer {} exceeds CBOR range", i))
            })?),
            PlutusData::Bytes(b) => Value::Bytes(b.clone()),
        })
    }

    fn from_value(value: Value) -> ChainResult<Self> {
        match value {
            Value::Integer(i) => Ok(PlutusData::Int(i128::from(i))),
            Value::Bytes(b) => Ok(PlutusData::Bytes(b)),
            Value::Array(items) => Ok(PlutusData::List(
                items
                    .into_iter()
                    .map(Self::from_value)
                    .collect::<ChainResult<Vec<_>>>()?,
            )),
            Value::Map(entries) => Ok(PlutusData::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((Self::from_value(k)?, Self::from_value(v)?)))
                    .collect::<ChainResult<Vec<_>>>()?,
            )),
            Value::Tag(tag, inner) => Self::from_tagged(tag, *inner),
            other => Err(ChainError::Decode(format!(
                "unsupported CBOR item in plutus data: {:?}",
                other
            ))),
        }
    }

    fn from_tagged(tag: u64, inner: Value) -> ChainResult<Self> {
        match tag {
            121..=127 => Ok(PlutusData::Constr(tag - CONSTR_TAG_BASE, Self::fields(inner)?)),
            1280..=1400 => Ok(PlutusData::Constr(
                tag - CONSTR_TAG_EXTENDED_BASE + 7,
                Self::fields(inner)?,
            )),
            CONSTR_TAG_GENERAL => match inner {
                Value::Array(mut pair) if pair.len() == 2 => {
                    let fields = Self::fields(pair.pop().unwrap_or(Value::Null))?;
                    let alt = match pair.pop() {
                        Some(Value::Integer(i)) => u64::try_from(i).map_err(|_| {
                            ChainError::Decode("negative constructor index".to_string())
                        })?,
                        _ => return Err(ChainError::Decode("bad general constructor".to_string())),
                    };
                    Ok(PlutusData::Constr(alt, fields))
                }
                _ => Err(ChainError::Decode("bad general constructor".to_string())),
            },
            BIGNUM_POS_TAG | BIGNUM_NEG_TAG => {
                let bytes = match inner {
                    Value::Bytes(b) => b,
                    _ => return Err(ChainError::Decode("bignum without bytes".to_string())),
                };
                if bytes.len() > 16 {
                    return Err(ChainError::Decode("bignum exceeds 128 bits".to_string()));
                }
                let magnitude = bytes.iter().fold(0u128, |acc, b| (acc << 8) | *b as u128);
                let magnitude = i128::try_from(magnitude)
                    .map_err(|_| ChainError::Decode("bignum exceeds 128 bits".to_string()))?;
                Ok(PlutusData::Int(if tag == BIGNUM_POS_TAG {
                    magnitude
                } else {
                    -1 - magnitude
                }))
            }
            other => Err(ChainError::Decode(format!("unexpected CBOR tag {}", other))),
        }
    }

    fn fields(inner: Value) -> ChainResult<Vec<PlutusData>> {
        match inner {
            Value::Array(items) => items.into_iter().map(Self::from_value).collect(),
            _ => Err(ChainError::Decode("constructor fields must be an array".to_string())),
        }
    }
}

impl Serialize for PlutusData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
