//! Compiled validator blueprints (`plutus.json`).
//!
//! Only the fields needed to find a validator and hand its code to the
//! transaction engine are read; everything else in the file is ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cardano::types::{ChainError, ChainResult, PlutusVersion};

#[derive(Debug, Clone, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub preamble: Preamble,
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preamble {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "plutusVersion", default)]
    pub plutus_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Validator {
    pub title: String,
    #[serde(rename = "compiledCode")]
    pub compiled_code: String,
    #[serde(default)]
    pub hash: Option<String>,
}

impl Blueprint {
    pub fn from_json(json: &str) -> ChainResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ChainError::Decode(format!("invalid blueprint: {}", e)))
    }

    pub fn from_file(path: &Path) -> ChainResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            ChainError::Config(format!("cannot read blueprint {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Compiled code of the validator titled `title`.
    pub fn validator(&self, title: &str) -> ChainResult<&str> {
        self.validators
            .iter()
            .find(|v| v.title == title)
            .map(|v| v.compiled_code.as_str())
            .ok_or_else(|| ChainError::NotFound(format!("{} validator not found", title)))
    }

    /// Compiled code of the first validator.
    pub fn first_validator(&self) -> ChainResult<&str> {
        self.validators
            .first()
            .map(|v| v.compiled_code.as_str())
            .ok_or_else(|| ChainError::NotFound("blueprint has no validators".to_string()))
    }

    /// Language version declared in the preamble, V3 when absent.
    pub fn plutus_version(&self) -> PlutusVersion {
        match self.preamble.plutus_version.as_deref() {
            Some("v1") => PlutusVersion::V1,
            Some("v2") => PlutusVersion::V2,
            _ => PlutusVersion::V3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUEPRINT: &str = r#"{
        "preamble": { "title": "demo/nft", "plutusVersion": "v3" },
        "validators": [
            { "title": "nft.one_shot_mint.mint", "compiledCode": "5901010100", "hash": "ab" },
            { "title": "nft.one_shot_mint.else", "compiledCode": "5901010101" }
        ]
    }"#;

    #[test]
    fn test_lookup_by_title() {
        let blueprint = Blueprint::from_json(BLUEPRINT).unwrap();
        assert_eq!(blueprint.validator("nft.one_shot_mint.mint").unwrap(), "5901010100");
        assert_eq!(blueprint.first_validator().unwrap(), "5901010100");
        assert_eq!(blueprint.plutus_version(), PlutusVersion::V3);
    }

    #[test]
    fn test_missing_validator() {
        let blueprint = Blueprint::from_json(BLUEPRINT).unwrap();
        let err = blueprint.validator("store.store.spend").unwrap_err();
        assert!(err.to_string().contains("store.store.spend validator not found"));
    }

    #[test]
    fn test_missing_file() {
        let err = Blueprint::from_file(Path::new("/nonexistent/plutus.json")).unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
    }
}
