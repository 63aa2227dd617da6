//! CIP-68 metadata update.
//!
//! Loads the current on-chain metadata of a token, then rewrites the
//! reference datum: each update spends the store output holding the
//! reference token and locks the token again with the new datum. One
//! platform fee is paid per transaction.

use serde_json::{Map, Value};

use crate::cardano::{Asset, ChainError, DatumSource, DraftBuilder, PlutusData, Utxo};
use crate::workflows::metadata::Cip68Metadata;
use crate::workflows::nft_cip68::{Cip68Contract, Cip68Scripts};
use crate::workflows::{payment_key_hash, require, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowError, WorkflowResult};

/// Keys edited through dedicated fields rather than as free pairs.
const RESERVED_KEYS: [&str; 3] = ["name", "description", "contentType"];

/// Metadata key recording the owner's payment key hash.
const OWNER_KEY: &str = "_pk";

/// Token metadata split into edit fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableMetadata {
    pub name: String,
    pub description: String,
    /// `None` leaves `contentType` out.
    pub content_type: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl EditableMetadata {
    pub fn from_onchain(map: &Map<String, Value>) -> Self {
        let flat = Cip68Metadata::from_json(map);
        let text = |key: &str| flat.get(key).unwrap_or_default().to_string();
        Self {
            name: text("name"),
            description: text("description"),
            content_type: flat
                .get("contentType")
                .filter(|t| !t.is_empty() && *t != "none")
                .map(str::to_string),
            extra: flat
                .entries()
                .iter()
                .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Datum entries for an update signed by `owner_pkh`.
    fn to_metadata(&self, owner_pkh: &str) -> Cip68Metadata {
        let mut metadata = Cip68Metadata::new();
        metadata.insert("name", self.name.trim());
        metadata.insert("description", self.description.as_str());
        metadata.insert(OWNER_KEY, owner_pkh);
        if let Some(content_type) = &self.content_type {
            metadata.insert("contentType", content_type.as_str());
        }
        for (key, value) in &self.extra {
            if !key.trim().is_empty() {
                metadata.insert(key.trim(), value.as_str());
            }
        }
        metadata
    }
}

/// Current metadata of `unit`. An asset the provider does not know has none.
pub async fn load_metadata(ctx: &ChainContext, unit: &str) -> WorkflowResult<EditableMetadata> {
    match ctx.provider.fetch_asset_metadata(unit).await {
        Ok(map) => Ok(EditableMetadata::from_onchain(&map)),
        Err(ChainError::NotFound(_)) => {
            tracing::warn!(unit, "No on-chain metadata for asset");
            Ok(EditableMetadata::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// One token to rewrite.
#[derive(Debug, Clone)]
pub struct TokenUpdate {
    /// Asset name hex without the CIP-68 label.
    pub asset_name_hex: String,
    pub metadata: EditableMetadata,
    /// Transaction that created the current store output, if known.
    pub tx_hash: Option<String>,
}

impl TokenUpdate {
    fn validate(&self) -> WorkflowResult<()> {
        require("asset name", &self.asset_name_hex)?;
        if hex::decode(&self.asset_name_hex).is_err() {
            return Err(WorkflowError::InvalidInput(format!(
                "asset name '{}' is not hex",
                self.asset_name_hex
            )));
        }
        require("name", &self.metadata.name)
    }
}

impl Cip68Contract {
    /// Store output currently holding the reference token of `update`.
    async fn store_utxo(
        &self,
        ctx: &ChainContext,
        scripts: &Cip68Scripts,
        update: &TokenUpdate,
    ) -> WorkflowResult<Utxo> {
        let found = match update.tx_hash.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            Some(tx_hash) => ctx
                .provider
                .fetch_address_utxos(&scripts.store.address, None)
                .await?
                .into_iter()
                .find(|u| u.input.tx_hash == tx_hash),
            None => {
                let unit = scripts.reference_unit(&update.asset_name_hex);
                ctx.provider
                    .fetch_address_utxos(&scripts.store.address, Some(&unit))
                    .await?
                    .pop()
            }
        };
        found.ok_or_else(|| WorkflowError::NotFound("Store UTxO not found".to_string()))
    }

    /// Rewrite the reference datum of every token in `updates`.
    pub async fn update(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        updates: &[TokenUpdate],
    ) -> WorkflowResult<String> {
        run("nft_cip68_update", async {
            if updates.is_empty() {
                return Err(WorkflowError::InvalidInput("nothing to update".to_string()));
            }
            for update in updates {
                update.validate()?;
            }
            let op = session.begin()?;
            let wallet = op.wallet();

            let utxos = wallet.utxos().await?;
            let address = wallet.change_address().await?;
            let collateral = wallet.first_collateral().await?;
            let user_pkh = payment_key_hash(&address)?;
            let scripts = self.scripts(ctx, &user_pkh)?;

            let mut builder = DraftBuilder::new(ctx.network);
            for update in updates {
                let store_utxo = self.store_utxo(ctx, &scripts, update).await?;
                let unit = scripts.reference_unit(&update.asset_name_hex);
                tracing::debug!(utxo = %store_utxo.input, unit = %unit, "Rewriting reference datum");
                builder = builder
                    .spend_plutus_script(
                        store_utxo,
                        scripts.store.script.clone(),
                        DatumSource::Inline,
                        PlutusData::constr0(vec![]),
                    )
                    .pay_to_with_inline_datum(
                        &scripts.store.address,
                        vec![Asset::new(unit, 1)],
                        update.metadata.to_metadata(&user_pkh).to_datum(),
                    );
            }

            let draft = builder
                .pay_to(self.exchange_address(), vec![Asset::lovelace(self.platform_fee())])
                .required_signer(user_pkh)
                .collateral(collateral)
                .select_from(utxos)
                .change_address(address)
                .finalize()?;
            let unsigned = ctx.engine.complete(&draft).await?;
            sign_and_submit(wallet, &unsigned, true).await
        })
        .await
    }
}
