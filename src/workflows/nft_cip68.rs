//! CIP-68 mint with an on-chain metadata store.
//!
//! # Responsibilities
//! - Derive the per-user store validator and minting policy from the
//!   exchange and user credentials
//! - Optionally pin the image through the pinning service
//! - Mint the reference (label 100) and user (label 222) tokens, lock the
//!   reference token at the store with the metadata datum, and pay the
//!   platform fee
//!
//! # Data Flow
//! ```text
//! exchange address ─┬─ pkh ──────────┐
//!                   └─ stake cred ─┐ │
//! user pkh ────────────────────────┼─┼──▶ store(exchange pkh, 1, user pkh) @ stake cred
//!                                  │ │        │ hash
//!                                  ▼ ▼        ▼
//!                     mint(exchange pkh, 1, store hash, stake hash, user pkh) ─▶ policy id
//! ```

use std::sync::Arc;

use crate::cardano::address::AddressParts;
use crate::cardano::blueprint::Blueprint;
use crate::cardano::{
    resolve_script, Asset, DraftBuilder, PlutusData, PlutusVersion, ResolvedScript,
};
use crate::config::NftConfig;
use crate::pinning::{PinningError, PinningService};
use crate::workflows::metadata::{
    asset_name_hex, is_cip68_unit, reference_asset_name, user_asset_name, Cip68Metadata,
};
use crate::workflows::{payment_key_hash, require, run, sign_and_submit};
use crate::workflows::{ChainContext, WalletSession, WorkflowError, WorkflowResult};

pub const MINT_VALIDATOR: &str = "nftcip68.mint.mint";
pub const STORE_VALIDATOR: &str = "store.store.spend";

const DEFAULT_MEDIA_TYPE: &str = "image/jpg";

/// Where the token image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An existing `ipfs://` link.
    Url(String),
    /// A file to pin first.
    Upload {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct Cip68MintRequest {
    pub name: String,
    pub description: String,
    pub image: ImageSource,
    /// Extra metadata pairs; blank keys or values are skipped.
    pub extra: Vec<(String, String)>,
}

impl Cip68MintRequest {
    fn validate(&self) -> WorkflowResult<()> {
        require("name", &self.name)?;
        require("description", &self.description)?;
        match &self.image {
            ImageSource::Url(url) if !url.trim().starts_with("ipfs://") => Err(
                WorkflowError::InvalidInput("image link must start with 'ipfs://'".to_string()),
            ),
            ImageSource::Upload { bytes, .. } if bytes.is_empty() => {
                Err(WorkflowError::InvalidInput("image file is empty".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Store validator and minting policy for one user.
#[derive(Debug, Clone)]
pub struct Cip68Scripts {
    pub store: ResolvedScript,
    pub mint: ResolvedScript,
}

impl Cip68Scripts {
    pub fn policy_id(&self) -> &str {
        &self.mint.hash
    }

    /// Unit of the reference token for a base asset name.
    pub fn reference_unit(&self, name_hex: &str) -> String {
        format!("{}{}", self.mint.hash, reference_asset_name(name_hex))
    }

    pub fn user_unit(&self, name_hex: &str) -> String {
        format!("{}{}", self.mint.hash, user_asset_name(name_hex))
    }
}

#[derive(Clone)]
pub struct Cip68Contract {
    mint_code: String,
    store_code: String,
    exchange_address: String,
    platform_fee: u64,
    pinning: Option<Arc<dyn PinningService>>,
}

impl Cip68Contract {
    pub fn new(
        mint_code: impl Into<String>,
        store_code: impl Into<String>,
        config: &NftConfig,
    ) -> Self {
        Self {
            mint_code: mint_code.into(),
            store_code: store_code.into(),
            exchange_address: config.exchange_address.clone(),
            platform_fee: config.platform_fee_lovelace,
            pinning: None,
        }
    }

    pub fn from_blueprint(blueprint: &Blueprint, config: &NftConfig) -> WorkflowResult<Self> {
        Ok(Self::new(
            blueprint.validator(MINT_VALIDATOR)?,
            blueprint.validator(STORE_VALIDATOR)?,
            config,
        ))
    }

    /// Pin uploaded images through `pinning`.
    pub fn with_pinning(mut self, pinning: Arc<dyn PinningService>) -> Self {
        self.pinning = Some(pinning);
        self
    }

    pub fn exchange_address(&self) -> &str {
        &self.exchange_address
    }

    pub fn platform_fee(&self) -> u64 {
        self.platform_fee
    }

    /// Scripts for the user with payment key hash `user_pkh`.
    pub fn scripts(&self, ctx: &ChainContext, user_pkh: &str) -> WorkflowResult<Cip68Scripts> {
        let exchange = AddressParts::decode(&self.exchange_address).map_err(|e| {
            WorkflowError::InvalidInput(format!("invalid exchange address: {}", e))
        })?;
        let exchange_pkh = exchange.pub_key_hash().ok_or_else(|| {
            WorkflowError::InvalidInput("exchange address has no payment key hash".to_string())
        })?;
        let exchange_stake = exchange.stake_credential_hash().unwrap_or_default();

        let store = resolve_script(
            ctx.engine.as_ref(),
            &self.store_code,
            &[
                PlutusData::bytes_hex(&exchange_pkh)?,
                PlutusData::Int(1),
                PlutusData::bytes_hex(user_pkh)?,
            ],
            PlutusVersion::V3,
            exchange.stake,
            ctx.network_id(),
        )?;
        let mint = resolve_script(
            ctx.engine.as_ref(),
            &self.mint_code,
            &[
                PlutusData::bytes_hex(&exchange_pkh)?,
                PlutusData::Int(1),
                PlutusData::bytes_hex(&store.hash)?,
                PlutusData::bytes_hex(&exchange_stake)?,
                PlutusData::bytes_hex(user_pkh)?,
            ],
            PlutusVersion::V3,
            None,
            ctx.network_id(),
        )?;
        Ok(Cip68Scripts { store, mint })
    }

    /// `ipfs://` link and media type of the image, pinning uploads.
    async fn resolve_image(&self, image: &ImageSource) -> WorkflowResult<(String, String)> {
        match image {
            ImageSource::Url(url) => Ok((url.trim().to_string(), DEFAULT_MEDIA_TYPE.to_string())),
            ImageSource::Upload {
                file_name,
                content_type,
                bytes,
            } => {
                let pinning = self
                    .pinning
                    .as_ref()
                    .ok_or(PinningError::NotConfigured)?;
                let cid = pinning
                    .pin_file(file_name, content_type.as_deref(), bytes.clone())
                    .await?;
                tracing::info!(cid = %cid, file_name = %file_name, "Pinned token image");
                let media_type = content_type
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
                Ok((format!("ipfs://{}", cid), media_type))
            }
        }
    }

    /// Mint a CIP-68 reference/user token pair.
    pub async fn mint(
        &self,
        session: &WalletSession,
        ctx: &ChainContext,
        request: &Cip68MintRequest,
    ) -> WorkflowResult<String> {
        run("nft_cip68_mint", async {
            request.validate()?;
            let op = session.begin()?;
            let wallet = op.wallet();

            let (image, media_type) = self.resolve_image(&request.image).await?;
            let utxos = wallet.utxos().await?;
            let address = wallet.change_address().await?;
            let collateral = wallet.first_collateral().await?;
            let user_pkh = payment_key_hash(&address)?;
            let scripts = self.scripts(ctx, &user_pkh)?;

            let name = request.name.trim();
            let mut metadata = Cip68Metadata::new();
            metadata.insert("name", name);
            metadata.insert("description", request.description.trim());
            metadata.insert("mediaType", media_type);
            metadata.insert("image", image);
            metadata.extend_pairs(&request.extra);

            let name_hex = asset_name_hex(name);
            let policy_id = scripts.policy_id().to_string();
            tracing::info!(
                policy_id = %policy_id,
                store = %scripts.store.address,
                name,
                "Minting CIP-68 token pair"
            );

            let draft = DraftBuilder::new(ctx.network)
                .mint_plutus(
                    1,
                    &policy_id,
                    user_asset_name(&name_hex),
                    scripts.mint.script.clone(),
                    PlutusData::constr0(vec![]),
                )
                .mint_plutus(
                    1,
                    &policy_id,
                    reference_asset_name(&name_hex),
                    scripts.mint.script.clone(),
                    PlutusData::constr0(vec![]),
                )
                .pay_to_with_inline_datum(
                    &scripts.store.address,
                    vec![Asset::new(scripts.reference_unit(&name_hex), 1)],
                    metadata.to_datum(),
                )
                .pay_to(&address, vec![Asset::new(scripts.user_unit(&name_hex), 1)])
                .pay_to(&self.exchange_address, vec![Asset::lovelace(self.platform_fee)])
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

/// CIP-68 reference and user tokens held by the connected wallet.
pub async fn list_cip68_assets(session: &WalletSession) -> WorkflowResult<Vec<Asset>> {
    let wallet = session.wallet()?;
    Ok(wallet
        .assets()
        .await?
        .into_iter()
        .filter(|a| is_cip68_unit(&a.unit))
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cardano::transaction::{MintWitness, OutputDatum};
    use crate::cardano::Network;
    use crate::pinning::PinningResult;
    use crate::workflows::testing::{key_address, key_hash, MockEngine, MockProvider, MockWallet};
    use async_trait::async_trait;
    use std::sync::Mutex;

    pub(crate) const MINT_CODE: &str = "59aa01";
    pub(crate) const STORE_CODE: &str = "59bb01";

    pub(crate) fn contract() -> Cip68Contract {
        Cip68Contract::new(
            MINT_CODE,
            STORE_CODE,
            &NftConfig {
                exchange_address: key_address(0xe0, 0xe1),
                ..NftConfig::default()
            },
        )
    }

    #[derive(Default)]
    struct RecordingPinner {
        files: Mutex<Vec<(String, Option<String>, usize)>>,
    }

    #[async_trait]
    impl PinningService for RecordingPinner {
        async fn pin_file(
            &self,
            file_name: &str,
            content_type: Option<&str>,
            bytes: Vec<u8>,
        ) -> PinningResult<String> {
            self.files.lock().unwrap().push((
                file_name.to_string(),
                content_type.map(str::to_string),
                bytes.len(),
            ));
            Ok("QmPinned".to_string())
        }
    }

    fn request(image: ImageSource) -> Cip68MintRequest {
        Cip68MintRequest {
            name: "Dog".into(),
            description: "A dog".into(),
            image,
            extra: vec![("color".into(), "brown".into()), ("".into(), "skip".into())],
        }
    }

    fn setup() -> (Arc<MockWallet>, Arc<MockEngine>, WalletSession, ChainContext) {
        let wallet = Arc::new(MockWallet::new(&key_address(0x0a, 0x0b)));
        let engine = Arc::new(MockEngine::default());
        let session = WalletSession::connected(wallet.clone());
        let ctx = ChainContext::new(Arc::new(MockProvider::default()), engine.clone(), Network::Preprod);
        (wallet, engine, session, ctx)
    }

    #[test]
    fn test_scripts_are_parameterized_in_order() {
        let (_, engine, _, ctx) = setup();
        let scripts = contract().scripts(&ctx, &key_hash(0x0a)).unwrap();

        let applied = engine.applied.lock().unwrap().clone();
        assert_eq!(applied.len(), 2);
        let (store_code, store_params) = &applied[0];
        assert_eq!(store_code, STORE_CODE);
        assert_eq!(
            store_params,
            &vec![
                PlutusData::Bytes(vec![0xe0; 28]),
                PlutusData::Int(1),
                PlutusData::Bytes(vec![0x0a; 28]),
            ]
        );
        let (mint_code, mint_params) = &applied[1];
        assert_eq!(mint_code, MINT_CODE);
        assert_eq!(mint_params[2], PlutusData::bytes_hex(&scripts.store.hash).unwrap());
        assert_eq!(mint_params[3], PlutusData::Bytes(vec![0xe1; 28]));

        let store = AddressParts::decode(&scripts.store.address).unwrap();
        assert_eq!(store.script_hash(), Some(scripts.store.hash.clone()));
        assert_eq!(store.stake_credential_hash(), Some(key_hash(0xe1)));
    }

    #[tokio::test]
    async fn test_mint_builds_token_pair() {
        let (wallet, engine, session, ctx) = setup();
        contract()
            .mint(&session, &ctx, &request(ImageSource::Url("ipfs://QmDog".into())))
            .await
            .unwrap();

        let scripts = contract().scripts(&ctx, &key_hash(0x0a)).unwrap();
        let draft = engine.last_draft();
        assert_eq!(draft.mints.len(), 2);
        assert_eq!(draft.mints[0].asset_name_hex, "000de140446f67");
        assert_eq!(draft.mints[1].asset_name_hex, "000643b0446f67");
        assert!(draft.mints.iter().all(|m| matches!(m.witness, MintWitness::Plutus { .. })));

        let store_out = &draft.outputs[0];
        assert_eq!(store_out.address, scripts.store.address);
        assert_eq!(store_out.amount[0].unit, scripts.reference_unit("446f67"));
        let OutputDatum::Inline(datum) = &store_out.datum else {
            panic!("expected inline datum");
        };
        let metadata = Cip68Metadata::from_datum(datum).unwrap();
        assert_eq!(metadata.get("image"), Some("ipfs://QmDog"));
        assert_eq!(metadata.get("mediaType"), Some("image/jpg"));
        assert_eq!(metadata.get("color"), Some("brown"));
        assert_eq!(metadata.entries().len(), 5);

        assert_eq!(draft.outputs[1].amount[0].unit, scripts.user_unit("446f67"));
        assert_eq!(draft.outputs[2].address, key_address(0xe0, 0xe1));
        assert_eq!(draft.outputs[2].amount[0].quantity, "1000000");
        assert_eq!(draft.required_signers, vec![key_hash(0x0a)]);
        assert_eq!(wallet.calls()[0], "sign_tx(unsigned1, partial=true)");
    }

    #[tokio::test]
    async fn test_upload_is_pinned_first() {
        let (_, engine, session, ctx) = setup();
        let pinner = Arc::new(RecordingPinner::default());
        let contract = contract().with_pinning(pinner.clone());
        let image = ImageSource::Upload {
            file_name: "dog.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        };
        contract.mint(&session, &ctx, &request(image)).await.unwrap();

        assert_eq!(
            pinner.files.lock().unwrap().clone(),
            vec![("dog.png".to_string(), Some("image/png".to_string()), 3)]
        );
        let OutputDatum::Inline(datum) = &engine.last_draft().outputs[0].datum else {
            panic!("expected inline datum");
        };
        let metadata = Cip68Metadata::from_datum(datum).unwrap();
        assert_eq!(metadata.get("image"), Some("ipfs://QmPinned"));
        assert_eq!(metadata.get("mediaType"), Some("image/png"));
    }

    #[tokio::test]
    async fn test_upload_without_pinning_service() {
        let (wallet, engine, session, ctx) = setup();
        let image = ImageSource::Upload {
            file_name: "dog.png".into(),
            content_type: None,
            bytes: vec![1],
        };
        let err = contract().mint(&session, &ctx, &request(image)).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Pinning(PinningError::NotConfigured)));
        assert!(engine.drafts().is_empty());
        assert!(!wallet.signed());
    }

    #[tokio::test]
    async fn test_list_filters_cip68_units() {
        let mut wallet = MockWallet::new(&key_address(1, 1));
        let policy = "ab".repeat(28);
        wallet.assets = vec![
            Asset::lovelace(5),
            Asset::new(format!("{}000de140446f67", policy), 1),
            Asset::new(format!("{}000643b0446f67", policy), 1),
            Asset::new(format!("{}446f67", policy), 1),
        ];
        let session = WalletSession::connected(Arc::new(wallet));
        let assets = list_cip68_assets(&session).await.unwrap();
        assert_eq!(assets.len(), 2);
    }
}
