//! Workflow set assembled from configuration.
//!
//! Loads each contract from the blueprint its config section names and
//! opens the co-sign hand-off store, reloading pending records when a
//! `handoff_path` is set.

use std::path::Path;
use std::sync::Arc;

use crate::cardano::blueprint::Blueprint;
use crate::config::PortalConfig;
use crate::pinning::PinningService;
use crate::workflows::hello_world::HelloWorldContract;
use crate::workflows::multisig::{CosignConfig, HandoffStore, MultisigTransfer};
use crate::workflows::nft_cip68::Cip68Contract;
use crate::workflows::nft_plutus::OneShotContract;
use crate::workflows::vesting::VestingContract;
use crate::workflows::{WorkflowError, WorkflowResult};

/// Every contract-backed workflow, ready to run against a `ChainContext`.
#[derive(Clone)]
pub struct Portal {
    pub hello_world: HelloWorldContract,
    pub vesting: VestingContract,
    pub one_shot: OneShotContract,
    pub cip68: Cip68Contract,
    pub multisig: MultisigTransfer,
}

impl Portal {
    pub fn from_config(config: &PortalConfig) -> WorkflowResult<Self> {
        let hello_world =
            HelloWorldContract::from_blueprint(&load(&config.nft.hello_world_blueprint_path)?)?;
        let vesting =
            VestingContract::from_blueprint(&load(&config.vesting.blueprint_path)?, &config.vesting)?;
        let one_shot = OneShotContract::from_blueprint(&load(&config.nft.one_shot_blueprint_path)?)?;
        let cip68 =
            Cip68Contract::from_blueprint(&load(&config.nft.cip68_blueprint_path)?, &config.nft)?;

        let store = match &config.multisig.handoff_path {
            Some(path) => HandoffStore::load_from_file(path).map_err(|e| {
                WorkflowError::Handoff(format!("cannot load records from {}: {}", path, e))
            })?,
            None => HandoffStore::new(None),
        };
        let multisig = MultisigTransfer::new(CosignConfig::from(&config.multisig), store);

        tracing::info!(
            pending_cosigns = multisig.store().len(),
            persistent_handoff = config.multisig.handoff_path.is_some(),
            "Workflows loaded"
        );

        Ok(Self {
            hello_world,
            vesting,
            one_shot,
            cip68,
            multisig,
        })
    }

    /// Pin CIP-68 images through `pinning`.
    pub fn with_pinning(mut self, pinning: Arc<dyn PinningService>) -> Self {
        self.cip68 = self.cip68.with_pinning(pinning);
        self
    }
}

fn load(path: &str) -> WorkflowResult<Blueprint> {
    tracing::debug!(path, "Loading blueprint");
    Ok(Blueprint::from_file(Path::new(path))?)
}
