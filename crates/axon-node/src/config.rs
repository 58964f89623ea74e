//! Node configuration.

use crate::Args;
use anyhow::{Context, Result};
use axon_store::KeyOrigin;
use axon_transaction::DEFAULT_CONTENT_MAX_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name.
    pub node_name: String,
    /// Network (devnet, testnet, mainnet).
    pub network: String,
    /// P2P configuration.
    #[serde(default)]
    pub p2p: P2pConfig,
    /// Admission configuration.
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Bootstrap seeds.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// P2P configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct P2pConfig {
    /// P2P bind address.
    pub bind_address: String,
    /// Cap on a single datagram, in bytes.
    pub max_frame_size: usize,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            bind_address: format!("0.0.0.0:{}", axon_wire::DEFAULT_PORT),
            max_frame_size: axon_wire::DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Admission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Cap on transaction content, in bytes.
    pub content_max_size: usize,
    /// When non-empty, only these key origins may submit transactions.
    pub allowed_node_key_origins: Vec<KeyOrigin>,
    /// Upper bound on the mining acknowledgement wait, in seconds.
    pub mining_timeout_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            content_max_size: DEFAULT_CONTENT_MAX_SIZE,
            allowed_node_key_origins: Vec::new(),
            mining_timeout_secs: 60,
        }
    }
}

/// Seeds of the network-level chains, set once per network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Seed of this node's own key chain.
    pub node_seed: String,
    /// Seed of the node-shared-secrets chain.
    pub node_shared_secrets_seed: String,
    /// Seed of the rewards chain.
    pub reward_seed: String,
    /// Seeds of the origin chains (one per device family).
    pub origin_seeds: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            node_seed: "axon node seed".to_string(),
            node_shared_secrets_seed: "axon shared secrets seed".to_string(),
            reward_seed: "axon reward seed".to_string(),
            origin_seeds: vec!["axon origin seed".to_string()],
        }
    }
}

impl NodeConfig {
    /// Load configuration from file and CLI args.
    pub fn load(config_path: &Path, args: &Args) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Self::default_for_network(&args.network)
        };

        config.network = args.network.clone();
        if let Some(ref bind) = args.p2p_bind {
            config.p2p.bind_address = bind.clone();
        }
        Ok(config)
    }

    /// Create default config for a network.
    pub fn default_for_network(network: &str) -> Self {
        Self {
            node_name: "axon-node".to_string(),
            network: network.to_string(),
            p2p: P2pConfig::default(),
            admission: AdmissionConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default_for_network("devnet");
        assert_eq!(config.network, "devnet");
        assert_eq!(config.admission.mining_timeout_secs, 60);
        assert!(config.admission.allowed_node_key_origins.is_empty());
    }

    #[test]
    fn test_parse_key_origins() {
        let doc = r#"
            node_name = "axon-node"
            network = "devnet"

            [admission]
            content_max_size = 1048576
            allowed_node_key_origins = ["tpm", "usb"]
            mining_timeout_secs = 30
        "#;
        let config: NodeConfig = toml::from_str(doc).unwrap();
        assert_eq!(
            config.admission.allowed_node_key_origins,
            vec![KeyOrigin::Tpm, KeyOrigin::Usb]
        );
        assert_eq!(config.admission.content_max_size, 1_048_576);
    }
}
