//! The admission validator.

use crate::{AdmissionError, AdmissionResult, TokenDefinition, TokenKind};
use axon_crypto::{verify_key_certificate, PublicKey, TaggedHash};
use axon_store::{
    ChainStore, NodeTable, Pool, PoolsMemTable, NetworkRegisters, RegisterState, ScheduledKind,
    SchedulerRegistry, Transport,
};
use axon_transaction::{
    read_u16, read_u8, take, Transaction, TransactionType, SUB_UNITS,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::debug;

/// The binary record carried by a `node` transaction's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDeclaration {
    pub ip: Ipv4Addr,
    pub port: u16,
    pub http_port: u16,
    pub transport: Transport,
    pub reward_address: TaggedHash,
    pub origin_public_key: PublicKey,
    pub certificate: Vec<u8>,
}

impl NodeDeclaration {
    /// Encode as `node` transaction content.
    pub fn to_content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.ip.octets());
        out.extend_from_slice(&self.port.to_be_bytes());
        out.extend_from_slice(&self.http_port.to_be_bytes());
        out.push(self.transport as u8);
        self.reward_address.write(&mut out);
        self.origin_public_key.write(&mut out);
        out.extend_from_slice(&(self.certificate.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.certificate);
        out
    }

    /// Parse `node` transaction content; the record must consume the
    /// content exactly.
    pub fn parse(content: &[u8]) -> Result<Self, AdmissionError> {
        let mut input = content;
        let declaration = (|| {
            let ip_bytes = take(&mut input, 4)?;
            let ip = Ipv4Addr::new(ip_bytes[0], ip_bytes[1], ip_bytes[2], ip_bytes[3]);
            let port = read_u16(&mut input)?;
            let http_port = read_u16(&mut input)?;
            let transport = Transport::try_from(read_u8(&mut input)?)?;
            let reward_address = TaggedHash::decode(&mut input)?;
            let origin_public_key = PublicKey::decode(&mut input)?;
            let cert_len = read_u16(&mut input)? as usize;
            let certificate = take(&mut input, cert_len)?.to_vec();
            Ok::<_, axon_transaction::EncodingError>(Self {
                ip,
                port,
                http_port,
                transport,
                reward_address,
                origin_public_key,
                certificate,
            })
        })()
        .map_err(|_| AdmissionError::InvalidNodeContent)?;
        if !input.is_empty() {
            return Err(AdmissionError::InvalidNodeContent);
        }
        Ok(declaration)
    }
}

#[derive(Deserialize)]
struct MintRewardsContent {
    supply: u64,
}

/// Stateless gate every pending transaction passes before mining.
pub struct PendingValidator {
    store: Arc<dyn ChainStore>,
    nodes: Arc<NodeTable>,
    pools: Arc<PoolsMemTable>,
    schedulers: Arc<dyn SchedulerRegistry>,
    registers: NetworkRegisters,
}

impl PendingValidator {
    /// Build a validator over the collaborator bundle.
    pub fn new(
        store: Arc<dyn ChainStore>,
        nodes: Arc<NodeTable>,
        pools: Arc<PoolsMemTable>,
        schedulers: Arc<dyn SchedulerRegistry>,
        registers: NetworkRegisters,
    ) -> Self {
        Self {
            store,
            nodes,
            pools,
            schedulers,
            registers,
        }
    }

    /// Validate with the current UTC instant.
    pub fn validate_now(&self, tx: &Transaction) -> AdmissionResult {
        self.validate(tx, Utc::now())
    }

    /// Validate `tx` as of `now`. Deterministic: the same transaction and
    /// instant always yield the same verdict.
    pub fn validate(&self, tx: &Transaction, now: DateTime<Utc>) -> AdmissionResult {
        let registers = self.registers.snapshot();

        self.check_signatures(tx, &registers)?;
        self.check_content_size(tx, &registers)?;
        self.check_ownerships(tx)?;
        self.check_key_origin(tx, &registers)?;

        let result = match tx.tx_type {
            TransactionType::Node => self.check_node(tx),
            TransactionType::NodeSharedSecrets => {
                self.check_node_shared_secrets(tx, &registers, now)
            }
            TransactionType::Origin => self.check_origin(tx, &registers),
            TransactionType::CodeApproval => self.check_code_approval(tx),
            TransactionType::MintRewards => self.check_mint_rewards(tx, &registers, now),
            TransactionType::NodeRewards => self.check_trigger_window(
                tx,
                ScheduledKind::NodeRewards,
                now,
                AdmissionError::InvalidNodeRewardsTriggerTime,
            ),
            TransactionType::Oracle => self.check_trigger_window(
                tx,
                ScheduledKind::Oracle,
                now,
                AdmissionError::InvalidOracleTriggerTime,
            ),
            TransactionType::Token => self.check_token(tx),
            TransactionType::Transfer
            | TransactionType::Beacon
            | TransactionType::Hosting
            | TransactionType::Keychain
            | TransactionType::KeychainAccess => Ok(()),
        };

        if let Err(ref reason) = result {
            debug!(address = %tx.address, tx_type = %tx.tx_type, %reason, "Transaction refused");
        }
        result
    }

    fn check_signatures(&self, tx: &Transaction, registers: &RegisterState) -> AdmissionResult {
        if !tx.verify_previous_signature() {
            return Err(AdmissionError::InvalidPreviousSignature);
        }
        if !tx.verify_origin_signature(&registers.origin_public_keys()) {
            return Err(AdmissionError::InvalidOriginSignature);
        }
        Ok(())
    }

    fn check_content_size(&self, tx: &Transaction, registers: &RegisterState) -> AdmissionResult {
        if tx.data.content.len() > registers.content_max_size {
            return Err(AdmissionError::ContentTooLarge(tx.tx_type));
        }
        Ok(())
    }

    fn check_ownerships(&self, tx: &Transaction) -> AdmissionResult {
        for ownership in &tx.data.ownerships {
            if ownership.secret.is_empty() {
                return Err(AdmissionError::EmptyOwnershipSecret);
            }
            if ownership.authorized_keys.is_empty() {
                return Err(AdmissionError::MissingAuthorizedKeys);
            }
        }
        Ok(())
    }

    fn check_key_origin(&self, tx: &Transaction, registers: &RegisterState) -> AdmissionResult {
        if registers.allowed_node_key_origins.is_empty() {
            return Ok(());
        }
        let origin = registers.key_origin(&tx.previous_public_key);
        if !registers.allowed_node_key_origins.contains(&origin) {
            return Err(AdmissionError::InvalidKeyOrigin(tx.tx_type));
        }
        Ok(())
    }

    fn check_node(&self, tx: &Transaction) -> AdmissionResult {
        let declaration = NodeDeclaration::parse(&tx.data.content)?;
        if !verify_key_certificate(
            &tx.previous_public_key,
            &declaration.certificate,
            &declaration.origin_public_key,
        ) {
            return Err(AdmissionError::InvalidNodeCertificate);
        }
        Ok(())
    }

    fn check_node_shared_secrets(
        &self,
        tx: &Transaction,
        registers: &RegisterState,
        now: DateTime<Utc>,
    ) -> AdmissionResult {
        let genesis = registers
            .node_shared_secrets_genesis_address
            .as_ref()
            .ok_or(AdmissionError::InvalidNodeSharedSecretsChainAddress)?;
        if tx.previous_address() != *genesis {
            return Err(AdmissionError::InvalidNodeSharedSecretsChainAddress);
        }

        if tx.data.ownerships.is_empty() {
            return Err(AdmissionError::MissingNodeSharedSecrets);
        }
        for ownership in &tx.data.ownerships {
            for (public_key, _) in &ownership.authorized_keys {
                if !self.nodes.is_node_first_key(public_key) {
                    return Err(AdmissionError::UnknownAuthorizedNode);
                }
            }
        }

        // Content carries the daily nonce hash followed by the network
        // seed hash, nothing else.
        let mut input = tx.data.content.as_slice();
        let parsed = TaggedHash::decode(&mut input)
            .and_then(|_| TaggedHash::decode(&mut input))
            .map(|_| input.is_empty())
            .unwrap_or(false);
        if !parsed {
            return Err(AdmissionError::InvalidNodeSharedSecretsContent);
        }

        self.check_trigger_window(
            tx,
            ScheduledKind::NodeSharedSecrets,
            now,
            AdmissionError::InvalidNodeSharedSecretsTriggerTime,
        )
    }

    fn check_origin(&self, tx: &Transaction, registers: &RegisterState) -> AdmissionResult {
        if !registers
            .origin_genesis_addresses
            .iter()
            .any(|genesis| *genesis == tx.previous_address())
        {
            return Err(AdmissionError::InvalidOriginChainAddress);
        }

        let mut input = tx.data.content.as_slice();
        let subject =
            PublicKey::decode(&mut input).map_err(|_| AdmissionError::InvalidOriginContent)?;
        let cert_len =
            read_u16(&mut input).map_err(|_| AdmissionError::InvalidOriginContent)? as usize;
        let certificate = take(&mut input, cert_len)
            .map_err(|_| AdmissionError::InvalidOriginContent)?
            .to_vec();
        if !input.is_empty() {
            return Err(AdmissionError::InvalidOriginContent);
        }

        match (&registers.root_certificate_key, certificate.is_empty()) {
            (Some(root), _) => {
                if !verify_key_certificate(&subject, &certificate, root) {
                    return Err(AdmissionError::InvalidOriginCertificate);
                }
            }
            (None, true) => {}
            (None, false) => return Err(AdmissionError::InvalidOriginCertificate),
        }

        if !declares_origin_inherit_condition(&tx.data.code) {
            return Err(AdmissionError::InvalidOriginInheritCondition);
        }
        Ok(())
    }

    fn check_code_approval(&self, tx: &Transaction) -> AdmissionResult {
        let [proposal_address] = tx.data.recipients.as_slice() else {
            return Err(AdmissionError::InvalidCodeApprovalRecipients);
        };
        if !self.store.transaction_exists(proposal_address) {
            return Err(AdmissionError::CodeProposalMissing);
        }

        let sender_first_key = self
            .store
            .get_first_public_key(&tx.previous_address())
            .unwrap_or_else(|| tx.previous_public_key.clone());
        if !self.pools.is_member(Pool::TechnicalCouncil, &sender_first_key) {
            return Err(AdmissionError::CodeApprovalUnauthorizedSender);
        }

        let approvals = self.store.get_code_proposal_approvals(proposal_address);
        if approvals.contains(&sender_first_key) {
            return Err(AdmissionError::CodeProposalAlreadySigned);
        }
        Ok(())
    }

    fn check_mint_rewards(
        &self,
        tx: &Transaction,
        registers: &RegisterState,
        now: DateTime<Utc>,
    ) -> AdmissionResult {
        let genesis = registers
            .reward_genesis_address
            .as_ref()
            .ok_or(AdmissionError::InvalidMintRewardsChainAddress)?;
        if tx.previous_address() != *genesis {
            return Err(AdmissionError::InvalidMintRewardsChainAddress);
        }

        let content: MintRewardsContent = serde_json::from_slice(&tx.data.content)
            .map_err(|_| AdmissionError::InvalidMintRewardsContent)?;
        if content.supply != self.store.get_latest_burned_fees() {
            return Err(AdmissionError::SupplyMismatch);
        }

        self.check_trigger_window(
            tx,
            ScheduledKind::MintRewards,
            now,
            AdmissionError::MintRewardsAlreadyScheduled,
        )
    }

    fn check_token(&self, tx: &Transaction) -> AdmissionResult {
        let definition: TokenDefinition = serde_json::from_slice(&tx.data.content)
            .map_err(|_| AdmissionError::InvalidTokenSpecification)?;
        if definition.supply == 0 {
            return Err(AdmissionError::InvalidTokenSpecification);
        }
        if definition.kind == TokenKind::NonFungible {
            if definition.supply % SUB_UNITS != 0 {
                return Err(AdmissionError::InvalidTokenSupply);
            }
            if let Some(collection) = &definition.collection {
                if collection.len() as u64 != definition.supply / SUB_UNITS {
                    return Err(AdmissionError::InvalidTokenCollectionSize);
                }
            }
        }
        Ok(())
    }

    /// Per scheduled type, at most one transaction may be admitted since
    /// the last trigger: reject when the recorded chain tip was stamped at
    /// or after the trigger and is not the transaction we chain from.
    fn check_trigger_window(
        &self,
        tx: &Transaction,
        kind: ScheduledKind,
        now: DateTime<Utc>,
        rejection: AdmissionError,
    ) -> AdmissionResult {
        let last_trigger = self.schedulers.last_trigger_at(kind, now);
        let previous_address = tx.previous_address();
        if let Some(tip) = self.store.get_last_chain_address(&previous_address) {
            if tip.timestamp >= last_trigger && tip.address != previous_address {
                return Err(rejection);
            }
        }
        Ok(())
    }
}

fn declares_origin_inherit_condition(code: &str) -> bool {
    let canonical: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    canonical == "conditioninherit:[type:origin,content:true]"
}
