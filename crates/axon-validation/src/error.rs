//! Admission rejection reasons.
//!
//! The rendered messages are part of the external contract: clients and
//! tests match them verbatim, so they must stay byte-stable (including
//! the historical `greaterthan` spelling).

use axon_transaction::TransactionType;
use thiserror::Error;

/// Why a pending transaction was refused admission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Invalid previous signature")]
    InvalidPreviousSignature,

    #[error("Invalid origin signature")]
    InvalidOriginSignature,

    #[error("Invalid {0} transaction with content size greaterthan content_max_size")]
    ContentTooLarge(TransactionType),

    #[error("Invalid ownership with an empty secret")]
    EmptyOwnershipSecret,

    #[error("Invalid ownership without authorized keys")]
    MissingAuthorizedKeys,

    #[error("Invalid {0} transaction with invalid key origin")]
    InvalidKeyOrigin(TransactionType),

    #[error("Invalid node transaction with invalid content")]
    InvalidNodeContent,

    #[error("Invalid node transaction with invalid certificate")]
    InvalidNodeCertificate,

    #[error("Invalid node shared secrets chain address")]
    InvalidNodeSharedSecretsChainAddress,

    #[error("Invalid node shared secrets transaction with invalid content")]
    InvalidNodeSharedSecretsContent,

    #[error("Invalid node shared secrets transaction without node secrets")]
    MissingNodeSharedSecrets,

    #[error("Invalid node shared secrets transaction with unknown authorized node")]
    UnknownAuthorizedNode,

    #[error("Invalid node shared secrets trigger time")]
    InvalidNodeSharedSecretsTriggerTime,

    #[error("Invalid origin chain address")]
    InvalidOriginChainAddress,

    #[error("Invalid origin transaction with invalid content")]
    InvalidOriginContent,

    #[error("Invalid origin transaction with invalid certificate")]
    InvalidOriginCertificate,

    #[error("Invalid origin transaction with invalid inherit condition")]
    InvalidOriginInheritCondition,

    #[error("Invalid code approval transaction with invalid recipients")]
    InvalidCodeApprovalRecipients,

    #[error("Code proposal doesn't exist")]
    CodeProposalMissing,

    #[error("Invalid code approval transaction with unauthorized sender")]
    CodeApprovalUnauthorizedSender,

    #[error("Code proposal already signed by the sender")]
    CodeProposalAlreadySigned,

    #[error("Invalid mint rewards chain address")]
    InvalidMintRewardsChainAddress,

    #[error("Invalid mint rewards transaction with invalid content")]
    InvalidMintRewardsContent,

    #[error("The supply do not match burned fees from last summary")]
    SupplyMismatch,

    #[error("There is already a mint rewards transaction since last schedule")]
    MintRewardsAlreadyScheduled,

    #[error("Invalid node rewards trigger time")]
    InvalidNodeRewardsTriggerTime,

    #[error("Invalid oracle trigger time")]
    InvalidOracleTriggerTime,

    #[error("Invalid token transaction with invalid specification")]
    InvalidTokenSpecification,

    #[error("Invalid token transaction with invalid supply")]
    InvalidTokenSupply,

    #[error("Invalid token transaction with invalid collection size")]
    InvalidTokenCollectionSize,
}

/// Result type for admission checks.
pub type AdmissionResult = Result<(), AdmissionError>;
