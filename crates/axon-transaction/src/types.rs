//! Transaction type tags.

use crate::EncodingError;

/// The closed set of transaction types.
///
/// The discriminant is the wire byte; the order is consensus-relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransactionType {
    /// Node membership declaration.
    Node = 0,
    /// Rotation of the network-wide shared secrets.
    NodeSharedSecrets = 1,
    /// Registration of an origin (device family) public key.
    Origin = 2,
    /// Approval of a code proposal by a council member.
    CodeApproval = 3,
    /// Asset transfer.
    Transfer = 4,
    /// Token creation.
    Token = 5,
    /// Minting of rewards against burned fees.
    MintRewards = 6,
    /// Distribution of node rewards.
    NodeRewards = 7,
    /// Oracle data point.
    Oracle = 8,
    /// Beacon-chain summary.
    Beacon = 9,
    /// Web-hosting content.
    Hosting = 10,
    /// Keychain declaration.
    Keychain = 11,
    /// Keychain access grant.
    KeychainAccess = 12,
}

impl TransactionType {
    /// All types, in wire order.
    pub const ALL: [TransactionType; 13] = [
        TransactionType::Node,
        TransactionType::NodeSharedSecrets,
        TransactionType::Origin,
        TransactionType::CodeApproval,
        TransactionType::Transfer,
        TransactionType::Token,
        TransactionType::MintRewards,
        TransactionType::NodeRewards,
        TransactionType::Oracle,
        TransactionType::Beacon,
        TransactionType::Hosting,
        TransactionType::Keychain,
        TransactionType::KeychainAccess,
    ];

    /// Types whose admission is bound to a scheduler trigger.
    pub fn is_scheduled(&self) -> bool {
        matches!(
            self,
            TransactionType::NodeSharedSecrets
                | TransactionType::MintRewards
                | TransactionType::NodeRewards
                | TransactionType::Oracle
        )
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TransactionType::ALL
            .get(value as usize)
            .copied()
            .ok_or(EncodingError::UnknownTransactionType(value))
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionType::Node => "node",
            TransactionType::NodeSharedSecrets => "node shared secrets",
            TransactionType::Origin => "origin",
            TransactionType::CodeApproval => "code approval",
            TransactionType::Transfer => "transfer",
            TransactionType::Token => "token",
            TransactionType::MintRewards => "mint rewards",
            TransactionType::NodeRewards => "node rewards",
            TransactionType::Oracle => "oracle",
            TransactionType::Beacon => "beacon",
            TransactionType::Hosting => "hosting",
            TransactionType::Keychain => "keychain",
            TransactionType::KeychainAccess => "keychain access",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_byte_roundtrip() {
        for tx_type in TransactionType::ALL {
            assert_eq!(TransactionType::try_from(tx_type as u8).unwrap(), tx_type);
        }
    }

    #[test]
    fn test_unknown_byte_rejected() {
        assert!(matches!(
            TransactionType::try_from(13),
            Err(EncodingError::UnknownTransactionType(13))
        ));
    }

    #[test]
    fn test_scheduled_types() {
        assert!(TransactionType::Oracle.is_scheduled());
        assert!(TransactionType::MintRewards.is_scheduled());
        assert!(!TransactionType::Transfer.is_scheduled());
    }
}
