//! Auxiliary chain records carried by the wire protocol.

use crate::encoding::{
    amount_from_wire, amount_to_wire, read_bytes_u8, read_f64, read_u16, read_u32, read_u8,
    write_bytes_u8, write_f64, write_u16, write_u32,
};
use crate::{EncodingError, EncodingResult, TransactionType};
use axon_crypto::{PublicKey, TaggedHash};

/// The asset a movement is denominated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetClass {
    /// The native coin.
    Uco,
    /// A token, identified by its creation address.
    Token(TaggedHash),
}

impl AssetClass {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            AssetClass::Uco => out.push(0),
            AssetClass::Token(address) => {
                out.push(1);
                address.write(out);
            }
        }
    }

    fn read(input: &mut &[u8]) -> EncodingResult<Self> {
        match read_u8(input)? {
            0 => Ok(AssetClass::Uco),
            1 => Ok(AssetClass::Token(TaggedHash::decode(input)?)),
            _ => Err(EncodingError::Malformed("unknown asset class")),
        }
    }
}

/// Stamp produced by the coordinator node during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationStamp {
    /// Unix timestamp of the validation.
    pub timestamp: u32,
    /// Key that solved the proof of work (origin device family).
    pub proof_of_work: PublicKey,
    /// Chain integrity digest.
    pub proof_of_integrity: TaggedHash,
    /// Coordinator signature over the stamp body.
    pub signature: Vec<u8>,
}

impl ValidationStamp {
    /// Append the wire encoding to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        write_u32(out, self.timestamp);
        self.proof_of_work.write(out);
        self.proof_of_integrity.write(out);
        write_bytes_u8(out, &self.signature);
    }

    /// Decode a stamp from the front of `input`.
    pub fn read(input: &mut &[u8]) -> EncodingResult<Self> {
        let timestamp = read_u32(input)?;
        let proof_of_work = PublicKey::decode(input)?;
        let proof_of_integrity = TaggedHash::decode(input)?;
        let signature = read_bytes_u8(input)?;
        Ok(Self {
            timestamp,
            proof_of_work,
            proof_of_integrity,
            signature,
        })
    }
}

/// Condensed view of a validated transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    /// Transaction address.
    pub address: TaggedHash,
    /// Validation timestamp.
    pub timestamp: u32,
    /// Transaction type.
    pub tx_type: TransactionType,
    /// Addresses touched by the ledger movements.
    pub movement_addresses: Vec<TaggedHash>,
}

impl TransactionSummary {
    /// Append the wire encoding to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.address.write(out);
        write_u32(out, self.timestamp);
        out.push(self.tx_type as u8);
        write_u16(out, self.movement_addresses.len() as u16);
        for address in &self.movement_addresses {
            address.write(out);
        }
    }

    /// Decode a summary from the front of `input`.
    pub fn read(input: &mut &[u8]) -> EncodingResult<Self> {
        let address = TaggedHash::decode(input)?;
        let timestamp = read_u32(input)?;
        let tx_type = TransactionType::try_from(read_u8(input)?)?;
        let count = read_u16(input)? as usize;
        let mut movement_addresses = Vec::with_capacity(count);
        for _ in 0..count {
            movement_addresses.push(TaggedHash::decode(input)?);
        }
        Ok(Self {
            address,
            timestamp,
            tx_type,
            movement_addresses,
        })
    }
}

/// A funding input of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    /// Address the funds came from.
    pub from: TaggedHash,
    /// Amount in sub-units.
    pub amount: u64,
    /// Asset class of the movement.
    pub asset: AssetClass,
    /// Whether the input has been consumed.
    pub spent: bool,
    /// Unix timestamp of the movement.
    pub timestamp: u32,
}

impl TransactionInput {
    /// Append the wire encoding to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.from.write(out);
        write_f64(out, amount_to_wire(self.amount));
        self.asset.write(out);
        out.push(self.spent as u8);
        write_u32(out, self.timestamp);
    }

    /// Decode an input from the front of `input`.
    pub fn read(input: &mut &[u8]) -> EncodingResult<Self> {
        let from = TaggedHash::decode(input)?;
        let amount = amount_from_wire(read_f64(input)?)?;
        let asset = AssetClass::read(input)?;
        let spent = match read_u8(input)? {
            0 => false,
            1 => true,
            _ => return Err(EncodingError::Malformed("invalid spent flag")),
        };
        let timestamp = read_u32(input)?;
        Ok(Self {
            from,
            amount,
            asset,
            spent,
            timestamp,
        })
    }
}

/// An unspent output of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentOutput {
    /// Address the funds came from.
    pub from: TaggedHash,
    /// Amount in sub-units.
    pub amount: u64,
    /// Asset class of the movement.
    pub asset: AssetClass,
}

impl UnspentOutput {
    /// Append the wire encoding to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        self.from.write(out);
        write_f64(out, amount_to_wire(self.amount));
        self.asset.write(out);
    }

    /// Decode an output from the front of `input`.
    pub fn read(input: &mut &[u8]) -> EncodingResult<Self> {
        let from = TaggedHash::decode(input)?;
        let amount = amount_from_wire(read_f64(input)?)?;
        let asset = AssetClass::read(input)?;
        Ok(Self {
            from,
            amount,
            asset,
        })
    }
}
