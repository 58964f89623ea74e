//! Canonical byte encoding.
//!
//! All integers are big-endian. Field order is consensus-relevant: peers
//! reject any deviation, and the previous/origin signatures are computed
//! over these exact bytes. Changing anything here is a network break.

use crate::{
    EncodingError, EncodingResult, Ledger, Ownership, TokenTransfer, Transaction,
    TransactionData, TransactionType, UcoTransfer,
};
use axon_crypto::{PublicKey, TaggedHash};

/// Largest sub-unit amount exactly representable in an IEEE-754 binary64.
pub const MAX_WIRE_AMOUNT: u64 = 1 << 53;

/// Split `n` bytes off the front of `input`, advancing it.
pub fn take<'a>(input: &mut &'a [u8], n: usize) -> EncodingResult<&'a [u8]> {
    if input.len() < n {
        return Err(EncodingError::ShortInput {
            needed: n - input.len(),
        });
    }
    let (head, tail) = input.split_at(n);
    *input = tail;
    Ok(head)
}

/// Read a single byte.
pub fn read_u8(input: &mut &[u8]) -> EncodingResult<u8> {
    Ok(take(input, 1)?[0])
}

/// Read a big-endian u16.
pub fn read_u16(input: &mut &[u8]) -> EncodingResult<u16> {
    let bytes = take(input, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a big-endian u32.
pub fn read_u32(input: &mut &[u8]) -> EncodingResult<u32> {
    let bytes = take(input, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a big-endian u64.
pub fn read_u64(input: &mut &[u8]) -> EncodingResult<u64> {
    let bytes = take(input, 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(u64::from_be_bytes(buf))
}

/// Read a big-endian IEEE-754 binary64.
pub fn read_f64(input: &mut &[u8]) -> EncodingResult<f64> {
    Ok(f64::from_bits(read_u64(input)?))
}

/// Read a u8-length-prefixed byte string.
pub fn read_bytes_u8(input: &mut &[u8]) -> EncodingResult<Vec<u8>> {
    let len = read_u8(input)? as usize;
    Ok(take(input, len)?.to_vec())
}

/// Read a u32-length-prefixed byte string.
pub fn read_bytes_u32(input: &mut &[u8]) -> EncodingResult<Vec<u8>> {
    let len = read_u32(input)? as usize;
    Ok(take(input, len)?.to_vec())
}

/// Append a big-endian u16.
pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Append a big-endian u32.
pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Append a big-endian u64.
pub fn write_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Append a big-endian IEEE-754 binary64.
pub fn write_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_bits().to_be_bytes());
}

/// Append a u8-length-prefixed byte string.
pub fn write_bytes_u8(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
}

/// Append a u32-length-prefixed byte string.
pub fn write_bytes_u32(out: &mut Vec<u8>, bytes: &[u8]) {
    write_u32(out, bytes.len() as u32);
    out.extend_from_slice(bytes);
}

/// Encode a sub-unit amount for the wire.
///
/// Wire amounts are binary64 values holding the integer sub-unit count,
/// exact up to [`MAX_WIRE_AMOUNT`].
pub fn amount_to_wire(amount: u64) -> f64 {
    amount as f64
}

/// Decode a wire amount back to sub-units, exactly.
pub fn amount_from_wire(value: f64) -> EncodingResult<u64> {
    if !value.is_finite()
        || value < 0.0
        || value > MAX_WIRE_AMOUNT as f64
        || value.fract() != 0.0
    {
        return Err(EncodingError::AmountNotRepresentable);
    }
    Ok(value as u64)
}

impl Ownership {
    fn write(&self, out: &mut Vec<u8>) {
        write_bytes_u32(out, &self.secret);
        out.push(self.authorized_keys.len() as u8);
        for (public_key, encrypted_key) in &self.authorized_keys {
            public_key.write(out);
            write_bytes_u8(out, encrypted_key);
        }
    }

    fn read(input: &mut &[u8]) -> EncodingResult<Self> {
        let secret = read_bytes_u32(input)?;
        let key_count = read_u8(input)? as usize;
        let mut authorized_keys = Vec::with_capacity(key_count);
        for _ in 0..key_count {
            let public_key = PublicKey::decode(input)?;
            let encrypted_key = read_bytes_u8(input)?;
            authorized_keys.push((public_key, encrypted_key));
        }
        Ok(Self {
            secret,
            authorized_keys,
        })
    }
}

impl TransactionData {
    /// Canonical byte encoding of the data block.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_bytes_u32(&mut out, &self.content);
        write_bytes_u32(&mut out, self.code.as_bytes());

        out.push(self.ownerships.len() as u8);
        for ownership in &self.ownerships {
            ownership.write(&mut out);
        }

        out.push(self.recipients.len() as u8);
        for recipient in &self.recipients {
            recipient.write(&mut out);
        }

        out.push(self.ledger.uco.len() as u8);
        for transfer in &self.ledger.uco {
            transfer.to.write(&mut out);
            write_f64(&mut out, amount_to_wire(transfer.amount));
        }

        out.push(self.ledger.token.len() as u8);
        for transfer in &self.ledger.token {
            transfer.token_address.write(&mut out);
            transfer.to.write(&mut out);
            write_f64(&mut out, amount_to_wire(transfer.amount));
        }

        out
    }

    /// Decode a data block from the front of `input`.
    pub fn deserialize(input: &mut &[u8]) -> EncodingResult<Self> {
        let content = read_bytes_u32(input)?;
        let code = String::from_utf8(read_bytes_u32(input)?)
            .map_err(|_| EncodingError::Malformed("code is not valid UTF-8"))?;

        let ownership_count = read_u8(input)? as usize;
        let mut ownerships = Vec::with_capacity(ownership_count);
        for _ in 0..ownership_count {
            ownerships.push(Ownership::read(input)?);
        }

        let recipient_count = read_u8(input)? as usize;
        let mut recipients = Vec::with_capacity(recipient_count);
        for _ in 0..recipient_count {
            recipients.push(TaggedHash::decode(input)?);
        }

        let uco_count = read_u8(input)? as usize;
        let mut uco = Vec::with_capacity(uco_count);
        for _ in 0..uco_count {
            let to = TaggedHash::decode(input)?;
            let amount = amount_from_wire(read_f64(input)?)?;
            uco.push(UcoTransfer { to, amount });
        }

        let token_count = read_u8(input)? as usize;
        let mut token = Vec::with_capacity(token_count);
        for _ in 0..token_count {
            let token_address = TaggedHash::decode(input)?;
            let to = TaggedHash::decode(input)?;
            let amount = amount_from_wire(read_f64(input)?)?;
            token.push(TokenTransfer {
                token_address,
                to,
                amount,
            });
        }

        Ok(Self {
            content,
            code,
            ownerships,
            recipients,
            ledger: Ledger { uco, token },
        })
    }
}

impl Transaction {
    /// The bytes covered by the previous signature.
    pub fn signing_payload(&self) -> Vec<u8> {
        self.data.serialize()
    }

    /// The bytes covered by the origin signature: everything up to and
    /// including the previous signature.
    pub fn origin_payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.address.write(&mut out);
        out.push(self.tx_type as u8);
        out.extend_from_slice(&self.data.serialize());
        self.previous_public_key.write(&mut out);
        write_bytes_u8(&mut out, &self.previous_signature);
        out
    }

    /// Canonical byte encoding of the whole transaction.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = self.origin_payload();
        write_bytes_u8(&mut out, &self.origin_signature);
        out
    }

    /// Decode a transaction from the front of `input`.
    pub fn deserialize(input: &mut &[u8]) -> EncodingResult<Self> {
        let address = TaggedHash::decode(input)?;
        let tx_type = TransactionType::try_from(read_u8(input)?)?;
        let data = TransactionData::deserialize(input)?;
        let previous_public_key = PublicKey::decode(input)?;
        let previous_signature = read_bytes_u8(input)?;
        let origin_signature = read_bytes_u8(input)?;
        Ok(Self {
            address,
            tx_type,
            data,
            previous_public_key,
            previous_signature,
            origin_signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_crypto::{derive_keypair, Curve, HashAlgorithm};

    fn sample_hash(byte: u8) -> TaggedHash {
        TaggedHash::compute(HashAlgorithm::Sha256, &[byte])
    }

    fn sample_transaction() -> Transaction {
        let origin = derive_keypair(b"origin", 0, Curve::Ed25519).unwrap();
        let reader = derive_keypair(b"reader", 0, Curve::Ed25519).unwrap();
        let data = TransactionData {
            content: b"content bytes".to_vec(),
            code: "condition inherit: []".to_string(),
            ownerships: vec![Ownership {
                secret: vec![0xAA; 20],
                authorized_keys: vec![(reader.public().clone(), vec![0xBB; 44])],
            }],
            recipients: vec![sample_hash(1), sample_hash(2)],
            ledger: Ledger {
                uco: vec![UcoTransfer {
                    to: sample_hash(3),
                    amount: 1_250_000_000,
                }],
                token: vec![TokenTransfer {
                    token_address: sample_hash(4),
                    to: sample_hash(5),
                    amount: 300,
                }],
            },
        };
        Transaction::build(
            TransactionType::Transfer,
            data,
            b"chain seed",
            0,
            Curve::Ed25519,
            &origin,
        )
        .unwrap()
    }

    #[test]
    fn test_transaction_roundtrip() {
        let tx = sample_transaction();
        let encoded = tx.serialize();

        let mut input = encoded.as_slice();
        let decoded = Transaction::deserialize(&mut input).unwrap();
        assert!(input.is_empty());
        assert_eq!(decoded, tx);
    }

    #[test]
    fn test_serialisation_is_stable() {
        let tx = sample_transaction();
        assert_eq!(tx.serialize(), tx.clone().serialize());
    }

    #[test]
    fn test_deserialize_leaves_remainder() {
        let tx = sample_transaction();
        let mut encoded = tx.serialize();
        encoded.extend_from_slice(b"next frame");

        let mut input = encoded.as_slice();
        let decoded = Transaction::deserialize(&mut input).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(input, b"next frame");
    }

    #[test]
    fn test_truncated_transaction_is_short_input() {
        let tx = sample_transaction();
        let encoded = tx.serialize();
        let mut input = &encoded[..encoded.len() - 5];
        assert!(matches!(
            Transaction::deserialize(&mut input),
            Err(EncodingError::ShortInput { .. })
        ));
    }

    #[test]
    fn test_amount_conversion_exact_at_bound() {
        assert_eq!(amount_from_wire(amount_to_wire(MAX_WIRE_AMOUNT)).unwrap(), MAX_WIRE_AMOUNT);
        assert_eq!(amount_from_wire(amount_to_wire(0)).unwrap(), 0);
        assert_eq!(
            amount_from_wire(amount_to_wire(123_456_789)).unwrap(),
            123_456_789
        );
    }

    #[test]
    fn test_amount_conversion_rejects_fractions() {
        assert!(amount_from_wire(0.5).is_err());
        assert!(amount_from_wire(-1.0).is_err());
        assert!(amount_from_wire(f64::NAN).is_err());
        assert!(amount_from_wire(f64::INFINITY).is_err());
    }

    #[test]
    fn test_signed_payload_prefix_of_serialisation() {
        // The origin payload is a strict prefix of the full encoding, so
        // the origin signature covers everything that precedes it.
        let tx = sample_transaction();
        let full = tx.serialize();
        let body = tx.origin_payload();
        assert!(full.starts_with(&body));
    }
}
