//! Transaction digest and the intent message handed to a signer.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};

use crate::types::Digest;

type Blake2b256 = Blake2b<U32>;

/// Intent version 0, scope `TransactionData`, app id 0.
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

const DIGEST_SALT: &[u8] = b"TransactionData::";

/// Prefix wire bytes with [`TRANSACTION_INTENT`]. This is what a wallet
/// or hardware signer expects to receive.
pub fn intent_message(tx_bytes: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(TRANSACTION_INTENT.len() + tx_bytes.len());
    msg.extend_from_slice(&TRANSACTION_INTENT);
    msg.extend_from_slice(tx_bytes);
    msg
}

/// Blake2b-256 of the intent message. Ed25519 keys sign these 32 bytes.
pub fn signing_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(TRANSACTION_INTENT);
    hasher.update(tx_bytes);
    hasher.finalize().into()
}

/// The id the network assigns to a transaction, displayed as base58.
pub fn transaction_digest(tx_bytes: &[u8]) -> Digest {
    let mut hasher = Blake2b256::new();
    hasher.update(DIGEST_SALT);
    hasher.update(tx_bytes);
    Digest::new(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_prefix() {
        let msg = intent_message(&[0xAB, 0xCD]);
        assert_eq!(msg, vec![0, 0, 0, 0xAB, 0xCD]);
    }

    #[test]
    fn signing_digest_hashes_the_intent_message() {
        let tx = [1u8, 2, 3];
        let expected: [u8; 32] = Blake2b256::digest(intent_message(&tx)).into();
        assert_eq!(signing_digest(&tx), expected);
    }

    #[test]
    fn digest_is_salted_and_deterministic() {
        let a = transaction_digest(&[1, 2, 3]);
        assert_eq!(a, transaction_digest(&[1, 2, 3]));
        assert_ne!(a, transaction_digest(&[1, 2, 4]));

        let unsalted: [u8; 32] = Blake2b256::digest([1u8, 2, 3]).into();
        assert_ne!(a.0, unsalted);
        assert_eq!(a.to_string().parse::<Digest>().unwrap(), a);
    }
}
