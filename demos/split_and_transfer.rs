//! Build, digest and sign a SUI transfer offline.
//!
//! Usage:
//!   cargo run --example split_and_transfer -- <RECIPIENT> <AMOUNT_MIST>
//!
//! Gas payment is left empty, so the bytes are good for a dry run but not
//! for execution. Supply real gas coins with `set_gas_payment` for that.

use std::env;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};
use ed25519_dalek::{Signer, SigningKey};
use sui_ptb::{signing_digest, Address, Transaction};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: split_and_transfer <RECIPIENT_0x...> <AMOUNT_MIST>");
        std::process::exit(1);
    }

    let recipient: Address = args[1].parse().unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });
    let amount: u64 = args[2].parse().unwrap_or_else(|_| {
        eprintln!("amount must be a u64 (MIST)");
        std::process::exit(1);
    });

    // throwaway key, do not use for real funds
    let key = SigningKey::from_bytes(&[7u8; 32]);
    // Ed25519 address: Blake2b-256 over the scheme flag and public key
    let mut hasher = Blake2b::<U32>::new();
    hasher.update([0x00]);
    hasher.update(key.verifying_key().as_bytes());
    let sender = Address::new(hasher.finalize().into());

    let mut tx = Transaction::new();
    tx.set_sender(sender).expect("fresh builder");
    tx.set_gas_budget(10_000_000).expect("fresh builder");
    tx.transfer_sui(recipient, amount).expect("fresh builder");

    let bytes = tx.build().await.unwrap_or_else(|e| {
        eprintln!("build failed: {e}");
        std::process::exit(1);
    });
    let digest = tx.digest().expect("built transaction has a digest");
    let signature = key.sign(&signing_digest(&bytes));

    println!("sender:    {sender}");
    println!("digest:    {digest}");
    println!("tx_bytes:  {}", sui_ptb::bcs::to_base64(&bytes));
    println!("signature: {}", hex::encode(signature.to_bytes()));
}
