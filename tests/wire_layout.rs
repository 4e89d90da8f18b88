//! Byte-level checks of the wire format against hand-encoded transactions.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};

use sui_ptb::{
    Address, Argument, Digest, Expiration, ObjectRef, Transaction, TransactionData,
    TransactionKind,
};

/// Hand-encoded `TransactionData::V1` splitting `amount` off the gas coin
/// and sending it to `recipient`, with one gas payment coin.
fn hand_encoded_transfer(
    sender: &[u8; 32],
    recipient: &[u8; 32],
    amount: u64,
    gas: &ObjectRef,
    gas_budget: u64,
    gas_price: u64,
) -> Vec<u8> {
    let mut tx = Vec::new();

    // TransactionData::V1
    tx.push(0x00);
    // TransactionKind::ProgrammableTransaction
    tx.push(0x00);

    // --- inputs (length=2) ---
    tx.push(0x02);
    //   [0] Pure(amount as u64 LE)
    tx.push(0x00);
    tx.push(8);
    tx.extend_from_slice(&amount.to_le_bytes());
    //   [1] Pure(recipient)
    tx.push(0x00);
    tx.push(32);
    tx.extend_from_slice(recipient);

    // --- commands (length=2) ---
    tx.push(0x02);
    //   [0] SplitCoins(GasCoin, [Input(0)])
    tx.push(0x02);
    tx.push(0x00);
    tx.push(0x01);
    tx.push(0x01);
    tx.extend_from_slice(&0u16.to_le_bytes());
    //   [1] TransferObjects([NestedResult(0, 0)], Input(1))
    tx.push(0x01);
    tx.push(0x01);
    tx.push(0x03);
    tx.extend_from_slice(&0u16.to_le_bytes());
    tx.extend_from_slice(&0u16.to_le_bytes());
    tx.push(0x01);
    tx.extend_from_slice(&1u16.to_le_bytes());

    // --- sender ---
    tx.extend_from_slice(sender);

    // --- GasData ---
    tx.push(0x01);
    tx.extend_from_slice(&gas.object_id.0);
    tx.extend_from_slice(&gas.version.to_le_bytes());
    tx.push(32);
    tx.extend_from_slice(&gas.digest.0);
    tx.extend_from_slice(sender);
    tx.extend_from_slice(&gas_price.to_le_bytes());
    tx.extend_from_slice(&gas_budget.to_le_bytes());

    // TransactionExpiration::None
    tx.push(0x00);

    tx
}

fn gas_coin() -> ObjectRef {
    ObjectRef::new(Address::new([0xCC; 32]), 42, Digest::new([0xDD; 32]))
}

#[tokio::test]
async fn transfer_matches_hand_encoding() {
    let sender = Address::new([0xAA; 32]);
    let recipient = Address::new([0xBB; 32]);

    let mut tx = Transaction::new();
    tx.set_sender(sender).unwrap();
    tx.set_gas_price(750).unwrap();
    tx.set_gas_budget(5_000_000).unwrap();
    tx.set_gas_payment(vec![gas_coin()]).unwrap();
    tx.transfer_sui(recipient, 500).unwrap();

    let bytes = tx.build().await.unwrap();
    let expected = hand_encoded_transfer(&sender.0, &recipient.0, 500, &gas_coin(), 5_000_000, 750);
    assert_eq!(hex::encode(&bytes), hex::encode(&expected));
}

#[tokio::test]
async fn digest_is_salted_blake2b() {
    let mut tx = Transaction::new();
    tx.set_sender(Address::new([0x01; 32])).unwrap();
    tx.set_gas_price(1).unwrap();
    tx.set_gas_budget(1000).unwrap();
    tx.set_gas_payment(vec![gas_coin()]).unwrap();
    tx.transfer_sui(Address::new([0x02; 32]), 1).unwrap();
    let bytes = tx.build().await.unwrap();

    let mut hasher = Blake2b::<U32>::new();
    hasher.update(b"TransactionData::");
    hasher.update(&bytes);
    let expected: [u8; 32] = hasher.finalize().into();

    let digest = tx.digest().unwrap();
    assert_eq!(digest.0, expected);
    assert_eq!(digest.to_string(), bs58::encode(expected).into_string());
}

#[test]
fn decoded_bytes_re_encode_identically() {
    let sender = [0x11; 32];
    let recipient = [0x22; 32];
    let bytes = hand_encoded_transfer(&sender, &recipient, 7, &gas_coin(), 10, 2);

    let data = TransactionData::from_wire_bytes(&bytes).unwrap();
    assert_eq!(data.sender, Some(Address::new(sender)));
    assert_eq!(data.gas_data.payment, Some(vec![gas_coin()]));
    assert_eq!(data.gas_data.owner, Some(Address::new(sender)));
    assert_eq!(data.expiration, Some(Expiration::None));
    assert_eq!(data.commands.len(), 2);
    assert_eq!(data.to_wire_bytes().unwrap(), bytes);

    let tx = Transaction::from_wire_bytes(&bytes).unwrap();
    assert_eq!(tx.digest().unwrap(), sui_ptb::transaction_digest(&bytes));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = hand_encoded_transfer(&[1; 32], &[2; 32], 7, &gas_coin(), 10, 2);
    bytes.push(0);
    assert!(TransactionData::from_wire_bytes(&bytes).is_err());
}

#[test]
fn truncated_input_is_rejected() {
    let bytes = hand_encoded_transfer(&[1; 32], &[2; 32], 7, &gas_coin(), 10, 2);
    for len in [0, 1, 5, bytes.len() - 1] {
        assert!(
            TransactionData::from_wire_bytes(&bytes[..len]).is_err(),
            "accepted {len} bytes"
        );
    }
}

#[tokio::test]
async fn kind_bytes_are_the_kind_section() {
    let mut tx = Transaction::new();
    let amount = tx.pure_u64(7).unwrap();
    let coin = tx.split_coins(Argument::GasCoin, vec![amount]).unwrap();
    let to = tx.pure_address(Address::new([2; 32])).unwrap();
    tx.transfer_objects(vec![coin], to).unwrap();

    let kind = tx
        .build_with(sui_ptb::BuildOptions::kind_only())
        .await
        .unwrap();
    // ProgrammableTransaction, 2 inputs
    assert_eq!(&kind[..2], &[0x00, 0x02]);

    let decoded = TransactionKind::from_wire_bytes(&kind).unwrap();
    assert_eq!(decoded.inputs, tx.inputs());
    assert_eq!(decoded.commands, tx.commands());
}

#[tokio::test]
async fn move_call_with_shared_object() {
    let mut tx = Transaction::new();
    tx.set_sender(Address::new([1; 32])).unwrap();
    tx.set_gas_price(1).unwrap();
    tx.set_gas_budget(1).unwrap();
    tx.set_gas_payment(vec![]).unwrap();
    let clock = tx.shared_object("0x6".parse().unwrap(), 1, false).unwrap();
    tx.move_call("0x2::clock::timestamp_ms", vec![], vec![clock])
        .unwrap();
    let bytes = tx.build().await.unwrap();

    let mut expected = vec![0x00, 0x00, 0x01];
    // CallArg::Object(Shared { 0x6, 1, false })
    expected.extend_from_slice(&[0x01, 0x01]);
    let mut six = [0u8; 32];
    six[31] = 6;
    expected.extend_from_slice(&six);
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.push(0x00);
    // one MoveCall
    expected.extend_from_slice(&[0x01, 0x00]);
    let mut two = [0u8; 32];
    two[31] = 2;
    expected.extend_from_slice(&two);
    expected.push(5);
    expected.extend_from_slice(b"clock");
    expected.push(12);
    expected.extend_from_slice(b"timestamp_ms");
    // no type args, one argument Input(0)
    expected.extend_from_slice(&[0x00, 0x01, 0x01, 0x00, 0x00]);

    assert_eq!(&bytes[..expected.len()], &expected[..]);
}
