//! secp256k1 account primitives shared by the shipped keyrings
//!
//! - Address: last 20 bytes of keccak256 over the uncompressed public key (sans prefix byte)
//! - Signatures: recoverable ECDSA over a 32-byte prehash, encoded `0x || r || s || v`
//!   with `v = 27 + recovery id`

use k256::ecdsa::SigningKey;
use serde_json::json;
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use vaultkeeper_types::{Address, Result, SignedTransaction, VaultError, ADDRESS_LEN};

/// keccak256 of `data`
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Derive the account address controlled by `key`
pub fn address_of(key: &SigningKey) -> Address {
    let encoded = key.verifying_key().to_encoded_point(false); // uncompressed
    // bytes[0] == 0x04 (prefix), skip it
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(&bytes)
}

/// Parse a hex private key, with or without `0x` prefix
pub fn signing_key_from_hex(hex_key: &str) -> Result<SigningKey> {
    let digits = hex_key.trim().trim_start_matches("0x");
    let bytes = Zeroizing::new(
        hex::decode(digits).map_err(|_| VaultError::validation("private key", "not valid hex"))?,
    );
    SigningKey::from_slice(&bytes)
        .map_err(|_| VaultError::validation("private key", "not a valid secp256k1 scalar"))
}

/// Hex encode a private key without prefix
pub fn signing_key_to_hex(key: &SigningKey) -> Zeroizing<String> {
    Zeroizing::new(hex::encode(key.to_bytes()))
}

/// Find the key controlling `address`
pub fn find_key<'a>(keys: &'a [SigningKey], address: &Address) -> Result<&'a SigningKey> {
    keys.iter()
        .find(|k| &address_of(k) == address)
        .ok_or_else(|| VaultError::not_found("account", address.to_prefixed()))
}

/// Sign a 32-byte prehash. Returns `0x`-prefixed 65-byte signature.
pub fn sign_prehash(key: &SigningKey, prehash: &[u8; 32]) -> Result<String> {
    let (sig, recovery_id) = key
        .sign_prehash_recoverable(prehash)
        .map_err(|e| VaultError::keyring(format!("signing failed: {}", e)))?;

    let mut out = Vec::with_capacity(65);
    out.extend_from_slice(&sig.to_bytes());
    out.push(27 + recovery_id.to_byte());
    Ok(format!("0x{}", hex::encode(out)))
}

/// Hash of a personal message (`"\x19Ethereum Signed Message:\n" || len || data`)
pub fn personal_message_hash(data: &[u8]) -> [u8; 32] {
    let mut buf = format!("\x19Ethereum Signed Message:\n{}", data.len()).into_bytes();
    buf.extend_from_slice(data);
    keccak256(&buf)
}

/// Hash of a typed-data payload: `keccak256(0x19 0x01 || keccak256(canonical json))`.
///
/// The payload schema is not interpreted.
pub fn typed_data_hash(data: &serde_json::Value) -> Result<[u8; 32]> {
    let inner = keccak256(&serde_json::to_vec(data)?);
    let mut buf = Vec::with_capacity(2 + inner.len());
    buf.extend_from_slice(&[0x19, 0x01]);
    buf.extend_from_slice(&inner);
    Ok(keccak256(&buf))
}

/// Sign an opaque transaction payload over its canonical JSON encoding
pub fn sign_transaction(key: &SigningKey, tx: &serde_json::Value) -> Result<SignedTransaction> {
    let hash = keccak256(&serde_json::to_vec(tx)?);
    let signature = sign_prehash(key, &hash)?;
    Ok(SignedTransaction {
        from: address_of(key),
        hash: format!("0x{}", hex::encode(hash)),
        signature,
        tx: tx.clone(),
    })
}

/// `did:ethr` document for an account
pub fn did_document(address: &Address) -> serde_json::Value {
    let did = format!("did:ethr:{}", address.to_prefixed());
    let controller_key = format!("{}#controller", did);
    json!({
        "@context": ["https://www.w3.org/ns/did/v1"],
        "id": did,
        "verificationMethod": [{
            "id": controller_key,
            "type": "EcdsaSecp256k1RecoveryMethod2020",
            "controller": did,
            "blockchainAccountId": format!("eip155:1:{}", address.to_prefixed()),
        }],
        "authentication": [controller_key],
    })
}
