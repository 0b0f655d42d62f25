// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Local secp256k1 key and EIP-155 legacy transactions.

use std::fmt;

use alloy_rlp::{Encodable, Header};
use batchproof_kernel::hash::keccak256;
use batchproof_kernel::types::decode_fixed_hex;
use batchproof_kernel::{Address, Hash32};
use bytes::BytesMut;
use k256::ecdsa::SigningKey;

use super::LedgerError;
use crate::config::Credential;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: Hash32,
}

impl SignedTransaction {
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

/// Big-endian integer bytes without leading zeros, as RLP wants them.
fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

impl LegacyTransaction {
    fn fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.as_bytes()[..].length()
            + self.value.length()
            + self.data[..].length()
    }

    fn encode_fields(&self, out: &mut BytesMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.as_bytes()[..].encode(out);
        self.value.encode(out);
        self.data[..].encode(out);
    }

    /// `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`
    pub fn signing_payload(&self) -> Vec<u8> {
        let payload_length = self.fields_length() + self.chain_id.length() + 2 * 0u64.length();
        let mut out = BytesMut::with_capacity(payload_length + 9);
        Header { list: true, payload_length }.encode(&mut out);
        self.encode_fields(&mut out);
        self.chain_id.encode(&mut out);
        0u64.encode(&mut out);
        0u64.encode(&mut out);
        out.to_vec()
    }

    pub fn signing_hash(&self) -> Hash32 {
        Hash32(keccak256(&self.signing_payload()))
    }

    fn encode_signed(&self, v: u64, r: &[u8], s: &[u8]) -> Vec<u8> {
        let payload_length = self.fields_length() + v.length() + r.length() + s.length();
        let mut out = BytesMut::with_capacity(payload_length + 9);
        Header { list: true, payload_length }.encode(&mut out);
        self.encode_fields(&mut out);
        v.encode(&mut out);
        r.encode(&mut out);
        s.encode(&mut out);
        out.to_vec()
    }
}

pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Accepts 64 hex chars with or without `0x`.
    pub fn from_hex(secret: &str) -> Result<Self, LedgerError> {
        let bytes = decode_fixed_hex::<32>(secret.trim())
            .map_err(|_| LedgerError::Signer("private key must be 32 bytes of hex".to_string()))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| LedgerError::Signer("private key is not a valid secp256k1 scalar".to_string()))?;

        let point = key.verifying_key().to_encoded_point(false);
        let digest = keccak256(&point.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);

        Ok(Self {
            key,
            address: Address(address),
        })
    }

    pub fn from_credential(credential: &Credential) -> Result<Self, LedgerError> {
        Self::from_hex(credential.expose())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn sign(&self, tx: &LegacyTransaction) -> Result<SignedTransaction, LedgerError> {
        let hash = tx.signing_hash();
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|e| LedgerError::Signer(e.to_string()))?;

        let v = recovery_id.to_byte() as u64 + 35 + 2 * tx.chain_id;
        let sig_bytes = signature.to_bytes();
        let (r, s) = sig_bytes.split_at(32);

        let raw = tx.encode_signed(v, trim_leading_zeros(r), trim_leading_zeros(s));
        let hash = Hash32(keccak256(&raw));
        Ok(SignedTransaction { raw, hash })
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Address([0x35; 20]),
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
            chain_id: 1,
        }
    }

    #[test]
    fn test_address_from_key() {
        let signer =
            LocalSigner::from_hex("0x0000000000000000000000000000000000000000000000000000000000000001").unwrap();
        assert_eq!(
            signer.address().to_checksum(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_eip155_signing_hash() {
        assert_eq!(
            eip155_example().signing_hash().to_hex(),
            "0xdaf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_signed_transaction() {
        let signer = LocalSigner::from_hex(&"46".repeat(32)).unwrap();
        let signed = signer.sign(&eip155_example()).unwrap();
        assert_eq!(
            signed.raw_hex(),
            "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(signed.hash, Hash32(keccak256(&signed.raw)));
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(LocalSigner::from_hex("0x1234").is_err());
        assert!(LocalSigner::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = LocalSigner::from_hex(&"46".repeat(32)).unwrap();
        let printed = format!("{:?}", signer);
        assert!(!printed.contains(&"46".repeat(32)));
    }
}
