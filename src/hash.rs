// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical Keccak-256 Hashing
//!
//! Tree hashing follows the OpenZeppelin standard Merkle tree so that proofs
//! produced here verify with `MerkleProof.multiProofVerify` on-chain.
//!
//! # Hash Input Structure
//! ```text
//! leaf  = keccak256(keccak256(abi.encode(token0, token1)))
//! node  = keccak256(min(a, b) || max(a, b))
//! ```

use sha3::{Digest, Keccak256};

use crate::types::{Entry, Hash32};

/// Keccak-256 of a byte slice.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Double-hashed leaf.
pub fn leaf_hash(entry: &Entry) -> Hash32 {
    let inner = keccak256(&entry.abi_encode());
    Hash32(keccak256(&inner))
}

/// Commutative pair hash.
pub fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Keccak256::new();
    hasher.update(lo.0);
    hasher.update(hi.0);
    Hash32(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_selector_transfer() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_hash_pair_commutative() {
        let a = Hash32([1u8; 32]);
        let b = Hash32([2u8; 32]);
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));
        assert_ne!(hash_pair(&a, &b), hash_pair(&a, &a));
    }
}
