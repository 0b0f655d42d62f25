// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Solidity ABI encoding for the two contract calls we make.

use batchproof_kernel::hash::selector;
use batchproof_kernel::{Entry, Hash32};

use super::LedgerError;

pub const MERKLE_ROOT_SIG: &str = "merkleRoot()";
pub const APPLY_SIG: &str = "batchTriggerFeeUpdate((address,address)[],bytes32[],bool[])";

const WORD: usize = 32;

fn uint_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

pub fn encode_merkle_root() -> Vec<u8> {
    selector(MERKLE_ROOT_SIG).to_vec()
}

/// `batchTriggerFeeUpdate(pairs, proof, proofFlags)`.
///
/// Three dynamic arrays: a head of three offsets, then each tail as length
/// followed by its elements. `(address,address)` is static, so each pair is
/// two inline words.
pub fn encode_apply(pairs: &[Entry], proof: &[Hash32], flags: &[bool]) -> Vec<u8> {
    let pairs_offset = 3 * WORD;
    let proof_offset = pairs_offset + WORD + pairs.len() * 2 * WORD;
    let flags_offset = proof_offset + WORD + proof.len() * WORD;
    let total = flags_offset + WORD + flags.len() * WORD;

    let mut out = Vec::with_capacity(4 + total);
    out.extend_from_slice(&selector(APPLY_SIG));
    out.extend_from_slice(&uint_word(pairs_offset));
    out.extend_from_slice(&uint_word(proof_offset));
    out.extend_from_slice(&uint_word(flags_offset));

    out.extend_from_slice(&uint_word(pairs.len()));
    for pair in pairs {
        out.extend_from_slice(&pair.abi_encode());
    }

    out.extend_from_slice(&uint_word(proof.len()));
    for hash in proof {
        out.extend_from_slice(hash.as_bytes());
    }

    out.extend_from_slice(&uint_word(flags.len()));
    for flag in flags {
        out.extend_from_slice(&uint_word(*flag as usize));
    }
    out
}

/// Decodes a single `bytes32` return value.
pub fn decode_bytes32(data: &[u8]) -> Result<Hash32, LedgerError> {
    if data.len() < WORD {
        return Err(LedgerError::Decode(format!(
            "expected 32-byte return value, got {} bytes",
            data.len()
        )));
    }
    let mut out = [0u8; WORD];
    out.copy_from_slice(&data[..WORD]);
    Ok(Hash32(out))
}
