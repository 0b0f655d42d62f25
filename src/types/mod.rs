// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::{KernelError, Result};

pub mod entry;
pub mod id;

pub use entry::Entry;
pub use id::{Address, Hash32};

/// Decodes `0x`-prefixed (or bare) hex into exactly `N` bytes.
pub fn decode_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N]> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if digits.len() != N * 2 {
        return Err(KernelError::InvalidHex(format!(
            "expected {} hex digits, found {} in {:?}",
            N * 2,
            digits.len(),
            s
        )));
    }

    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).map_err(|e| KernelError::InvalidHex(format!("{}: {:?}", e, s)))?;
    Ok(out)
}
