// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};

use super::id::Address;

/// Leaf payload: an ordered pair of addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub token0: Address,
    pub token1: Address,
}

impl Entry {
    pub fn new(token0: Address, token1: Address) -> Self {
        Self { token0, token1 }
    }

    /// `abi.encode(address, address)`
    pub fn abi_encode(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.token0.to_word());
        out[32..].copy_from_slice(&self.token1.to_word());
        out
    }

    pub fn as_tuple(&self) -> (Address, Address) {
        (self.token0, self.token1)
    }
}

impl From<(Address, Address)> for Entry {
    fn from((token0, token1): (Address, Address)) -> Self {
        Self { token0, token1 }
    }
}
