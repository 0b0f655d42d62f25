// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod generate;
pub mod inspect;
pub mod submit;
pub mod verify;

/// Short form of a 32-byte hex value for table cells.
pub(crate) fn short_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    if full.len() <= 16 {
        return format!("0x{}", full);
    }
    format!("0x{}..{}", &full[..8], &full[full.len() - 6..])
}
