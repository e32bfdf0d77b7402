//! Domain Layer
//!
//! Core business entity definitions

pub mod access_code;
pub mod ledger;

pub use access_code::{mask_code, AccessCode, CODE_ALPHABET, CODE_LENGTH, DEFAULT_CODE_TTL_HOURS};
pub use ledger::{Ledger, Verification, VerifyReason};
