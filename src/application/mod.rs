//! 应用层：业务编排
//!
//! 在存储事务之上组合访问码的签发、兑换与查询

pub mod access_ledger;

pub use access_ledger::{AccessLedger, IssuedCode};
