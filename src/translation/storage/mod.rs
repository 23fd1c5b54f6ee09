//! 存储模块
//!
//! 提供以节点身份为键、不延长节点生命周期的关联存储。

pub mod identity;
pub mod records;

pub use identity::{IdentityMap, IdentitySet};
pub use records::SubstitutionRecords;
