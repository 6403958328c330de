//! Explicit company/branch scoping for core operations.

use serde::{Deserialize, Serialize};

use crate::id::{BranchId, CompanyId};

/// The company/branch scope an operation runs in.
///
/// The surrounding application layers resolve "the current branch" however
/// they like (session, request header, device configuration); the core never
/// reads ambient state and only accepts the scope as an explicit parameter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpContext {
    pub company: CompanyId,
    pub branch: BranchId,
}

impl OpContext {
    pub fn new(company: CompanyId, branch: BranchId) -> Self {
        Self { company, branch }
    }
}
