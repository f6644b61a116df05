/// Higher-level operations over the models
///
/// Stores own the multi-step flows that need transactions or policy checks:
/// workspace creation with its OWNER membership, the `"personal"` alias
/// resolution, task creation with tag attachment. The role mutation rules
/// live in `crate::ledger`, not here.

pub mod task;
pub mod workspace;
