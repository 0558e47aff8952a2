//! Grant statements and the per-capability bundles that produce them.

pub mod bundles;
pub mod statement;

pub use bundles::compose;
pub use statement::{Conditions, Effect, GrantStatement, StatementBuilder};
