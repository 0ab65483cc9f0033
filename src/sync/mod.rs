//! Resource serialization: synchronizer, builder, provisioning strategies.

mod builder;
mod provision;
mod synchronizer;

pub use builder::SynchronizerBuilder;
pub use provision::{Persistent, Provision, ProvisionFn, Scoped};
pub use synchronizer::Synchronizer;
