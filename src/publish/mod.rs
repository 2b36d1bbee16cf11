//! Module publishing: input sources and the publish transaction.

mod input;
mod transaction;

pub use input::{ActionInputs, CliModuleArgs, ModuleSpecSource};
pub use transaction::{Mode, PublishOutcome, PublishTransaction, Stage, StageError};
