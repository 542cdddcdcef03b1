pub mod collector;
pub mod materialize;
pub mod orchestrator;

pub use collector::Collector;
pub use materialize::{ExistingCheckout, GitMaterializer, MaterializeError, RepositoryMaterializer};
pub use orchestrator::{Orchestrator, ScanUnit};
