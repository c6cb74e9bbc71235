// node/src/lib.rs
pub mod config;
pub mod runtime;
pub mod script;

pub use config::BridgeConfig;
pub use runtime::{Devnet, DevnetStatus};
pub use script::{Step, StepOutcome};
