//! Engine state structures

pub mod engine;
pub mod position;
pub mod registry;

pub use engine::{EngineState, EngineStats, Ledger, ENGINE_STATE_DISCRIMINATOR};
pub use position::Position;
pub use registry::{CollateralAssetConfig, CollateralRegistry};
