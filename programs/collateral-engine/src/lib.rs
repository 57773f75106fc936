// Collateralized debt engine for a USD-pegged stable unit
// Native Solana implementation - NO ANCHOR

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod health;
pub mod instruction;
pub mod math;
pub mod oracle;
pub mod processor;
pub mod state;
pub mod token;

// Declare program ID
solana_program::declare_id!("EsbrJzQnEVueWokyp2wBjU8orZThJWVY3EDvzV27TucN");

#[cfg(not(feature = "no-entrypoint"))]
use processor::process_instruction;

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);
