pub mod ai;
pub mod calculators;
pub mod commands;
pub mod effects;
pub mod engine;
pub mod rewards;
pub mod state;
pub mod stats;
pub mod turn_orchestrator;

#[cfg(test)]
mod tests;
