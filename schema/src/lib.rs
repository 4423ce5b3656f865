// Combat Schema - Shared type definitions
// This crate contains the plain data definitions shared between the content
// files under `data/` and the rpg-combat engine. Nothing in here carries
// runtime battle state.

pub use element::*;
pub use enemy_data::*;
pub use item_data::*;
pub use skill_data::*;

pub mod element;
pub mod enemy_data;
pub mod item_data;
pub mod skill_data;
