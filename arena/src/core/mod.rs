//! Pure, deterministic game logic.
//!
//! Nothing in this module performs I/O or reads a clock. Random choices
//! (role shuffle, tie break, fallback pick) go through an injected
//! [`rand::Rng`] so every behavior is reproducible under a seeded RNG.

pub mod conversation;
pub mod error;
pub mod resolver;
pub mod roles;
pub mod state;
pub mod types;
