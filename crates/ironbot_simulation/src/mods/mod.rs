//! Mod-specific правила (реализации ModRules)

pub mod deathmatch;

pub use deathmatch::DeathmatchRules;
