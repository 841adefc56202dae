//! Configuration for the clipboard normalization pipeline.
//!
//! Holds the serializable [`PasteConfig`] plus the declared rendering-engine
//! family and its static capability profile. Behavior never sniffs a live
//! platform: hosts declare the family they run on and everything downstream
//! is keyed off that declaration.

pub mod config;
pub mod engine;

pub use config::{BlockMode, DefaultContentType, PasteConfig};
pub use engine::{DropStrategy, EngineFamily, EngineProfile};
