//! PetControl - server-side authority for commanded units
//!
//! Interprets the commands a player issues to a tamed companion, a charmed
//! creature, or a possessed player, and validates every ability those units
//! try to cast on the player's behalf.
//!
//! This library exposes the control modules for the headless harness and
//! for testing.

pub mod cli;
pub mod control;
pub mod headless;
pub mod settings;

// Re-export commonly used types
pub use control::{ControlLog, ControlLogEventType, ControlRequest, PetControlPlugin, RequestKind};
pub use headless::HeadlessScenarioConfig;
pub use settings::ControlSettings;
