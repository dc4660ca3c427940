//! Headless mode for scripted runs
//!
//! Runs a scripted control scenario without any graphical output, suitable
//! for automated testing and replaying client traffic.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --scenario scenarios/basic.json --seed 7
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "units": [
//!     { "name": "Rexxar", "team": 1, "role": "Player" },
//!     { "name": "Misha", "team": 1, "abilities": [17253],
//!       "role": { "Companion": { "owner": "Rexxar", "pet_type": "Hunter", "pet_number": 1 } } }
//!   ],
//!   "script": [
//!     { "step": 0, "controller": "Rexxar",
//!       "request": { "Command": { "pet": "Misha", "command": "Stay" } } }
//!   ]
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessScenarioConfig;
pub use runner::{run_headless_scenario, run_scenario, ScenarioResult};
