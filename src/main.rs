//! PetControl - headless harness
//!
//! Loads a scenario and replays its scripted requests through the control
//! handlers, printing the outcome log.

use petcontrol::cli::parse_args;
use petcontrol::headless::{run_headless_scenario, HeadlessScenarioConfig};

fn main() {
    let args = parse_args();

    let mut config = match HeadlessScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load scenario: {}", e);
            std::process::exit(1);
        }
    };
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }
    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    config.abilities_path = Some(args.abilities.to_string_lossy().into_owned());

    if let Err(e) = run_headless_scenario(config) {
        eprintln!("Scenario failed: {}", e);
        std::process::exit(1);
    }
}
