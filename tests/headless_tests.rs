//! Integration tests for headless scenario execution
//!
//! These tests verify that:
//! - Scenarios run to completion through the full plugin and schedule
//! - Scripted requests reach the handlers in order
//! - Cooldowns tick between steps

use petcontrol::control::ControlLogEventType;
use petcontrol::headless::{run_scenario, HeadlessScenarioConfig};

fn scenario(script: &str) -> HeadlessScenarioConfig {
    let json = format!(
        r#"{{
            "units": [
                {{ "name": "Rexxar", "team": 1, "role": "Player" }},
                {{ "name": "Misha", "team": 1, "position": [1.0, 0.0, 0.0], "abilities": [17253, 16827],
                   "role": {{ "Companion": {{ "owner": "Rexxar", "pet_type": "Hunter", "pet_number": 1 }} }} }},
                {{ "name": "Boar", "team": 2, "position": [1.0, 0.0, -3.0], "role": {{ "Creature": {{ "with_ai": true }} }} }}
            ],
            "script": {},
            "step_secs": 0.5,
            "random_seed": 3
        }}"#,
        script
    );
    HeadlessScenarioConfig::from_json_str(&json).unwrap()
}

#[test]
fn test_bundled_scenario_parses() {
    let config = HeadlessScenarioConfig::load_from_file(std::path::Path::new("scenarios/basic.json")).unwrap();
    assert_eq!(config.units.len(), 4);
    assert_eq!(config.random_seed, Some(7));
}

#[test]
fn test_scenario_runs_every_step() {
    let config = scenario(
        r#"[
            { "step": 0, "controller": "Rexxar", "request": { "Command": { "pet": "Misha", "command": "Stay" } } },
            { "step": 1, "controller": "Rexxar", "request": { "Reaction": { "pet": "Misha", "reaction": "Passive" } } }
        ]"#,
    );
    let result = run_scenario(&config).unwrap();

    assert_eq!(result.steps, config.total_steps());
    assert_eq!(result.count(ControlLogEventType::Command), 1);
    assert_eq!(result.count(ControlLogEventType::Reaction), 1);
    assert_eq!(result.count(ControlLogEventType::Dropped), 0);
    // Start and finish markers
    assert_eq!(result.count(ControlLogEventType::Session), 2);
}

#[test]
fn test_global_cooldown_expires_between_steps() {
    // Same step: the second cast hits the global cooldown.
    // Five steps later (2.5 seconds) it has run out.
    let config = scenario(
        r#"[
            { "step": 0, "controller": "Rexxar", "request": { "Cast": { "pet": "Misha", "ability": 17253, "target": "Boar" } } },
            { "step": 0, "controller": "Rexxar", "request": { "Cast": { "pet": "Misha", "ability": 16827, "target": "Boar" } } },
            { "step": 5, "controller": "Rexxar", "request": { "Cast": { "pet": "Misha", "ability": 16827, "target": "Boar" } } }
        ]"#,
    );
    let result = run_scenario(&config).unwrap();

    assert_eq!(result.count(ControlLogEventType::CastCommitted), 2);
    assert_eq!(result.count(ControlLogEventType::Dropped), 1);
}

#[test]
fn test_foreign_controller_is_dropped() {
    let config = scenario(
        r#"[
            { "step": 0, "controller": "Boar", "request": { "StopAttack": { "pet": "Misha" } } }
        ]"#,
    );
    let result = run_scenario(&config).unwrap();
    assert_eq!(result.count(ControlLogEventType::Dropped), 1);
}
