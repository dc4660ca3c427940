//! Headless scenario execution
//!
//! Spawns the scenario's units, feeds the scripted requests into the control
//! plugin one update step at a time, and collects the control log.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::control::abilities::AbilityId;
use crate::control::ability_config::{load_ability_definitions, ABILITIES_CONFIG_PATH};
use crate::control::geometry::LineOfSight;
use crate::control::log::{ControlLog, ControlLogEntry, ControlLogEventType};
use crate::control::requests::ControlRequest;
use crate::control::spawn::{charm_unit, spawn_companion, spawn_creature, spawn_player};
use crate::control::PetControlPlugin;
use crate::settings::ControlSettings;

use super::config::{HeadlessScenarioConfig, ScriptStep, UnitRole};

/// Result of a completed headless scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Update steps run
    pub steps: u32,
    /// Every control log entry, in order
    pub entries: Vec<ControlLogEntry>,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

impl ScenarioResult {
    pub fn count(&self, event_type: ControlLogEventType) -> usize {
        self.entries.iter().filter(|e| e.event_type == event_type).count()
    }
}

/// Resource to track headless scenario state
#[derive(Resource)]
pub struct HeadlessScenarioState {
    pub script: Vec<ScriptStep>,
    /// Unit names resolved to their entities
    pub units: HashMap<String, Entity>,
    /// Next update step to run
    pub step: u32,
    pub total_steps: u32,
}

impl HeadlessScenarioState {
    pub fn is_complete(&self) -> bool {
        self.step >= self.total_steps
    }
}

/// Spawn every scenario unit, controllers first. Returns the name map.
pub fn spawn_scenario_units(
    world: &mut World,
    config: &HeadlessScenarioConfig,
) -> Result<HashMap<String, Entity>, String> {
    let mut units: HashMap<String, Entity> = HashMap::new();
    for spec in &config.units {
        let position = Vec3::from_array(spec.position);
        let abilities: Vec<AbilityId> = spec.abilities.iter().copied().map(AbilityId).collect();
        let lookup = |name: &String, units: &HashMap<String, Entity>| {
            units
                .get(name)
                .copied()
                .ok_or_else(|| format!("unit '{}' is not spawned yet", name))
        };

        let entity = match &spec.role {
            UnitRole::Player => spawn_player(world, &spec.name, spec.team, position),
            UnitRole::Creature { with_ai } => {
                spawn_creature(world, &spec.name, spec.team, position, &abilities, *with_ai)
            }
            UnitRole::Companion {
                owner,
                pet_type,
                pet_number,
            } => {
                let owner = lookup(owner, &units)?;
                spawn_companion(world, owner, &spec.name, *pet_type, *pet_number, &abilities, position)
            }
            UnitRole::Charmed {
                controller,
                temporary_summon,
            } => {
                let controller = lookup(controller, &units)?;
                let unit = spawn_creature(world, &spec.name, spec.team, position, &abilities, true);
                charm_unit(world, unit, controller, *temporary_summon);
                unit
            }
        };
        units.insert(spec.name.clone(), entity);
    }
    Ok(units)
}

/// Send the requests scripted for the current step. Runs before the
/// control plugin drains its queue.
fn headless_send_scripted_requests(
    mut state: ResMut<HeadlessScenarioState>,
    mut requests: EventWriter<ControlRequest>,
) {
    let step = state.step;
    for scripted in state.script.iter().filter(|s| s.step == step) {
        match scripted.to_request(&state.units) {
            Ok(request) => {
                requests.send(request);
            }
            Err(e) => warn!("Skipping scripted request at step {}: {}", step, e),
        }
    }
    state.step += 1;
}

/// Build the app for a scenario without running it.
pub fn build_headless_app(config: &HeadlessScenarioConfig) -> Result<App, String> {
    let abilities_path = config.abilities_path.as_deref().unwrap_or(ABILITIES_CONFIG_PATH);
    let definitions = load_ability_definitions(abilities_path)?;

    let mut app = App::new();
    // Minimal plugins - no window, no rendering
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            config.step_secs,
        )))
        .insert_resource(definitions)
        .insert_resource(ControlSettings::load())
        .insert_resource(LineOfSight::new(config.pillars.clone()))
        .add_plugins(PetControlPlugin {
            seed: config.random_seed,
        });

    // Every step advances the clock by exactly `step_secs`
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .set_max_delta(Duration::from_secs_f32(config.step_secs));

    let units = spawn_scenario_units(app.world_mut(), config)?;
    app.insert_resource(HeadlessScenarioState {
        script: config.script.clone(),
        units,
        step: 0,
        total_steps: config.total_steps(),
    })
    .add_systems(
        Update,
        headless_send_scripted_requests.before(crate::control::ControlSystemPhase::Requests),
    );

    app.world_mut().resource_mut::<ControlLog>().log(
        ControlLogEventType::Session,
        format!("Scenario started with {} units", config.units.len()),
    );
    Ok(app)
}

/// Run a scenario to completion and return its log.
pub fn run_scenario(config: &HeadlessScenarioConfig) -> Result<ScenarioResult, String> {
    let mut app = build_headless_app(config)?;
    while !app.world().resource::<HeadlessScenarioState>().is_complete() {
        app.update();
    }

    let steps = app.world().resource::<HeadlessScenarioState>().step;
    let mut log = app.world_mut().resource_mut::<ControlLog>();
    log.log(ControlLogEventType::Session, format!("Scenario finished after {} steps", steps));

    Ok(ScenarioResult {
        steps,
        entries: log.entries.clone(),
        random_seed: config.random_seed,
    })
}

/// Run a headless scenario with the given configuration
pub fn run_headless_scenario(config: HeadlessScenarioConfig) -> Result<(), String> {
    println!("Starting headless control scenario...");
    println!("  Units: {}", config.units.len());
    println!("  Scripted requests: {}", config.script.len());
    println!("  Step: {:.3}s", config.step_secs);

    let result = run_scenario(&config)?;
    for entry in &result.entries {
        println!("[{:>7.2}s] {:?}: {}", entry.timestamp, entry.event_type, entry.message);
    }
    println!(
        "Scenario complete: {} steps, {} dropped requests",
        result.steps,
        result.count(ControlLogEventType::Dropped)
    );

    if let Some(path) = config.output_path.as_deref() {
        let log = ControlLog {
            entries: result.entries,
            elapsed: result.steps as f32 * config.step_secs,
        };
        log.save_to_file(Path::new(path))?;
        println!("Log saved to: {}", path);
    }
    Ok(())
}
