//! JSON scenario parsing for headless mode
//!
//! A scenario lists the units to spawn and a script of control requests,
//! each tied to the update step it is sent on. Units are referred to by
//! name; names are resolved to entities once the units exist.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::control::abilities::AbilityId;
use crate::control::action_bar::{ActionButton, ActiveState, SlotUpdate, SlotUpdateBatch};
use crate::control::components::PetType;
use crate::control::geometry::Pillar;
use crate::control::profile::{CommandState, ReactState};
use crate::control::requests::{declined_names_from, CastTargets, ControlRequest, RequestKind};

/// What a scenario unit is and who commands it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UnitRole {
    Player,
    Creature {
        #[serde(default)]
        with_ai: bool,
    },
    Companion {
        owner: String,
        pet_type: PetType,
        pet_number: u32,
    },
    /// A creature charmed by `controller`
    Charmed {
        controller: String,
        #[serde(default)]
        temporary_summon: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    pub team: u8,
    #[serde(default)]
    pub position: [f32; 3],
    pub role: UnitRole,
    /// Known ability ids
    #[serde(default)]
    pub abilities: Vec<u32>,
}

/// A request as written in a scenario, with units named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScriptedRequest {
    Command {
        pet: String,
        command: CommandState,
        #[serde(default)]
        target: Option<String>,
    },
    Reaction {
        pet: String,
        reaction: ReactState,
    },
    /// Action-bar ability press
    Cast {
        pet: String,
        ability: u32,
        #[serde(default)]
        target: Option<String>,
    },
    CastSpell {
        pet: String,
        cast_count: u8,
        ability: u32,
        #[serde(default)]
        target: Option<String>,
    },
    /// Raw packed action, for requests a well-behaved client never sends
    RawAction {
        pet: String,
        data: u32,
    },
    /// (position, packed button) pairs
    SetAction {
        pet: String,
        updates: Vec<(u32, u32)>,
    },
    Autocast {
        pet: String,
        ability: u32,
        enabled: bool,
    },
    StopAttack {
        pet: String,
    },
    Abandon {
        pet: String,
    },
    NameQuery {
        pet: String,
        pet_number: u32,
    },
    Rename {
        pet: String,
        name: String,
        #[serde(default)]
        declined: Option<Vec<String>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Update step the request is sent on (0-based)
    pub step: u32,
    pub controller: String,
    pub request: ScriptedRequest,
}

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessScenarioConfig {
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub pillars: Vec<Pillar>,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
    /// Seconds of simulated time per update step
    #[serde(default = "default_step_secs")]
    pub step_secs: f32,
    /// Extra steps run after the last scripted request
    #[serde(default = "default_trailing_steps")]
    pub trailing_steps: u32,
    /// Random seed for deterministic talk rolls
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the control log
    #[serde(default)]
    pub output_path: Option<String>,
    /// Ability definitions file (defaults to the bundled one)
    #[serde(default)]
    pub abilities_path: Option<String>,
}

/// Longest simulated update step, in seconds
pub const MAX_STEP_SECS: f32 = 60.0;

fn default_step_secs() -> f32 {
    0.1
}

fn default_trailing_steps() -> u32 {
    1
}

impl HeadlessScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario file: {}", e))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: HeadlessScenarioConfig =
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.units.is_empty() {
            return Err("scenario must declare at least one unit".to_string());
        }
        if !(self.step_secs > 0.0 && self.step_secs <= MAX_STEP_SECS) {
            return Err(format!("step_secs must be in (0, {}]", MAX_STEP_SECS));
        }

        let mut names = HashSet::new();
        for unit in &self.units {
            if !names.insert(unit.name.as_str()) {
                return Err(format!("duplicate unit name '{}'", unit.name));
            }
        }

        // Controllers must be spawned before the units they command
        let mut seen = HashSet::new();
        for unit in &self.units {
            let commander = match &unit.role {
                UnitRole::Companion { owner, .. } => Some(owner),
                UnitRole::Charmed { controller, .. } => Some(controller),
                _ => None,
            };
            if let Some(commander) = commander {
                if !seen.contains(commander.as_str()) {
                    return Err(format!(
                        "unit '{}' is commanded by '{}', which must be listed before it",
                        unit.name, commander
                    ));
                }
            }
            seen.insert(unit.name.as_str());
        }

        for step in &self.script {
            if !names.contains(step.controller.as_str()) {
                return Err(format!("script names unknown controller '{}'", step.controller));
            }
            for name in step.request.unit_names() {
                if !names.contains(name) {
                    return Err(format!("script names unknown unit '{}'", name));
                }
            }
        }
        Ok(())
    }

    /// Number of update steps the scenario runs for
    pub fn total_steps(&self) -> u32 {
        let last = self.script.iter().map(|s| s.step + 1).max().unwrap_or(0);
        last + self.trailing_steps
    }
}

impl ScriptedRequest {
    fn pet(&self) -> &str {
        match self {
            ScriptedRequest::Command { pet, .. }
            | ScriptedRequest::Reaction { pet, .. }
            | ScriptedRequest::Cast { pet, .. }
            | ScriptedRequest::CastSpell { pet, .. }
            | ScriptedRequest::RawAction { pet, .. }
            | ScriptedRequest::SetAction { pet, .. }
            | ScriptedRequest::Autocast { pet, .. }
            | ScriptedRequest::StopAttack { pet }
            | ScriptedRequest::Abandon { pet }
            | ScriptedRequest::NameQuery { pet, .. }
            | ScriptedRequest::Rename { pet, .. } => pet,
        }
    }

    fn target(&self) -> Option<&str> {
        match self {
            ScriptedRequest::Command { target, .. }
            | ScriptedRequest::Cast { target, .. }
            | ScriptedRequest::CastSpell { target, .. } => target.as_deref(),
            _ => None,
        }
    }

    /// Every unit name the request refers to
    pub fn unit_names(&self) -> Vec<&str> {
        let mut names = vec![self.pet()];
        names.extend(self.target());
        names
    }

    /// Resolve names and build the request the controller would send.
    pub fn to_request_kind(&self, units: &HashMap<String, Entity>) -> Result<RequestKind, String> {
        let lookup = |name: &str| {
            units
                .get(name)
                .copied()
                .ok_or_else(|| format!("unknown unit '{}'", name))
        };
        let pet = lookup(self.pet())?;
        let target = self.target().map(lookup).transpose()?;

        let kind = match self {
            ScriptedRequest::Command { command, .. } => RequestKind::PetAction {
                pet,
                data: ActionButton::command(*command).pack(),
                target,
            },
            ScriptedRequest::Reaction { reaction, .. } => RequestKind::PetAction {
                pet,
                data: ActionButton::reaction(*reaction).pack(),
                target: None,
            },
            ScriptedRequest::Cast { ability, .. } => RequestKind::PetAction {
                pet,
                data: ActionButton::ability(AbilityId(*ability), ActiveState::Enabled).pack(),
                target,
            },
            ScriptedRequest::CastSpell { cast_count, ability, .. } => RequestKind::CastSpell {
                pet,
                cast_count: *cast_count,
                ability: AbilityId(*ability),
                targets: CastTargets {
                    unit: target,
                    destination: None,
                },
            },
            ScriptedRequest::RawAction { data, .. } => RequestKind::PetAction {
                pet,
                data: *data,
                target: None,
            },
            ScriptedRequest::SetAction { updates, .. } => {
                let mut batch = SlotUpdateBatch::new();
                for (position, data) in updates {
                    let button = ActionButton::unpack(*data).map_err(|e| e.to_string())?;
                    batch.push(SlotUpdate {
                        position: *position,
                        button,
                    });
                }
                RequestKind::SetAction { pet, updates: batch }
            }
            ScriptedRequest::Autocast { ability, enabled, .. } => RequestKind::SetSpellAutocast {
                pet,
                ability: AbilityId(*ability),
                enabled: *enabled,
            },
            ScriptedRequest::StopAttack { .. } => RequestKind::StopAttack { pet },
            ScriptedRequest::Abandon { .. } => RequestKind::Abandon { pet },
            ScriptedRequest::NameQuery { pet_number, .. } => RequestKind::NameQuery {
                pet,
                pet_number: *pet_number,
            },
            ScriptedRequest::Rename { name, declined, .. } => RequestKind::Rename {
                pet,
                name: name.clone(),
                declined: declined.clone().and_then(declined_names_from),
            },
        };
        Ok(kind)
    }
}

impl ScriptStep {
    pub fn to_request(&self, units: &HashMap<String, Entity>) -> Result<ControlRequest, String> {
        let controller = units
            .get(&self.controller)
            .copied()
            .ok_or_else(|| format!("unknown controller '{}'", self.controller))?;
        Ok(ControlRequest::new(controller, self.request.to_request_kind(units)?))
    }
}
