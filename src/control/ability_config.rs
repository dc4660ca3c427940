//! Data-Driven Ability Configuration
//!
//! Ability definitions are loaded from `assets/config/abilities.ron` instead of
//! being hardcoded, keyed by the numeric id the client sends.
//!
//! ## Usage
//! ```ignore
//! let defs = world.resource::<AbilityDefinitions>();
//! if let Some(def) = defs.get(AbilityId(17253)) {
//!     println!("{} reaches {} yards", def.name, def.max_range);
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::abilities::{AbilityId, ImplicitTarget, SpellSchool};

/// Default path of the ability definition file.
pub const ABILITIES_CONFIG_PATH: &str = "assets/config/abilities.ron";

fn default_spell_school_none() -> SpellSchool {
    SpellSchool::None
}

fn default_global_cooldown() -> f32 {
    1.5
}

/// Complete ability configuration loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AbilityConfig {
    /// Display name of the ability
    pub name: String,

    // === Range ===
    /// Minimum range in yards (0.0 = none)
    #[serde(default)]
    pub min_range: f32,
    /// Maximum range in yards (0.0 for self and area abilities)
    #[serde(default)]
    pub max_range: f32,

    // === Costs ===
    /// Resource cost (mana, focus, energy)
    #[serde(default)]
    pub mana_cost: f32,
    /// Own cooldown after a committed cast, in seconds
    #[serde(default)]
    pub cooldown: f32,
    /// Shared global cooldown started by a committed cast, in seconds
    #[serde(default = "default_global_cooldown")]
    pub global_cooldown: f32,

    // === Behaviour ===
    #[serde(default = "default_spell_school_none")]
    pub school: SpellSchool,
    /// Passive abilities can never be activated
    #[serde(default)]
    pub passive: bool,
    /// Target must be in front of the caster
    #[serde(default)]
    pub requires_facing: bool,
    /// Implicit target of each effect (at most three)
    #[serde(default)]
    pub effects: Vec<ImplicitTarget>,
}

impl AbilityConfig {
    /// Returns true if any effect hits all enemies in an area
    pub fn hits_all_enemies_in_area(&self) -> bool {
        self.effects.iter().any(|e| e.is_all_enemies_in_area())
    }

    /// The first effect that needs a unit target, if any
    pub fn unit_target_kind(&self) -> Option<ImplicitTarget> {
        self.effects.iter().copied().find(|e| e.needs_unit())
    }

    /// Whether the ability lands on the caster only
    pub fn is_self_cast(&self) -> bool {
        !self.effects.is_empty() && self.effects.iter().all(|e| *e == ImplicitTarget::Caster)
    }
}

/// Root structure for the abilities.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct AbilitiesConfig {
    pub abilities: HashMap<AbilityId, AbilityConfig>,
}

/// Resource containing all ability definitions.
#[derive(Resource, Debug, Default)]
pub struct AbilityDefinitions {
    definitions: HashMap<AbilityId, AbilityConfig>,
}

impl AbilityDefinitions {
    /// Create from a loaded config
    pub fn new(config: AbilitiesConfig) -> Self {
        Self {
            definitions: config.abilities,
        }
    }

    /// Parse definitions from RON text and validate them.
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let config: AbilitiesConfig = ron::from_str(contents)
            .map_err(|e| format!("Failed to parse ability definitions: {}", e))?;
        let definitions = Self::new(config);
        definitions.validate()?;
        Ok(definitions)
    }

    /// Get the configuration for an ability id
    pub fn get(&self, ability: AbilityId) -> Option<&AbilityConfig> {
        self.definitions.get(&ability)
    }

    pub fn contains(&self, ability: AbilityId) -> bool {
        self.definitions.contains_key(&ability)
    }

    /// Number of loaded definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Check that every definition is usable
    pub fn validate(&self) -> Result<(), String> {
        let mut problems: Vec<String> = Vec::new();
        for (id, def) in &self.definitions {
            if def.name.is_empty() {
                problems.push(format!("ability {} has no name", id));
            }
            if def.min_range < 0.0 || def.max_range < def.min_range {
                problems.push(format!(
                    "ability {} has an invalid range window [{}, {}]",
                    id, def.min_range, def.max_range
                ));
            }
            if def.effects.len() > 3 {
                problems.push(format!("ability {} has more than three effects", id));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            problems.sort();
            Err(problems.join("; "))
        }
    }

    /// Get all ability ids that are defined
    pub fn ability_ids(&self) -> impl Iterator<Item = &AbilityId> {
        self.definitions.keys()
    }
}

/// Load ability definitions from a RON file
pub fn load_ability_definitions(config_path: &str) -> Result<AbilityDefinitions, String> {
    let contents = std::fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read {}: {}", config_path, e))?;

    let definitions = AbilityDefinitions::from_ron_str(&contents)
        .map_err(|e| format!("{} ({})", e, config_path))?;

    info!("Loaded {} ability definitions from {}", definitions.len(), config_path);

    Ok(definitions)
}
