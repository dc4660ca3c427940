//! Control Profile
//!
//! Per-unit control state. A `ControlProfile` component exists exactly while
//! a unit can be commanded: it is inserted when control is established and
//! removed when control ends (release, unsummon, despawn).
//!
//! The profile never points at its controller. The controller is looked up
//! through the unit's `Controlled` component.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::abilities::AbilityId;
use super::action_bar::ActionBar;

/// Movement command the unit is following.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum CommandState {
    Stay = 0,
    Follow = 1,
    Attack = 2,
    /// Transient: the unit is being dismissed
    Abandon = 3,
}

impl CommandState {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(CommandState::Stay),
            1 => Some(CommandState::Follow),
            2 => Some(CommandState::Attack),
            3 => Some(CommandState::Abandon),
            _ => None,
        }
    }
}

/// How the unit reacts to hostiles on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ReactState {
    Passive = 0,
    Defensive = 1,
    Aggressive = 2,
}

impl ReactState {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(ReactState::Passive),
            1 => Some(ReactState::Defensive),
            2 => Some(ReactState::Aggressive),
            _ => None,
        }
    }
}

/// Shared cooldown window blocking every new ability while it runs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobalCooldown {
    /// Seconds left, 0.0 when inactive
    remaining: f32,
}

impl GlobalCooldown {
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Start the window; a shorter duration never shortens a running one.
    pub fn start(&mut self, duration: f32) {
        self.remaining = self.remaining.max(duration);
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }
}

/// Remembered cast that could not be started because the target was out of
/// range or sight. The unit closes in until the distance falls in the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpellOpener {
    pub ability: AbilityId,
    pub min_range: f32,
    pub max_range: f32,
}

#[derive(Component, Clone, Debug)]
pub struct ControlProfile {
    /// Stable companion number, used by name queries
    pub pet_number: u32,
    pub command_state: CommandState,
    pub reaction_state: ReactState,
    pub action_bar: ActionBar,
    pub global_cooldown: GlobalCooldown,
    /// Set whenever the unit is told to disengage or re-target
    pub retreating: bool,
    pub spell_opener: Option<SpellOpener>,
    /// Anchor recorded by Stay
    pub stay_position: Option<Vec3>,
    /// Autocast flags for charmed units; owned companions keep theirs in the spellbook
    pub creature_autocast: HashSet<AbilityId>,
}

impl Default for ControlProfile {
    fn default() -> Self {
        Self {
            pet_number: 0,
            command_state: CommandState::Follow,
            reaction_state: ReactState::Defensive,
            action_bar: ActionBar::default(),
            global_cooldown: GlobalCooldown::default(),
            retreating: false,
            spell_opener: None,
            stay_position: None,
            creature_autocast: HashSet::new(),
        }
    }
}

impl ControlProfile {
    pub fn new(pet_number: u32, action_bar: ActionBar) -> Self {
        Self {
            pet_number,
            action_bar,
            ..default()
        }
    }

    pub fn set_opener(&mut self, ability: AbilityId, min_range: f32, max_range: f32) {
        self.spell_opener = Some(SpellOpener {
            ability,
            min_range,
            max_range,
        });
    }

    pub fn clear_opener(&mut self) {
        self.spell_opener = None;
    }

    pub fn toggle_creature_autocast(&mut self, ability: AbilityId, enabled: bool) {
        if enabled {
            self.creature_autocast.insert(ability);
        } else {
            self.creature_autocast.remove(&ability);
        }
    }
}
