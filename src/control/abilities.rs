//! Ability System - Types and Enums
//!
//! Ability ids as they arrive from the client, plus the enums the
//! definitions in `assets/config/abilities.ron` are written with.
//! Definitions themselves are loaded by the `ability_config` module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric ability identifier, exactly as the client sends it.
///
/// Ids come off the wire, so an id is not proof the ability exists:
/// always resolve it through `AbilityDefinitions` first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub u32);

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AbilityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Spell schools - decides whether silence or pacify blocks a cast.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SpellSchool {
    /// Physical abilities (bites, claws, weapon strikes)
    Physical,
    Frost,
    Holy,
    Shadow,
    Arcane,
    Fire,
    Nature,
    /// No spell school
    None,
}

impl SpellSchool {
    /// Physical abilities are stopped by pacify, everything else by silence.
    pub fn is_physical(&self) -> bool {
        matches!(self, SpellSchool::Physical)
    }
}

/// Implicit target of one ability effect.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ImplicitTarget {
    /// The caster itself
    Caster,
    /// A single hostile unit (explicit target, else the caster's victim)
    EnemyUnit,
    /// A single friendly unit (explicit target, else the caster)
    FriendlyUnit,
    /// Every enemy inside an area
    AllEnemiesInArea,
    /// Every enemy inside an area, resolved instantly
    AllEnemiesInAreaInstant,
    /// Every enemy inside an area, for the duration of a channel
    AllEnemiesInAreaChanneled,
    /// A ground position
    Destination,
}

impl ImplicitTarget {
    /// Area effects that hit every enemy around the target point.
    /// Controlled units are never allowed to start these from the action bar.
    pub fn is_all_enemies_in_area(&self) -> bool {
        matches!(
            self,
            ImplicitTarget::AllEnemiesInArea
                | ImplicitTarget::AllEnemiesInAreaInstant
                | ImplicitTarget::AllEnemiesInAreaChanneled
        )
    }

    /// Whether the effect needs a single unit to land on.
    pub fn needs_unit(&self) -> bool {
        matches!(self, ImplicitTarget::EnemyUnit | ImplicitTarget::FriendlyUnit)
    }
}
