//! Component Definitions
//!
//! ECS components describing units, who controls them, and the motion and
//! combat state the control handlers mutate.
//!
//! Units are owned by the `World`. Nothing here holds a reference to another
//! unit other than by `Entity`, so a despawn never leaves a dangling pointer.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::abilities::AbilityId;

// ============================================================================
// Units
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathState {
    #[default]
    Alive,
    JustDied,
    Corpse,
    Dead,
}

/// Any creature or player present in the world.
#[derive(Component, Clone, Debug)]
pub struct Unit {
    pub name: String,
    /// Units on the same team are friendly to each other
    pub team: u8,
    pub is_player: bool,
    pub death_state: DeathState,
    /// Current combat target
    pub victim: Option<Entity>,
    /// Combat flag, raised against the given unit
    pub in_combat_with: Option<Entity>,
    pub current_mana: f32,
    pub max_mana: f32,
    /// Mirrors the moving unit-state; cleared before every cast attempt
    pub moving: bool,
}

impl Unit {
    pub fn new(name: impl Into<String>, team: u8) -> Self {
        Self {
            name: name.into(),
            team,
            is_player: false,
            death_state: DeathState::Alive,
            victim: None,
            in_combat_with: None,
            current_mana: 100.0,
            max_mana: 100.0,
            moving: false,
        }
    }

    pub fn player(name: impl Into<String>, team: u8) -> Self {
        Self {
            is_player: true,
            ..Self::new(name, team)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.death_state == DeathState::Alive
    }

    pub fn is_friendly_to(&self, other: &Unit) -> bool {
        self.team == other.team
    }

    pub fn in_combat(&self) -> bool {
        self.in_combat_with.is_some()
    }

    pub fn set_in_combat_with(&mut self, target: Entity) {
        self.in_combat_with = Some(target);
    }
}

// ============================================================================
// Control relationship
// ============================================================================

/// How the unit came under control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlKind {
    /// Owned companion; details in the `Pet` component
    Pet,
    /// Creature dominated for a while
    Charmed,
    /// Player unit under another player's control
    PossessedPlayer,
}

/// Back-reference from a unit to the player commanding it.
#[derive(Component, Clone, Copy, Debug)]
pub struct Controlled {
    pub controller: Entity,
    pub kind: ControlKind,
    /// Summoned for a limited time; despawned instead of dismissed
    pub temporary_summon: bool,
}

/// Team a charmed unit belonged to before it was charmed.
#[derive(Component, Clone, Copy, Debug)]
pub struct CharmedFrom {
    pub team: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetType {
    /// Tamed beast. Abandoning deletes it for good.
    Hunter,
    /// Summoned demon or elemental. Dismissing kills it.
    Summon,
    Guardian,
}

/// Companion mode flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PetModeFlags(pub u32);

impl PetModeFlags {
    /// Action bar is disabled; every action request is dropped
    pub const DISABLE_ACTIONS: u32 = 0x0800_0000;

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn insert(&mut self, flag: u32) {
        self.0 |= flag;
    }

    pub fn remove(&mut self, flag: u32) {
        self.0 &= !flag;
    }
}

/// Number of grammatical cases a declined name carries.
pub const MAX_DECLINED_NAME_CASES: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclinedNames {
    pub cases: [String; MAX_DECLINED_NAME_CASES],
}

/// Owned companion data.
#[derive(Component, Clone, Debug)]
pub struct Pet {
    pub pet_type: PetType,
    pub mode_flags: PetModeFlags,
    pub happiness: i32,
    pub used_talents: u32,
    pub can_be_renamed: bool,
    /// Unix seconds of the last rename
    pub name_timestamp: u64,
    pub declined_names: Option<DeclinedNames>,
}

impl Pet {
    pub fn new(pet_type: PetType) -> Self {
        Self {
            pet_type,
            mode_flags: PetModeFlags::default(),
            happiness: 1_000_000,
            used_talents: 0,
            can_be_renamed: pet_type == PetType::Hunter,
            name_timestamp: 0,
            declined_names: None,
        }
    }

    pub fn actions_disabled(&self) -> bool {
        self.mode_flags.contains(PetModeFlags::DISABLE_ACTIONS)
    }

    /// Happiness never drops below zero
    pub fn modify_happiness(&mut self, delta: i32) {
        self.happiness = self.happiness.saturating_add(delta).max(0);
    }
}

// ============================================================================
// Abilities and auras
// ============================================================================

/// Abilities a unit knows, with their autocast flags and running cooldowns.
#[derive(Component, Clone, Debug, Default)]
pub struct Spellbook {
    /// Known abilities, mapped to their autocast flag
    pub known: HashMap<AbilityId, bool>,
    /// Seconds remaining per ability
    pub cooldowns: HashMap<AbilityId, f32>,
}

impl Spellbook {
    pub fn with_abilities(abilities: impl IntoIterator<Item = AbilityId>) -> Self {
        Self {
            known: abilities.into_iter().map(|a| (a, false)).collect(),
            cooldowns: HashMap::new(),
        }
    }

    pub fn has_spell(&self, ability: AbilityId) -> bool {
        self.known.contains_key(&ability)
    }

    pub fn has_cooldown(&self, ability: AbilityId) -> bool {
        self.cooldowns.get(&ability).is_some_and(|r| *r > 0.0)
    }

    pub fn add_cooldown(&mut self, ability: AbilityId, duration: f32) {
        if duration > 0.0 {
            self.cooldowns.insert(ability, duration);
        }
    }

    pub fn toggle_autocast(&mut self, ability: AbilityId, enabled: bool) {
        if let Some(flag) = self.known.get_mut(&ability) {
            *flag = enabled;
        }
    }

    pub fn is_autocast(&self, ability: AbilityId) -> bool {
        self.known.get(&ability).copied().unwrap_or(false)
    }

    /// Count down cooldowns, dropping the ones that finished
    pub fn tick(&mut self, dt: f32) {
        self.cooldowns.retain(|_, remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraType {
    /// Full possession: controller input replaces the unit's own AI
    Possess,
    Stun,
    /// Blocks non-physical abilities
    Silence,
    /// Blocks physical abilities
    Pacify,
    /// Lets the client cast an ability the unit does not know
    ClientTrigger,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Aura {
    pub aura_type: AuraType,
    /// Ability this aura lets the client trigger (ClientTrigger only)
    pub grants: Option<AbilityId>,
}

impl Aura {
    pub fn new(aura_type: AuraType) -> Self {
        Self {
            aura_type,
            grants: None,
        }
    }

    pub fn client_trigger(ability: AbilityId) -> Self {
        Self {
            aura_type: AuraType::ClientTrigger,
            grants: Some(ability),
        }
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct ActiveAuras {
    pub auras: Vec<Aura>,
}

impl ActiveAuras {
    pub fn has(&self, aura_type: AuraType) -> bool {
        self.auras.iter().any(|a| a.aura_type == aura_type)
    }

    /// The aura letting the client trigger `ability`, if any
    pub fn triggered_by_client_aura(&self, ability: AbilityId) -> Option<&Aura> {
        self.auras
            .iter()
            .find(|a| a.aura_type == AuraType::ClientTrigger && a.grants == Some(ability))
    }
}

// ============================================================================
// Motion and combat drivers
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionPolicy {
    Idle,
    Follow {
        target: Entity,
        distance: f32,
        angle: f32,
    },
    Chase {
        target: Entity,
    },
}

/// Stack of motion policies; the top one drives the unit.
#[derive(Component, Clone, Debug, Default)]
pub struct MotionMaster {
    stack: Vec<MotionPolicy>,
}

impl MotionMaster {
    pub fn current(&self) -> MotionPolicy {
        self.stack.last().copied().unwrap_or(MotionPolicy::Idle)
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    pub fn move_idle(&mut self) {
        self.stack.push(MotionPolicy::Idle);
    }

    pub fn move_follow(&mut self, target: Entity, distance: f32, angle: f32) {
        self.stack.push(MotionPolicy::Follow {
            target,
            distance,
            angle,
        });
    }

    pub fn move_chase(&mut self, target: Entity) {
        self.stack.push(MotionPolicy::Chase { target });
    }
}

/// Autonomous combat driver. Present on units that pick their own attacks;
/// the driver takes over pursuit once engaged.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct CombatAi {
    pub engaged: Option<Entity>,
}

impl CombatAi {
    pub fn engage(&mut self, target: Entity) {
        self.engaged = Some(target);
    }

    pub fn disengage(&mut self) {
        self.engaged = None;
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// What a controlled unit is allowed to do, read from its components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub kind: ControlKind,
    pub is_player_controlled: bool,
    pub actions_disabled: bool,
    pub owner_is_player: bool,
    pub fully_possessed: bool,
    pub pet_type: Option<PetType>,
    pub temporary_summon: bool,
    pub has_combat_ai: bool,
}

impl Capabilities {
    /// Read the capabilities of a controlled unit. `None` if the unit is
    /// missing or not under control.
    pub fn of(world: &World, unit: Entity) -> Option<Self> {
        let controlled = world.get::<Controlled>(unit)?;
        let pet = world.get::<Pet>(unit);
        let is_player = world.get::<Unit>(unit).is_some_and(|u| u.is_player);
        let owner_is_player = world
            .get::<Unit>(controlled.controller)
            .is_some_and(|u| u.is_player);

        Some(Self {
            kind: controlled.kind,
            is_player_controlled: is_player,
            actions_disabled: pet.is_some_and(|p| p.actions_disabled()),
            owner_is_player,
            fully_possessed: world
                .get::<ActiveAuras>(unit)
                .is_some_and(|a| a.has(AuraType::Possess)),
            pet_type: pet.map(|p| p.pet_type),
            temporary_summon: controlled.temporary_summon,
            has_combat_ai: world.get::<CombatAi>(unit).is_some(),
        })
    }

    pub fn is_charmed(&self) -> bool {
        self.kind == ControlKind::Charmed
    }

    /// Only summoned companions voice an attack cue
    pub fn can_talk(&self) -> bool {
        self.pet_type == Some(PetType::Summon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spellbook_cooldowns_tick_out() {
        let mut book = Spellbook::with_abilities([AbilityId(1), AbilityId(2)]);
        book.add_cooldown(AbilityId(1), 2.0);
        book.add_cooldown(AbilityId(2), 0.0);
        assert!(book.has_cooldown(AbilityId(1)));
        assert!(!book.has_cooldown(AbilityId(2)));

        book.tick(1.5);
        assert!(book.has_cooldown(AbilityId(1)));
        book.tick(1.0);
        assert!(!book.has_cooldown(AbilityId(1)));
        assert!(book.cooldowns.is_empty());
    }

    #[test]
    fn test_autocast_only_for_known_abilities() {
        let mut book = Spellbook::with_abilities([AbilityId(1)]);
        book.toggle_autocast(AbilityId(1), true);
        book.toggle_autocast(AbilityId(9), true);
        assert!(book.is_autocast(AbilityId(1)));
        assert!(!book.has_spell(AbilityId(9)));
    }

    #[test]
    fn test_happiness_floor() {
        let mut pet = Pet::new(PetType::Hunter);
        pet.happiness = 30_000;
        pet.modify_happiness(-50_000);
        assert_eq!(pet.happiness, 0);
    }

    #[test]
    fn test_mode_flags() {
        let mut pet = Pet::new(PetType::Summon);
        assert!(!pet.actions_disabled());
        pet.mode_flags.insert(PetModeFlags::DISABLE_ACTIONS);
        assert!(pet.actions_disabled());
        pet.mode_flags.remove(PetModeFlags::DISABLE_ACTIONS);
        assert!(!pet.actions_disabled());
    }

    #[test]
    fn test_motion_master_stack() {
        let target = Entity::from_raw(3);
        let mut motion = MotionMaster::default();
        assert_eq!(motion.current(), MotionPolicy::Idle);
        motion.move_follow(target, 1.0, 0.5);
        motion.move_chase(target);
        assert_eq!(motion.current(), MotionPolicy::Chase { target });
        motion.clear();
        assert!(motion.is_empty());
    }
}
