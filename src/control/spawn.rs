//! World setup and unit spawning
//!
//! Helpers for establishing control over units, used by the headless
//! harness and the tests. Establishing control inserts a `ControlProfile`;
//! ending it (release, unsummon, despawn) removes it.

use bevy::prelude::*;

use crate::settings::ControlSettings;

use super::abilities::AbilityId;
use super::ability_config::AbilityDefinitions;
use super::action_bar::{ActionBar, ActiveState};
use super::components::{
    ActiveAuras, Aura, AuraType, CharmedFrom, CombatAi, ControlKind, Controlled, MotionMaster, Pet, PetType, Spellbook, Unit,
};
use super::engine::AbilityEngine;
use super::geometry::LineOfSight;
use super::log::ControlLog;
use super::notices::*;
use super::profile::ControlProfile;
use super::requests::ControlRequest;
use super::rng::GameRng;

/// Event queues for every request and notice type, on a bare `World`.
pub fn register_control_events(world: &mut World) {
    world.init_resource::<Events<ControlRequest>>();
    world.init_resource::<Events<CastResultNotice>>();
    world.init_resource::<Events<CooldownClearNotice>>();
    world.init_resource::<Events<PetTalkNotice>>();
    world.init_resource::<Events<AiReactionNotice>>();
    world.init_resource::<Events<FacingUpdateNotice>>();
    world.init_resource::<Events<NameQueryResponse>>();
    world.init_resource::<Events<PetNameInvalidNotice>>();
    world.init_resource::<Events<TalentsInfoNotice>>();
    world.init_resource::<Events<AbilityStarted>>();
    world.init_resource::<Events<PetUnsummoned>>();
    world.init_resource::<Events<CharmReleased>>();
    world.init_resource::<Events<PetRenamed>>();
    world.init_resource::<Events<PetTalentReset>>();
    world.init_resource::<Events<PetTalentLearn>>();
}

/// Prepare a bare `World` for the control handlers. Resources already
/// present are kept.
pub fn init_control_world(world: &mut World) {
    register_control_events(world);
    world.init_resource::<AbilityDefinitions>();
    world.init_resource::<AbilityEngine>();
    world.init_resource::<ControlSettings>();
    world.init_resource::<ControlLog>();
    world.init_resource::<LineOfSight>();
    if !world.contains_resource::<GameRng>() {
        world.insert_resource(GameRng::from_seed(0));
    }
}

// ============================================================================
// Spawning
// ============================================================================

pub fn spawn_player(world: &mut World, name: &str, team: u8, position: Vec3) -> Entity {
    world
        .spawn((Unit::player(name, team), Transform::from_translation(position)))
        .id()
}

/// An uncontrolled creature. Give it a combat driver with `with_ai`.
pub fn spawn_creature(world: &mut World, name: &str, team: u8, position: Vec3, abilities: &[AbilityId], with_ai: bool) -> Entity {
    let mut entity = world.spawn((
        Unit::new(name, team),
        Transform::from_translation(position),
        Spellbook::with_abilities(abilities.iter().copied()),
        ActiveAuras::default(),
        MotionMaster::default(),
    ));
    if with_ai {
        entity.insert(CombatAi::default());
    }
    entity.id()
}

fn bar_for(abilities: &[AbilityId]) -> ActionBar {
    let slots: Vec<(AbilityId, ActiveState)> = abilities.iter().map(|a| (*a, ActiveState::Disabled)).collect();
    ActionBar::with_abilities(&slots)
}

/// Spawn an owned companion next to `owner`, on the owner's team.
pub fn spawn_companion(
    world: &mut World,
    owner: Entity,
    name: &str,
    pet_type: PetType,
    pet_number: u32,
    abilities: &[AbilityId],
    position: Vec3,
) -> Entity {
    let team = world.get::<Unit>(owner).map_or(0, |u| u.team);
    world
        .spawn((
            Unit::new(name, team),
            Transform::from_translation(position),
            Controlled {
                controller: owner,
                kind: ControlKind::Pet,
                temporary_summon: false,
            },
            Pet::new(pet_type),
            Spellbook::with_abilities(abilities.iter().copied()),
            ActiveAuras::default(),
            MotionMaster::default(),
            CombatAi::default(),
            ControlProfile::new(pet_number, bar_for(abilities)),
        ))
        .id()
}

/// Put a creature under `controller`'s command. The creature joins the
/// controller's team for as long as the charm lasts.
pub fn charm_unit(world: &mut World, unit: Entity, controller: Entity, temporary_summon: bool) {
    let controller_team = world.get::<Unit>(controller).map(|u| u.team);
    let mut original_team = None;
    if let (Some(team), Some(mut charmed)) = (controller_team, world.get_mut::<Unit>(unit)) {
        original_team = Some(charmed.team);
        charmed.team = team;
    }
    let mut abilities: Vec<AbilityId> = world
        .get::<Spellbook>(unit)
        .map(|book| book.known.keys().copied().collect())
        .unwrap_or_default();
    abilities.sort_by_key(|a| a.0);
    if let Ok(mut entity) = world.get_entity_mut(unit) {
        entity.insert((
            Controlled {
                controller,
                kind: ControlKind::Charmed,
                temporary_summon,
            },
            ControlProfile::new(0, bar_for(&abilities)),
        ));
        if let Some(team) = original_team {
            entity.insert(CharmedFrom { team });
        }
    }
}

/// Hand a player unit to `controller` under full possession.
pub fn possess_player(world: &mut World, player: Entity, controller: Entity) {
    if let Ok(mut entity) = world.get_entity_mut(player) {
        if !entity.contains::<ActiveAuras>() {
            entity.insert(ActiveAuras::default());
        }
        if let Some(mut auras) = entity.get_mut::<ActiveAuras>() {
            auras.auras.push(Aura::new(AuraType::Possess));
        }
        entity.insert((
            Controlled {
                controller,
                kind: ControlKind::PossessedPlayer,
                temporary_summon: false,
            },
            MotionMaster::default(),
            ControlProfile::default(),
        ));
    }
}
