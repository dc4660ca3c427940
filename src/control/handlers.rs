//! Handlers for the requests that do not go through the pet-action button:
//! stop attack, action-bar edits, autocast, abandon, talents, and the
//! client-correlated cast.

use bevy::prelude::*;

use crate::settings::ControlSettings;

use super::abilities::AbilityId;
use super::ability_config::AbilityDefinitions;
use super::action_bar::{ActiveState, SlotUpdate};
use super::cast::{run_cast_pipeline, CastEntry, CastRequest};
use super::commands::{release_control, unsummon_as_deleted};
use super::components::{ControlKind, Pet, PetType, Spellbook};
use super::dispatch::{profile_mut, require_alive, require_profile, resolve_controlled, ActionContext, Outcome};
use super::engage::attack_stop;
use super::errors::ControlError;
use super::notices::{PetTalentLearn, PetTalentReset, TalentsInfoNotice};
use super::profile::ControlProfile;
use super::requests::CastTargets;

pub fn handle_stop_attack(world: &mut World, controller: Entity, unit: Entity) -> Result<Outcome, ControlError> {
    resolve_controlled(world, controller, unit)?;
    require_alive(world, unit)?;
    attack_stop(world, unit);
    Ok(Outcome::AttackStopped)
}

// ============================================================================
// Action bar
// ============================================================================

fn ability_usable(world: &World, unit: Entity, ability: AbilityId) -> bool {
    let passive = world
        .get_resource::<AbilityDefinitions>()
        .and_then(|defs| defs.get(ability))
        .map_or(true, |def| def.passive);
    let known = world
        .get::<Spellbook>(unit)
        .is_some_and(|book| book.has_spell(ability));
    known && !passive
}

/// Store an autocast flag where the unit kind keeps it: on the profile for
/// charmed units, in the spellbook for owned companions.
fn toggle_autocast(world: &mut World, ctx: &ActionContext, ability: AbilityId, enabled: bool) -> Result<(), ControlError> {
    if ctx.caps.is_charmed() {
        profile_mut(world, ctx.unit)?.toggle_creature_autocast(ability, enabled);
    } else if let Some(mut book) = world.get_mut::<Spellbook>(ctx.unit) {
        book.toggle_autocast(ability, enabled);
    }
    Ok(())
}

/// Apply a set-action batch. The batch is validated as a whole first;
/// after that, slots naming an ability the unit does not know are skipped
/// one by one.
pub fn handle_set_action(
    world: &mut World,
    controller: Entity,
    unit: Entity,
    updates: &[SlotUpdate],
) -> Result<Outcome, ControlError> {
    let ctx = resolve_controlled(world, controller, unit)?;
    if ctx.caps.is_player_controlled {
        return Err(ControlError::PlayerUnitRestricted(unit));
    }
    if ctx.caps.actions_disabled {
        return Err(ControlError::ActionsDisabled(unit));
    }
    world
        .get::<ControlProfile>(unit)
        .ok_or(ControlError::MissingProfile(unit))?
        .action_bar
        .check_updates(updates)?;

    let mut applied = 0;
    let mut skipped = 0;
    for update in updates {
        let button = update.button;
        if let Some(ability) = button.ability_id() {
            if !world.get::<Spellbook>(unit).is_some_and(|book| book.has_spell(ability)) {
                debug!("Skipping slot {}: {:?} does not know {}", update.position, unit, ability);
                skipped += 1;
                continue;
            }
            match button.state {
                ActiveState::Enabled => toggle_autocast(world, &ctx, ability, true)?,
                ActiveState::Disabled => toggle_autocast(world, &ctx, ability, false)?,
                _ => {}
            }
        }
        profile_mut(world, unit)?.action_bar.set(update.position, button);
        applied += 1;
    }

    Ok(Outcome::ActionBarUpdated { applied, skipped })
}

pub fn handle_set_spell_autocast(
    world: &mut World,
    controller: Entity,
    unit: Entity,
    ability: AbilityId,
    enabled: bool,
) -> Result<Outcome, ControlError> {
    let ctx = resolve_controlled(world, controller, unit)?;
    if ctx.caps.is_player_controlled {
        return Err(ControlError::PlayerUnitRestricted(unit));
    }
    if !ability_usable(world, unit, ability) {
        return Err(ControlError::AbilityNotUsable(ability));
    }
    require_profile(world, unit)?;

    toggle_autocast(world, &ctx, ability, enabled)?;
    profile_mut(world, unit)?.action_bar.set_spell_autocast(ability, enabled);
    Ok(Outcome::AutocastSet { ability, enabled })
}

// ============================================================================
// Abandon
// ============================================================================

/// Standalone abandon request. An owned companion loses happiness and is
/// unsummoned for good; a charmed unit is let go.
pub fn handle_abandon(world: &mut World, controller: Entity, unit: Entity) -> Result<Outcome, ControlError> {
    let ctx = resolve_controlled(world, controller, unit)?;

    match ctx.caps.kind {
        ControlKind::Pet => {
            let penalty = world
                .get_resource::<ControlSettings>()
                .map_or(50_000, |s| s.abandon_happiness_penalty);
            if let Some(mut pet) = world.get_mut::<Pet>(unit) {
                pet.modify_happiness(-penalty);
            }
            unsummon_as_deleted(world, unit, controller);
        }
        ControlKind::Charmed | ControlKind::PossessedPlayer => release_control(world, unit, controller),
    }
    Ok(Outcome::Abandoned)
}

// ============================================================================
// Talents
// ============================================================================

pub fn handle_unlearn_talents(world: &mut World, controller: Entity, unit: Entity) -> Result<Outcome, ControlError> {
    let ctx = resolve_controlled(world, controller, unit)?;
    if ctx.caps.kind != ControlKind::Pet {
        return Err(ControlError::NotController { unit, controller });
    }
    let has_talents = world
        .get::<Pet>(unit)
        .is_some_and(|pet| pet.pet_type == PetType::Hunter && pet.used_talents > 0);
    if !has_talents {
        return Err(ControlError::NoTalentsToReset(unit));
    }
    require_profile(world, unit)?;

    world.send_event(PetTalentReset { owner: controller, pet: unit });
    world.send_event(TalentsInfoNotice { recipient: controller });
    Ok(Outcome::TalentsForwarded)
}

pub fn handle_learn_talents(
    world: &mut World,
    controller: Entity,
    unit: Entity,
    talents: &[(u32, u32)],
) -> Result<Outcome, ControlError> {
    resolve_controlled(world, controller, unit)?;
    for &(talent_id, rank) in talents {
        world.send_event(PetTalentLearn {
            owner: controller,
            pet: unit,
            talent_id,
            rank,
        });
    }
    world.send_event(TalentsInfoNotice { recipient: controller });
    Ok(Outcome::TalentsForwarded)
}

// ============================================================================
// Client-correlated cast
// ============================================================================

pub fn handle_cast_spell(
    world: &mut World,
    controller: Entity,
    unit: Entity,
    cast_count: u8,
    ability: AbilityId,
    targets: CastTargets,
) -> Result<Outcome, ControlError> {
    let ctx = resolve_controlled(world, controller, unit)?;
    if ctx.caps.is_player_controlled {
        return Err(ControlError::PlayerUnitRestricted(unit));
    }
    let request = CastRequest {
        ability,
        cast_count,
        target: targets.unit,
        destination: targets.destination,
        entry: CastEntry::ClientCorrelated,
    };
    run_cast_pipeline(world, &ctx, request).map(|result| Outcome::Cast { ability, result })
}
