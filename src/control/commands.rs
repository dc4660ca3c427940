//! Movement-Command State Machine
//!
//! Stay, Follow, Attack, and Abandon. Attack does not touch the recorded
//! command state: where the unit stands and whom it fights are separate
//! axes.

use bevy::prelude::*;

use crate::settings::ControlSettings;

use super::components::{Capabilities, CharmedFrom, CombatAi, ControlKind, Controlled, MotionMaster, PetType, Unit, DeathState};
use super::dispatch::{profile_mut, ActionContext};
use super::engage::{attack_stop, clear_motion, engage, raise_combat};
use super::errors::ControlError;
use super::notices::{CharmReleased, PetSaveMode, PetUnsummoned};
use super::profile::{CommandState, ControlProfile};

pub fn handle_command(
    world: &mut World,
    ctx: &ActionContext,
    code: u32,
    target: Option<Entity>,
) -> Result<CommandState, ControlError> {
    let command = CommandState::from_code(code).ok_or(ControlError::UnknownCommand(code))?;
    match command {
        CommandState::Stay => stay(world, ctx)?,
        CommandState::Follow => follow(world, ctx)?,
        CommandState::Attack => attack(world, ctx, target)?,
        CommandState::Abandon => abandon(world, ctx),
    }
    Ok(command)
}

fn stay(world: &mut World, ctx: &ActionContext) -> Result<(), ControlError> {
    let anchor = world.get::<Transform>(ctx.unit).map(|t| t.translation);
    if let Some(mut unit) = world.get_mut::<Unit>(ctx.unit) {
        unit.moving = false;
    }
    attack_stop(world, ctx.unit);
    if let Some(mut motion) = world.get_mut::<MotionMaster>(ctx.unit) {
        motion.clear();
        motion.move_idle();
    }

    let mut profile = profile_mut(world, ctx.unit)?;
    profile.stay_position = anchor;
    profile.retreating = true;
    profile.clear_opener();
    profile.command_state = CommandState::Stay;
    Ok(())
}

/// Put the unit back on the follow leash behind its controller.
pub fn move_follow_controller(world: &mut World, ctx: &ActionContext) {
    let (distance, angle) = world
        .get_resource::<ControlSettings>()
        .map_or((1.0, std::f32::consts::FRAC_PI_2), |s| (s.follow_distance, s.follow_angle));
    if let Some(mut motion) = world.get_mut::<MotionMaster>(ctx.unit) {
        motion.clear();
        motion.move_follow(ctx.controller, distance, angle);
    }
}

fn follow(world: &mut World, ctx: &ActionContext) -> Result<(), ControlError> {
    profile_mut(world, ctx.unit)?.stay_position = None;
    attack_stop(world, ctx.unit);
    move_follow_controller(world, ctx);

    let mut profile = profile_mut(world, ctx.unit)?;
    profile.retreating = true;
    profile.clear_opener();
    profile.command_state = CommandState::Follow;
    Ok(())
}

fn attack(world: &mut World, ctx: &ActionContext, target: Option<Entity>) -> Result<(), ControlError> {
    let target = target.ok_or(ControlError::InvalidAttackTarget)?;
    let target_unit = world.get::<Unit>(target).ok_or(ControlError::InvalidAttackTarget)?;
    let friendly = world
        .get::<Unit>(ctx.controller)
        .is_some_and(|owner| owner.is_friendly_to(target_unit));
    if friendly {
        return Err(ControlError::InvalidAttackTarget);
    }

    {
        let mut profile = profile_mut(world, ctx.unit)?;
        profile.retreating = true;
        profile.clear_opener();
    }

    let current_victim = world.get::<Unit>(ctx.unit).and_then(|u| u.victim);
    if current_victim != Some(target) {
        attack_stop(world, ctx.unit);
    }
    clear_motion(world, ctx.unit);
    raise_combat(world, ctx.controller, target);
    let engagement = engage(world, ctx.unit, target, &ctx.caps);
    debug!("{:?} attacking {:?} ({:?})", ctx.unit, target, engagement);
    Ok(())
}

/// Release a charmed or possessed unit back to its own behaviour.
pub fn release_control(world: &mut World, unit: Entity, controller: Entity) {
    if let Ok(mut entity) = world.get_entity_mut(unit) {
        let original = entity.take::<CharmedFrom>();
        entity.remove::<(Controlled, ControlProfile)>();
        if let (Some(from), Some(mut state)) = (original, entity.get_mut::<Unit>()) {
            state.team = from.team;
        }
    }
    if let Some(mut ai) = world.get_mut::<CombatAi>(unit) {
        ai.disengage();
    }
    world.send_event(CharmReleased {
        unit,
        former_controller: controller,
    });
    info!("{:?} released control of {:?}", controller, unit);
}

/// Unsummon an owned companion for good.
pub fn unsummon_as_deleted(world: &mut World, pet: Entity, owner: Entity) {
    world.send_event(PetUnsummoned {
        pet,
        owner,
        save_mode: PetSaveMode::AsDeleted,
    });
    world.despawn(pet);
    info!("{:?} abandoned companion {:?}", owner, pet);
}

fn abandon(world: &mut World, ctx: &ActionContext) {
    let caps: Capabilities = ctx.caps;
    let mut despawned = false;

    match (caps.kind, caps.pet_type) {
        (ControlKind::Pet, Some(PetType::Hunter)) => {
            unsummon_as_deleted(world, ctx.unit, ctx.controller);
            despawned = true;
        }
        (ControlKind::Pet, _) => {
            // Dismissal counts as a death so on-death effects still fire
            if let Some(mut unit) = world.get_mut::<Unit>(ctx.unit) {
                unit.death_state = DeathState::Corpse;
                unit.victim = None;
            }
            // Control ends with the death
            if let Ok(mut entity) = world.get_entity_mut(ctx.unit) {
                entity.remove::<(Controlled, ControlProfile)>();
            }
            return;
        }
        (ControlKind::Charmed | ControlKind::PossessedPlayer, _) => {
            release_control(world, ctx.unit, ctx.controller);
        }
    }

    if caps.temporary_summon {
        if !despawned {
            world.despawn(ctx.unit);
        }
        return;
    }

    if let Some(mut profile) = world.get_mut::<ControlProfile>(ctx.unit) {
        profile.stay_position = None;
    }
}
