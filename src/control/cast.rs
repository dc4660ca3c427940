//! Cast Validation Pipeline
//!
//! Decides, for one cast request, whether the controlled unit starts the
//! ability, goes to get in range for it, or refuses it with a reported
//! reason. Both entry points (action-bar press and client-correlated cast)
//! run through [`run_cast_pipeline`]; they differ only in the area-effect
//! check and in aura-triggered casts skipping the legality check.
//!
//! Stages run in order and the first refusal ends the request:
//!
//! 1. Ability existence (protocol violation)
//! 2. Global cooldown (expected race, not logged)
//! 3. Area-effect exclusion (action-bar entry only)
//! 4. Known and non-passive
//! 5. Local legality check by the ability engine
//! 6. Out of range or sight at a hostile target: remember the opener, chase
//! 7. Facing correction
//! 8. Commit
//! 9. Reject and report
//!
//! Stages 1-4 return an error and leave the world untouched. From stage 5 on
//! a [`PendingCast`] exists and is handed to exactly one of `start` or
//! `abort`.

use bevy::prelude::*;

use super::abilities::AbilityId;
use super::ability_config::{AbilityConfig, AbilityDefinitions};
use super::components::{ActiveAuras, Spellbook, Unit};
use super::dispatch::ActionContext;
use super::engage::{attack_stop, clear_motion, engage, raise_combat};
use super::engine::{AbilityEngine, AbilityResolver, CastFailure, PendingCast};
use super::errors::ControlError;
use super::geometry::{face_towards, ground_distance, LineOfSight};
use super::notices::{CastResultNotice, CooldownClearNotice, FacingUpdateNotice};
use super::profile::ControlProfile;
use super::requests::CastTargets;

/// Which door the request came through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastEntry {
    /// Action-bar button; area abilities are refused
    ActionBar,
    /// Client-correlated cast with client-chosen targets
    ClientCorrelated,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastRequest {
    pub ability: AbilityId,
    /// Client attempt counter echoed in failure reports
    pub cast_count: u8,
    pub target: Option<Entity>,
    pub destination: Option<Vec3>,
    pub entry: CastEntry,
}

/// How a cast request that passed stages 1-4 ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastOutcome {
    /// Handed to the ability engine
    Committed,
    /// Target out of reach; the unit closes in with the ability as opener
    Chasing,
    Rejected(CastFailure),
}

pub fn run_cast_pipeline(
    world: &mut World,
    ctx: &ActionContext,
    request: CastRequest,
) -> Result<CastOutcome, ControlError> {
    let ability = request.ability;

    // 1. Existence
    let def = world
        .get_resource::<AbilityDefinitions>()
        .and_then(|defs| defs.get(ability))
        .cloned()
        .ok_or(ControlError::UnknownAbility(ability))?;

    // 2. Global cooldown
    let gcd_active = world
        .get::<ControlProfile>(ctx.unit)
        .ok_or(ControlError::MissingProfile(ctx.unit))?
        .global_cooldown
        .is_active();
    if gcd_active {
        return Err(ControlError::GlobalCooldown(ctx.unit));
    }

    // 3. Area effects
    if request.entry == CastEntry::ActionBar && def.hits_all_enemies_in_area() {
        return Err(ControlError::AreaAbilityRefused(ability));
    }

    // 4. Known, not passive
    let triggered = request.entry == CastEntry::ClientCorrelated
        && world
            .get::<ActiveAuras>(ctx.unit)
            .is_some_and(|auras| auras.triggered_by_client_aura(ability).is_some());
    let known = world
        .get::<Spellbook>(ctx.unit)
        .is_some_and(|book| book.has_spell(ability));
    if (!known && !triggered) || def.passive {
        return Err(ControlError::AbilityNotUsable(ability));
    }

    if let Some(mut unit) = world.get_mut::<Unit>(ctx.unit) {
        unit.moving = false;
    }

    let mut cast = PendingCast {
        caster: ctx.unit,
        ability,
        cast_count: request.cast_count,
        explicit_target: request.target,
        targets: CastTargets {
            unit: request.target,
            destination: request.destination,
        },
        triggered,
    };

    if !world.contains_resource::<AbilityEngine>() {
        world.init_resource::<AbilityEngine>();
    }
    let outcome = world.resource_scope(|world, engine: Mut<AbilityEngine>| {
        let engine: &dyn AbilityResolver = &*engine.0;

        // 5. Legality
        let result = if triggered {
            Ok(())
        } else {
            engine.check_cast(world, &mut cast)
        };

        // 6. Chase instead of failing
        if let Some(target) = chase_target(world, ctx, &def, request.target) {
            return chase(world, ctx, engine, cast, target, &def);
        }

        // 7. Facing
        let result = match result {
            Err(CastFailure::UnitNotInfront) if !ctx.caps.fully_possessed => {
                face_target(world, ctx, request.target.or(cast.unit_target()));
                Ok(())
            }
            other => other,
        };

        match result {
            Ok(()) => commit(world, ctx, engine, cast, &def),
            Err(failure) => reject(world, ctx, engine, cast, failure),
        }
    });
    Ok(outcome)
}

/// The explicit target the unit should chase, if stage 6 applies.
fn chase_target(world: &World, ctx: &ActionContext, def: &AbilityConfig, target: Option<Entity>) -> Option<Entity> {
    let target = target?;
    if ctx.caps.fully_possessed {
        return None;
    }
    let target_unit = world.get::<Unit>(target)?;
    let friendly = world
        .get::<Unit>(ctx.controller)
        .is_some_and(|owner| owner.is_friendly_to(target_unit));
    if friendly {
        return None;
    }

    let from = world.get::<Transform>(ctx.unit)?.translation;
    let to = world.get::<Transform>(target)?.translation;
    let in_range = ground_distance(from, to) <= def.max_range;
    let in_sight = world
        .get_resource::<LineOfSight>()
        .map_or(true, |los| los.is_clear(from, to));
    (!(in_range && in_sight)).then_some(target)
}

fn chase(
    world: &mut World,
    ctx: &ActionContext,
    engine: &dyn AbilityResolver,
    cast: PendingCast,
    target: Entity,
    def: &AbilityConfig,
) -> CastOutcome {
    if let Some(mut profile) = world.get_mut::<ControlProfile>(ctx.unit) {
        profile.set_opener(cast.ability, def.min_range, def.max_range);
    }
    engine.abort(world, cast);

    attack_stop(world, ctx.unit);
    clear_motion(world, ctx.unit);
    engage(world, ctx.unit, target, &ctx.caps);
    CastOutcome::Chasing
}

/// Snap the unit's facing toward `target` and push the change to the
/// players who see it turn.
fn face_target(world: &mut World, ctx: &ActionContext, target: Option<Entity>) {
    let Some(target) = target else {
        return;
    };
    let Some(target_pos) = world.get::<Transform>(target).map(|t| t.translation) else {
        return;
    };
    if let Some(mut transform) = world.get_mut::<Transform>(ctx.unit) {
        face_towards(&mut transform, target_pos);
    }

    if world.get::<Unit>(target).is_some_and(|u| u.is_player) {
        world.send_event(FacingUpdateNotice {
            unit: ctx.unit,
            observer: target,
        });
    }
    if ctx.caps.owner_is_player && ctx.controller != target {
        world.send_event(FacingUpdateNotice {
            unit: ctx.unit,
            observer: ctx.controller,
        });
    }
}

fn commit(
    world: &mut World,
    ctx: &ActionContext,
    engine: &dyn AbilityResolver,
    cast: PendingCast,
    def: &AbilityConfig,
) -> CastOutcome {
    if let Some(mut book) = world.get_mut::<Spellbook>(ctx.unit) {
        book.add_cooldown(cast.ability, def.cooldown);
    }
    if let Some(mut profile) = world.get_mut::<ControlProfile>(ctx.unit) {
        profile.global_cooldown.start(def.global_cooldown);
    }

    if let Some(target) = cast.unit_target() {
        let hostile = match (world.get::<Unit>(ctx.controller), world.get::<Unit>(target)) {
            (Some(owner), Some(target_unit)) => !owner.is_friendly_to(target_unit),
            _ => false,
        };
        let victim = world.get::<Unit>(ctx.unit).and_then(|u| u.victim);
        if hostile && !ctx.caps.fully_possessed && victim != Some(target) {
            attack_stop(world, ctx.unit);
            clear_motion(world, ctx.unit);
            raise_combat(world, ctx.controller, target);
            engage(world, ctx.unit, target, &ctx.caps);
        }
    }

    if let Some(mut profile) = world.get_mut::<ControlProfile>(ctx.unit) {
        profile.clear_opener();
    }
    engine.start(world, cast);
    CastOutcome::Committed
}

fn reject(
    world: &mut World,
    ctx: &ActionContext,
    engine: &dyn AbilityResolver,
    cast: PendingCast,
    failure: CastFailure,
) -> CastOutcome {
    let recipient = if ctx.caps.fully_possessed {
        Some((ctx.controller, false))
    } else if ctx.caps.owner_is_player {
        Some((ctx.controller, true))
    } else {
        None
    };
    if let Some((recipient, pet_cast)) = recipient {
        world.send_event(CastResultNotice {
            recipient,
            ability: cast.ability,
            cast_count: cast.cast_count,
            failure,
            pet_cast,
        });
    }

    let on_cooldown = world
        .get::<Spellbook>(ctx.unit)
        .is_some_and(|book| book.has_cooldown(cast.ability));
    if !on_cooldown {
        world.send_event(CooldownClearNotice {
            recipient: ctx.controller,
            ability: cast.ability,
            unit: ctx.unit,
        });
    }

    if let Some(mut profile) = world.get_mut::<ControlProfile>(ctx.unit) {
        profile.clear_opener();
    }
    debug!("Cast {} by {:?} rejected: {:?}", cast.ability, ctx.unit, failure);
    engine.abort(world, cast);
    CastOutcome::Rejected(failure)
}
