//! Combat hand-off helpers shared by the Attack command and the cast
//! pipeline.

use bevy::prelude::*;

use crate::settings::ControlSettings;

use super::components::{Capabilities, CombatAi, MotionMaster, Unit};
use super::notices::{AiReactionNotice, PetTalk, PetTalkNotice};
use super::rng::GameRng;

/// How the unit ended up pursuing its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Engagement {
    /// The autonomous combat driver took over
    Driver,
    /// No driver; the unit was sent straight into melee
    Melee,
}

/// Halt the unit's current attack.
pub fn attack_stop(world: &mut World, unit: Entity) {
    if let Some(mut u) = world.get_mut::<Unit>(unit) {
        u.victim = None;
    }
    if let Some(mut ai) = world.get_mut::<CombatAi>(unit) {
        ai.disengage();
    }
}

pub fn clear_motion(world: &mut World, unit: Entity) {
    if let Some(mut motion) = world.get_mut::<MotionMaster>(unit) {
        motion.clear();
    }
}

/// Raise the controller's combat flag against `target`.
pub fn raise_combat(world: &mut World, controller: Entity, target: Entity) {
    if let Some(mut owner) = world.get_mut::<Unit>(controller) {
        owner.set_in_combat_with(target);
    }
}

/// Hand `unit` to its combat driver against `target`, or engage directly
/// when it has none.
///
/// A summoned companion may voice its attack cue; the driver path also
/// sends the AI reaction cue.
pub fn engage(world: &mut World, unit: Entity, target: Entity, caps: &Capabilities) -> Engagement {
    if let Some(mut u) = world.get_mut::<Unit>(unit) {
        u.victim = Some(target);
    }

    if caps.has_combat_ai {
        if let Some(mut ai) = world.get_mut::<CombatAi>(unit) {
            ai.engage(target);
        }
        if caps.can_talk() && unit != target {
            roll_attack_talk(world, unit);
        }
        world.send_event(AiReactionNotice { pet: unit });
        Engagement::Driver
    } else {
        if let Some(mut motion) = world.get_mut::<MotionMaster>(unit) {
            motion.move_chase(target);
        }
        Engagement::Melee
    }
}

fn roll_attack_talk(world: &mut World, unit: Entity) {
    let chance = world
        .get_resource::<ControlSettings>()
        .map_or(0.1, |s| s.attack_talk_chance);
    let talks = world
        .get_resource_mut::<GameRng>()
        .is_some_and(|mut rng| rng.roll_chance(chance));
    if talks {
        world.send_event(PetTalkNotice {
            pet: unit,
            talk: PetTalk::Attack,
        });
    }
}
