//! Reaction-Mode State Machine
//!
//! Passive, Defensive, Aggressive. Orthogonal to the movement command; all
//! three end in the same state write.

use bevy::prelude::*;

use super::commands::move_follow_controller;
use super::dispatch::{profile_mut, ActionContext};
use super::engage::attack_stop;
use super::errors::ControlError;
use super::profile::{CommandState, ReactState};

pub fn handle_reaction(world: &mut World, ctx: &ActionContext, code: u32) -> Result<ReactState, ControlError> {
    let state = ReactState::from_code(code).ok_or(ControlError::UnknownReaction(code))?;
    set_reaction(world, ctx, state, state == ReactState::Passive)?;
    Ok(state)
}

/// Record the reaction mode. With `disengage`, the unit also drops its
/// attack and, unless told to stay, resumes following.
pub fn set_reaction(
    world: &mut World,
    ctx: &ActionContext,
    state: ReactState,
    disengage: bool,
) -> Result<(), ControlError> {
    if disengage {
        attack_stop(world, ctx.unit);
        let command = {
            let mut profile = profile_mut(world, ctx.unit)?;
            profile.clear_opener();
            profile.command_state
        };
        if command != CommandState::Stay {
            move_follow_controller(world, ctx);
        }
    }

    profile_mut(world, ctx.unit)?.reaction_state = state;
    Ok(())
}
