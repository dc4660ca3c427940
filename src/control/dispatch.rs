//! Command Dispatcher
//!
//! Resolves the unit a request names, checks that the requester commands it,
//! and routes pet actions to the command, reaction, or cast handlers.
//!
//! Every check runs before the first mutation, so a refused request leaves
//! the world exactly as it found it.

use bevy::prelude::*;

use super::abilities::AbilityId;
use super::action_bar::{ActionButton, ActiveState};
use super::cast::{run_cast_pipeline, CastEntry, CastOutcome, CastRequest};
use super::commands::handle_command;
use super::components::{Capabilities, Controlled, Unit};
use super::errors::ControlError;
use super::log::ControlLogEventType;
use super::notices::PetNameInvalidReason;
use super::profile::{CommandState, ControlProfile, ReactState};
use super::reaction::handle_reaction;

/// The (controller, unit) pair a request acts on, with the unit's
/// capabilities read once up front.
#[derive(Clone, Copy, Debug)]
pub struct ActionContext {
    pub controller: Entity,
    pub unit: Entity,
    pub caps: Capabilities,
}

/// What a successfully dispatched request did.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Command(CommandState),
    Reaction(ReactState),
    Cast {
        ability: AbilityId,
        result: CastOutcome,
    },
    AttackStopped,
    ActionBarUpdated {
        applied: usize,
        skipped: usize,
    },
    AutocastSet {
        ability: AbilityId,
        enabled: bool,
    },
    Abandoned,
    NameAnswered {
        found: bool,
    },
    Renamed(String),
    NameRejected(PetNameInvalidReason),
    TalentsForwarded,
}

impl Outcome {
    /// Log category and message for the outcome log
    pub fn log_entry(&self) -> (ControlLogEventType, String) {
        match self {
            Outcome::Command(state) => (ControlLogEventType::Command, format!("{:?}", state)),
            Outcome::Reaction(state) => (ControlLogEventType::Reaction, format!("{:?}", state)),
            Outcome::Cast { ability, result } => match result {
                CastOutcome::Committed => (ControlLogEventType::CastCommitted, format!("{} committed", ability)),
                CastOutcome::Chasing => (ControlLogEventType::CastChase, format!("{} out of reach, closing in", ability)),
                CastOutcome::Rejected(failure) => {
                    (ControlLogEventType::CastRejected, format!("{} rejected: {:?}", ability, failure))
                }
            },
            Outcome::AttackStopped => (ControlLogEventType::Command, "Attack stopped".to_string()),
            Outcome::ActionBarUpdated { applied, skipped } => (
                ControlLogEventType::ActionBar,
                format!("{} slot(s) updated, {} skipped", applied, skipped),
            ),
            Outcome::AutocastSet { ability, enabled } => (
                ControlLogEventType::ActionBar,
                format!("Autocast {} for {}", if *enabled { "on" } else { "off" }, ability),
            ),
            Outcome::Abandoned => (ControlLogEventType::Command, "Abandoned".to_string()),
            Outcome::NameAnswered { found } => (
                ControlLogEventType::Naming,
                if *found { "Name query answered" } else { "Name query for unknown companion" }.to_string(),
            ),
            Outcome::Renamed(name) => (ControlLogEventType::Naming, format!("Renamed to {}", name)),
            Outcome::NameRejected(reason) => (ControlLogEventType::Naming, format!("Name rejected: {:?}", reason)),
            Outcome::TalentsForwarded => (ControlLogEventType::Talents, "Talent request forwarded".to_string()),
        }
    }
}

// ============================================================================
// Shared checks
// ============================================================================

/// Resolve `unit` and confirm `controller` is its registered controller.
pub fn resolve_controlled(world: &World, controller: Entity, unit: Entity) -> Result<ActionContext, ControlError> {
    if world.get::<Unit>(unit).is_none() {
        return Err(ControlError::UnknownUnit(unit));
    }
    let registered = world.get::<Controlled>(unit).map(|c| c.controller);
    if registered != Some(controller) {
        return Err(ControlError::NotController { unit, controller });
    }
    let caps = Capabilities::of(world, unit).ok_or(ControlError::NotController { unit, controller })?;
    Ok(ActionContext { controller, unit, caps })
}

pub fn require_alive(world: &World, unit: Entity) -> Result<(), ControlError> {
    match world.get::<Unit>(unit) {
        Some(u) if u.is_alive() => Ok(()),
        Some(_) => Err(ControlError::UnitDead(unit)),
        None => Err(ControlError::UnknownUnit(unit)),
    }
}

pub fn require_profile(world: &World, unit: Entity) -> Result<(), ControlError> {
    world
        .get::<ControlProfile>(unit)
        .map(|_| ())
        .ok_or(ControlError::MissingProfile(unit))
}

/// Mutable access to the unit's control profile.
pub fn profile_mut(world: &mut World, unit: Entity) -> Result<Mut<'_, ControlProfile>, ControlError> {
    world
        .get_mut::<ControlProfile>(unit)
        .ok_or(ControlError::MissingProfile(unit))
}

// ============================================================================
// Pet action
// ============================================================================

/// Handle an action-bar button press for a controlled unit.
pub fn handle_pet_action(
    world: &mut World,
    controller: Entity,
    unit: Entity,
    data: u32,
    target: Option<Entity>,
) -> Result<Outcome, ControlError> {
    let ctx = resolve_controlled(world, controller, unit)?;
    require_alive(world, unit)?;

    let button = ActionButton::unpack(data)?;

    // A possessed player can only be sent to melee
    if ctx.caps.is_player_controlled && button != ActionButton::command(CommandState::Attack) {
        return Err(ControlError::PlayerUnitRestricted(unit));
    }
    if ctx.caps.actions_disabled {
        return Err(ControlError::ActionsDisabled(unit));
    }
    require_profile(world, unit)?;

    debug!(
        "Pet action {:?}/{} for {:?} from {:?}",
        button.state, button.action, unit, controller
    );

    match button.state {
        ActiveState::Command => handle_command(world, &ctx, button.action, target).map(Outcome::Command),
        ActiveState::Reaction => handle_reaction(world, &ctx, button.action).map(Outcome::Reaction),
        ActiveState::Enabled | ActiveState::Disabled | ActiveState::Passive => {
            let ability = AbilityId(button.action);
            let request = CastRequest {
                ability,
                cast_count: 0,
                target,
                destination: None,
                entry: CastEntry::ActionBar,
            };
            run_cast_pipeline(world, &ctx, request).map(|result| Outcome::Cast { ability, result })
        }
        ActiveState::Decide => Err(ControlError::UnknownActionType {
            state: button.state as u8,
            action: button.action,
        }),
    }
}
