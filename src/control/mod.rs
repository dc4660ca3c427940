//! Pet control
//!
//! Server-side authority over units a player commands: tamed companions,
//! charmed creatures, and possessed players.
//!
//! ## Module Structure
//!
//! - `requests`: inbound `ControlRequest` events
//! - `dispatch`: ownership checks and pet-action routing
//! - `commands` / `reaction`: the movement-command and reaction state machines
//! - `cast`: the cast validation pipeline, on top of the `engine` seam
//! - `action_bar` / `profile`: per-unit control state
//! - `handlers` / `naming`: the remaining request kinds
//! - `notices`: everything sent back out
//!
//! Requests are drained by one exclusive system and run to completion in
//! arrival order, so a request always sees every effect of the one before it.

pub mod abilities;
pub mod ability_config;
pub mod action_bar;
pub mod cast;
pub mod commands;
pub mod components;
pub mod dispatch;
pub mod engage;
pub mod engine;
pub mod errors;
pub mod geometry;
pub mod handlers;
pub mod log;
pub mod naming;
pub mod notices;
pub mod profile;
pub mod reaction;
pub mod requests;
pub mod rng;
pub mod spawn;

use bevy::prelude::*;

use crate::settings::ControlSettings;

pub use abilities::AbilityId;
pub use ability_config::AbilityDefinitions;
pub use cast::CastOutcome;
pub use dispatch::Outcome;
pub use engine::{AbilityEngine, AbilityResolver, CastFailure, PendingCast};
pub use errors::{ControlError, ErrorClass};
pub use self::log::{ControlLog, ControlLogEventType};
pub use requests::{ControlRequest, RequestKind};
pub use rng::GameRng;

use components::Spellbook;
use dispatch::handle_pet_action;
use errors::log_dropped;
use geometry::LineOfSight;
use handlers::{
    handle_abandon, handle_cast_spell, handle_learn_talents, handle_set_action, handle_set_spell_autocast,
    handle_stop_attack, handle_unlearn_talents,
};
use naming::{handle_name_query, handle_rename};
use notices::*;
use profile::ControlProfile;

/// System sets for control processing, run in order each update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlSystemPhase {
    /// Cooldowns and the log clock advance
    Timers,
    /// Queued requests are dispatched
    Requests,
}

#[derive(Default)]
pub struct PetControlPlugin {
    /// Seed for deterministic talk rolls
    pub seed: Option<u64>,
}

impl Plugin for PetControlPlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => GameRng::from_entropy(),
        };

        app.add_event::<ControlRequest>()
            .add_event::<CastResultNotice>()
            .add_event::<CooldownClearNotice>()
            .add_event::<PetTalkNotice>()
            .add_event::<AiReactionNotice>()
            .add_event::<FacingUpdateNotice>()
            .add_event::<NameQueryResponse>()
            .add_event::<PetNameInvalidNotice>()
            .add_event::<TalentsInfoNotice>()
            .add_event::<AbilityStarted>()
            .add_event::<PetUnsummoned>()
            .add_event::<CharmReleased>()
            .add_event::<PetRenamed>()
            .add_event::<PetTalentReset>()
            .add_event::<PetTalentLearn>()
            .insert_resource(rng)
            .init_resource::<AbilityDefinitions>()
            .init_resource::<AbilityEngine>()
            .init_resource::<ControlSettings>()
            .init_resource::<ControlLog>()
            .init_resource::<LineOfSight>();

        app.configure_sets(
            Update,
            (ControlSystemPhase::Timers, ControlSystemPhase::Requests).chain(),
        )
        .add_systems(
            Update,
            (tick_cooldowns, self::log::track_log_time).in_set(ControlSystemPhase::Timers),
        )
        .add_systems(
            Update,
            process_control_requests.in_set(ControlSystemPhase::Requests),
        );
    }
}

/// Count down ability cooldowns and global cooldowns.
pub fn tick_cooldowns(
    time: Res<Time>,
    mut spellbooks: Query<&mut Spellbook>,
    mut profiles: Query<&mut ControlProfile>,
) {
    let dt = time.delta_secs();
    for mut book in spellbooks.iter_mut() {
        if !book.cooldowns.is_empty() {
            book.tick(dt);
        }
    }
    for mut profile in profiles.iter_mut() {
        if profile.global_cooldown.is_active() {
            profile.global_cooldown.tick(dt);
        }
    }
}

/// Route one request to its handler.
pub fn dispatch_request(world: &mut World, request: &ControlRequest) -> Result<Outcome, ControlError> {
    let controller = request.controller;
    match &request.kind {
        RequestKind::PetAction { pet, data, target } => handle_pet_action(world, controller, *pet, *data, *target),
        RequestKind::StopAttack { pet } => handle_stop_attack(world, controller, *pet),
        RequestKind::SetAction { pet, updates } => handle_set_action(world, controller, *pet, updates),
        RequestKind::SetSpellAutocast { pet, ability, enabled } => {
            handle_set_spell_autocast(world, controller, *pet, *ability, *enabled)
        }
        RequestKind::CastSpell {
            pet,
            cast_count,
            ability,
            targets,
        } => handle_cast_spell(world, controller, *pet, *cast_count, *ability, *targets),
        RequestKind::Abandon { pet } => handle_abandon(world, controller, *pet),
        RequestKind::NameQuery { pet, pet_number } => Ok(handle_name_query(world, controller, *pet, *pet_number)),
        RequestKind::Rename { pet, name, declined } => {
            handle_rename(world, controller, *pet, name.clone(), declined.clone())
        }
        RequestKind::UnlearnTalents { pet } => handle_unlearn_talents(world, controller, *pet),
        RequestKind::LearnTalent { pet, talent_id, rank } => {
            handle_learn_talents(world, controller, *pet, &[(*talent_id, *rank)])
        }
        RequestKind::LearnPreviewTalents { pet, talents } => handle_learn_talents(world, controller, *pet, talents),
    }
}

/// Dispatch one request and record its outcome in the control log. Errors
/// are logged by class and recorded as dropped.
pub fn apply_request(world: &mut World, request: &ControlRequest) -> Result<Outcome, ControlError> {
    let result = dispatch_request(world, request);
    let (event_type, message) = match &result {
        Ok(outcome) => outcome.log_entry(),
        Err(error) => {
            log_dropped(request.controller, error);
            (ControlLogEventType::Dropped, format!("{}: {}", request.kind.label(), error))
        }
    };
    if let Some(mut log) = world.get_resource_mut::<ControlLog>() {
        log.log(event_type, message);
    }
    result
}

/// Drain queued requests and run each to completion in arrival order.
pub fn process_control_requests(world: &mut World) {
    let requests: Vec<ControlRequest> = match world.get_resource_mut::<Events<ControlRequest>>() {
        Some(mut events) => events.drain().collect(),
        None => return,
    };
    for request in &requests {
        // The outcome is already logged
        let _ = apply_request(world, request);
    }
}
