//! Outbound notices
//!
//! Everything the control handlers tell the outside world: feedback for the
//! controlling player, and hand-offs to the collaborators that own
//! persistence, talents, and ability resolution.

use bevy::prelude::*;
use serde::Serialize;

use super::abilities::AbilityId;
use super::components::DeclinedNames;
use super::engine::{CastFailure, PendingCast};

// ============================================================================
// Controller feedback
// ============================================================================

/// A cast the controller asked for did not happen.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct CastResultNotice {
    pub recipient: Entity,
    pub ability: AbilityId,
    pub cast_count: u8,
    pub failure: CastFailure,
    /// Failure of the unit's cast, not the recipient's own
    pub pet_cast: bool,
}

/// Tells the client to drop the cooldown it displayed optimistically.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct CooldownClearNotice {
    pub recipient: Entity,
    pub ability: AbilityId,
    pub unit: Entity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PetTalk {
    Attack,
}

/// Audible cue from a summoned companion.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct PetTalkNotice {
    pub pet: Entity,
    pub talk: PetTalk,
}

/// The unit's combat driver took a new target (client plays the growl).
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct AiReactionNotice {
    pub pet: Entity,
}

/// `unit` changed facing; `observer` needs a fresh update of it.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct FacingUpdateNotice {
    pub unit: Entity,
    pub observer: Entity,
}

#[derive(Event, Clone, Debug, PartialEq)]
pub struct NameQueryResponse {
    pub recipient: Entity,
    pub pet_number: u32,
    /// `None` answers a query for an unknown or mismatched companion
    pub name: Option<String>,
    pub name_timestamp: u64,
    pub declined: Option<DeclinedNames>,
}

/// Why a proposed pet name was refused. Values follow the client's codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum PetNameInvalidReason {
    Invalid = 1,
    NoName = 2,
    TooShort = 3,
    TooLong = 4,
    MixedLanguages = 6,
    Reserved = 8,
    ThreeConsecutive = 11,
    DeclensionDoesntMatchBaseName = 16,
}

#[derive(Event, Clone, Debug, PartialEq)]
pub struct PetNameInvalidNotice {
    pub recipient: Entity,
    pub reason: PetNameInvalidReason,
    pub name: String,
    pub declined: Option<DeclinedNames>,
}

/// Controller's talent pane needs refreshing.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct TalentsInfoNotice {
    pub recipient: Entity,
}

// ============================================================================
// Collaborator hand-offs
// ============================================================================

/// A validated cast handed to the ability-resolution engine.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct AbilityStarted {
    pub cast: PendingCast,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PetSaveMode {
    /// Gone for good; the stored companion is deleted
    AsDeleted,
}

#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct PetUnsummoned {
    pub pet: Entity,
    pub owner: Entity,
    pub save_mode: PetSaveMode,
}

/// Control of a charmed unit ended; it returns to its prior behaviour.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct CharmReleased {
    pub unit: Entity,
    pub former_controller: Entity,
}

/// Rename record for the persistence layer.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct PetRenamed {
    pub owner: Entity,
    pub pet: Entity,
    pub pet_number: u32,
    pub name: String,
    pub declined: Option<DeclinedNames>,
}

#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct PetTalentReset {
    pub owner: Entity,
    pub pet: Entity,
}

#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct PetTalentLearn {
    pub owner: Entity,
    pub pet: Entity,
    pub talent_id: u32,
    pub rank: u32,
}
