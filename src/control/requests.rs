//! Inbound control requests
//!
//! One event type carries every request a controller can send about a unit
//! it commands. Framing and deserialization happen before this point; ids
//! arrive as entities, button data still packed.

use bevy::prelude::*;

use super::abilities::AbilityId;
use super::action_bar::SlotUpdateBatch;
use super::components::{DeclinedNames, MAX_DECLINED_NAME_CASES};

/// Target data chosen by the client for a correlated cast.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CastTargets {
    pub unit: Option<Entity>,
    pub destination: Option<Vec3>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestKind {
    /// Action-bar button press: command, reaction, or ability
    PetAction {
        pet: Entity,
        /// Packed button (state byte + identifier)
        data: u32,
        target: Option<Entity>,
    },
    StopAttack {
        pet: Entity,
    },
    SetAction {
        pet: Entity,
        updates: SlotUpdateBatch,
    },
    SetSpellAutocast {
        pet: Entity,
        ability: AbilityId,
        enabled: bool,
    },
    /// Client-correlated cast with client-chosen targets
    CastSpell {
        pet: Entity,
        cast_count: u8,
        ability: AbilityId,
        targets: CastTargets,
    },
    Abandon {
        pet: Entity,
    },
    NameQuery {
        pet: Entity,
        pet_number: u32,
    },
    Rename {
        pet: Entity,
        name: String,
        declined: Option<DeclinedNames>,
    },
    UnlearnTalents {
        pet: Entity,
    },
    LearnTalent {
        pet: Entity,
        talent_id: u32,
        rank: u32,
    },
    LearnPreviewTalents {
        pet: Entity,
        talents: Vec<(u32, u32)>,
    },
}

impl RequestKind {
    /// Short label used by the outcome log
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::PetAction { .. } => "PetAction",
            RequestKind::StopAttack { .. } => "StopAttack",
            RequestKind::SetAction { .. } => "SetAction",
            RequestKind::SetSpellAutocast { .. } => "SetSpellAutocast",
            RequestKind::CastSpell { .. } => "CastSpell",
            RequestKind::Abandon { .. } => "Abandon",
            RequestKind::NameQuery { .. } => "NameQuery",
            RequestKind::Rename { .. } => "Rename",
            RequestKind::UnlearnTalents { .. } => "UnlearnTalents",
            RequestKind::LearnTalent { .. } => "LearnTalent",
            RequestKind::LearnPreviewTalents { .. } => "LearnPreviewTalents",
        }
    }

    /// The unit the request is about
    pub fn pet(&self) -> Entity {
        match self {
            RequestKind::PetAction { pet, .. }
            | RequestKind::StopAttack { pet }
            | RequestKind::SetAction { pet, .. }
            | RequestKind::SetSpellAutocast { pet, .. }
            | RequestKind::CastSpell { pet, .. }
            | RequestKind::Abandon { pet }
            | RequestKind::NameQuery { pet, .. }
            | RequestKind::Rename { pet, .. }
            | RequestKind::UnlearnTalents { pet }
            | RequestKind::LearnTalent { pet, .. }
            | RequestKind::LearnPreviewTalents { pet, .. } => *pet,
        }
    }
}

/// A request from a controller, processed in arrival order.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct ControlRequest {
    pub controller: Entity,
    pub kind: RequestKind,
}

impl ControlRequest {
    pub fn new(controller: Entity, kind: RequestKind) -> Self {
        Self { controller, kind }
    }
}

/// Build declined names from exactly five strings.
pub fn declined_names_from(cases: Vec<String>) -> Option<DeclinedNames> {
    let cases: [String; MAX_DECLINED_NAME_CASES] = cases.try_into().ok()?;
    Some(DeclinedNames { cases })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declined_names_need_five_cases() {
        assert!(declined_names_from(vec!["a".into(); 4]).is_none());
        let names = declined_names_from(vec!["a".into(); 5]).unwrap();
        assert_eq!(names.cases.len(), MAX_DECLINED_NAME_CASES);
    }

    #[test]
    fn test_request_pet_accessor() {
        let pet = Entity::from_raw(11);
        let kind = RequestKind::NameQuery { pet, pet_number: 4 };
        assert_eq!(kind.pet(), pet);
        assert_eq!(kind.label(), "NameQuery");
    }
}
