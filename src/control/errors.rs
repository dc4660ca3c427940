//! Control request errors
//!
//! Every way a request can be dropped without reaching a reported outcome.
//! The [`ErrorClass`] of an error decides how loudly it is logged; none of
//! them ever reaches the session or the world update as a failure.

use bevy::prelude::*;
use thiserror::Error;

use super::abilities::AbilityId;

/// How an error is treated by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The client produced something it never should have. Logged, no feedback.
    ProtocolViolation,
    /// Normal latency races (client-side prediction). Not logged.
    ExpectedRace,
    /// Legitimate refusals the client is not told about. Debug log only.
    Refused,
    /// A defect elsewhere in unit lifecycle. Logged as an error.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("unit {0:?} does not exist")]
    UnknownUnit(Entity),
    #[error("unit {unit:?} is not controlled by {controller:?}")]
    NotController { unit: Entity, controller: Entity },
    #[error("unit {0:?} is not alive")]
    UnitDead(Entity),
    #[error("player unit {0:?} only accepts the attack command")]
    PlayerUnitRestricted(Entity),
    #[error("action bar of {0:?} is disabled")]
    ActionsDisabled(Entity),
    #[error("unknown action type {state:#04x} (identifier {action})")]
    UnknownActionType { state: u8, action: u32 },
    #[error("unknown command {0}")]
    UnknownCommand(u32),
    #[error("unknown reaction {0}")]
    UnknownReaction(u32),
    #[error("unknown ability {0}")]
    UnknownAbility(AbilityId),
    #[error("global cooldown is active for {0:?}")]
    GlobalCooldown(Entity),
    #[error("area ability {0} refused for controlled units")]
    AreaAbilityRefused(AbilityId),
    #[error("ability {0} is not learned or is passive")]
    AbilityNotUsable(AbilityId),
    #[error("attack target is missing or friendly")]
    InvalidAttackTarget,
    #[error("action bar slot {0} is out of range")]
    SlotOutOfRange(u32),
    #[error("command or reaction in slot {0} cannot be removed")]
    CommandRemoval(u32),
    #[error("swap does not match the current content of slot {0}")]
    StaleSwap(u32),
    #[error("action bar update carries {0} entries")]
    MalformedBatch(usize),
    #[error("rename of {0:?} is not permitted")]
    RenameNotPermitted(Entity),
    #[error("{0:?} has no talents to reset")]
    NoTalentsToReset(Entity),
    #[error("unit {0:?} has no control profile")]
    MissingProfile(Entity),
}

impl ControlError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ControlError::UnknownUnit(_)
            | ControlError::NotController { .. }
            | ControlError::UnknownActionType { .. }
            | ControlError::UnknownCommand(_)
            | ControlError::UnknownReaction(_)
            | ControlError::UnknownAbility(_)
            | ControlError::SlotOutOfRange(_)
            | ControlError::CommandRemoval(_)
            | ControlError::StaleSwap(_)
            | ControlError::MalformedBatch(_) => ErrorClass::ProtocolViolation,
            ControlError::GlobalCooldown(_) => ErrorClass::ExpectedRace,
            ControlError::UnitDead(_)
            | ControlError::PlayerUnitRestricted(_)
            | ControlError::ActionsDisabled(_)
            | ControlError::AreaAbilityRefused(_)
            | ControlError::AbilityNotUsable(_)
            | ControlError::InvalidAttackTarget
            | ControlError::RenameNotPermitted(_)
            | ControlError::NoTalentsToReset(_) => ErrorClass::Refused,
            ControlError::MissingProfile(_) => ErrorClass::Internal,
        }
    }
}

/// Log a dropped request according to its class.
pub fn log_dropped(controller: Entity, error: &ControlError) {
    match error.class() {
        ErrorClass::ProtocolViolation => {
            warn!("Protocol violation from {:?}: {}", controller, error)
        }
        ErrorClass::ExpectedRace => {}
        ErrorClass::Refused => debug!("Request from {:?} refused: {}", controller, error),
        ErrorClass::Internal => error!("Control request from {:?} dropped: {}", controller, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let e = Entity::from_raw(7);
        assert_eq!(ControlError::UnknownCommand(9).class(), ErrorClass::ProtocolViolation);
        assert_eq!(ControlError::GlobalCooldown(e).class(), ErrorClass::ExpectedRace);
        assert_eq!(ControlError::AbilityNotUsable(AbilityId(1)).class(), ErrorClass::Refused);
        assert_eq!(ControlError::MissingProfile(e).class(), ErrorClass::Internal);
    }

    #[test]
    fn test_error_messages_name_the_identifier() {
        let msg = ControlError::UnknownAbility(AbilityId(4242)).to_string();
        assert!(msg.contains("4242"));
        let msg = ControlError::UnknownActionType { state: 0x05, action: 3 }.to_string();
        assert!(msg.contains("0x05"));
    }
}
