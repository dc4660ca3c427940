//! Action-Bar Model
//!
//! The fixed ten-slot bar a controller sees for a controlled unit, and the
//! packed button encoding the client uses for both the bar and pet actions.
//!
//! A packed button is `(state << 24) | identifier`: the top byte is the
//! [`ActiveState`], the low 24 bits a command code, reaction code, or
//! ability id.
//!
//! Command and reaction buttons can only ever be moved. The one legal way to
//! move them is a two-slot swap whose claimed prior content matches the
//! bar exactly; anything else is rejected before a single slot changes.

use smallvec::SmallVec;

use super::abilities::AbilityId;
use super::errors::ControlError;
use super::profile::{CommandState, ReactState};

/// Number of slots on a controlled unit's action bar.
pub const MAX_UNIT_ACTION_BAR_INDEX: usize = 10;

const ACTION_MASK: u32 = 0x00FF_FFFF;

/// Button state byte, the top byte of a packed button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActiveState {
    /// Custom explicit decision, never dispatched
    Decide = 0x00,
    /// Ability slot, autocast not applicable
    Passive = 0x01,
    /// Reaction button
    Reaction = 0x06,
    /// Command button
    Command = 0x07,
    /// Ability slot, autocast off
    Disabled = 0x81,
    /// Ability slot, autocast on
    Enabled = 0xC1,
}

impl ActiveState {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ActiveState::Decide),
            0x01 => Some(ActiveState::Passive),
            0x06 => Some(ActiveState::Reaction),
            0x07 => Some(ActiveState::Command),
            0x81 => Some(ActiveState::Disabled),
            0xC1 => Some(ActiveState::Enabled),
            _ => None,
        }
    }

    /// Command and reaction buttons: movable, never removable
    pub fn is_command_or_reaction(&self) -> bool {
        matches!(self, ActiveState::Command | ActiveState::Reaction)
    }

    /// States that carry an ability id
    pub fn is_ability(&self) -> bool {
        matches!(
            self,
            ActiveState::Passive | ActiveState::Disabled | ActiveState::Enabled
        )
    }
}

/// What a slot is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Command,
    Reaction,
    Ability,
}

/// One decoded button: identifier plus state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionButton {
    pub action: u32,
    pub state: ActiveState,
}

impl ActionButton {
    pub fn new(action: u32, state: ActiveState) -> Self {
        Self {
            action: action & ACTION_MASK,
            state,
        }
    }

    pub fn command(command: CommandState) -> Self {
        Self::new(command as u32, ActiveState::Command)
    }

    pub fn reaction(reaction: ReactState) -> Self {
        Self::new(reaction as u32, ActiveState::Reaction)
    }

    pub fn ability(ability: AbilityId, state: ActiveState) -> Self {
        Self::new(ability.0, state)
    }

    /// An ability slot holding nothing
    pub fn empty() -> Self {
        Self::new(0, ActiveState::Passive)
    }

    /// Decode a packed button.
    pub fn unpack(data: u32) -> Result<Self, ControlError> {
        let byte = ((data & !ACTION_MASK) >> 24) as u8;
        let action = data & ACTION_MASK;
        ActiveState::from_byte(byte)
            .map(|state| Self { action, state })
            .ok_or(ControlError::UnknownActionType { state: byte, action })
    }

    pub fn pack(&self) -> u32 {
        ((self.state as u32) << 24) | self.action
    }

    pub fn kind(&self) -> BindingKind {
        match self.state {
            ActiveState::Command => BindingKind::Command,
            ActiveState::Reaction => BindingKind::Reaction,
            _ => BindingKind::Ability,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_ability() && self.action == 0
    }

    /// The ability bound to this slot, if any
    pub fn ability_id(&self) -> Option<AbilityId> {
        (self.state.is_ability() && self.action != 0).then_some(AbilityId(self.action))
    }
}

/// One requested slot change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotUpdate {
    pub position: u32,
    pub button: ActionButton,
}

/// A set-action request: one update (set/clear) or two (swap).
pub type SlotUpdateBatch = SmallVec<[SlotUpdate; 2]>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionBar {
    slots: [ActionButton; MAX_UNIT_ACTION_BAR_INDEX],
}

impl Default for ActionBar {
    /// Standard companion layout: three commands, four ability slots,
    /// three reactions.
    fn default() -> Self {
        Self {
            slots: [
                ActionButton::command(CommandState::Attack),
                ActionButton::command(CommandState::Follow),
                ActionButton::command(CommandState::Stay),
                ActionButton::empty(),
                ActionButton::empty(),
                ActionButton::empty(),
                ActionButton::empty(),
                ActionButton::reaction(ReactState::Aggressive),
                ActionButton::reaction(ReactState::Defensive),
                ActionButton::reaction(ReactState::Passive),
            ],
        }
    }
}

impl ActionBar {
    /// Build a default bar and fill the ability slots in order.
    pub fn with_abilities(abilities: &[(AbilityId, ActiveState)]) -> Self {
        let mut bar = Self::default();
        let ability_slots = 3..7;
        for (position, (ability, state)) in ability_slots.zip(abilities.iter()) {
            bar.slots[position] = ActionButton::ability(*ability, *state);
        }
        bar
    }

    pub fn get(&self, position: u32) -> Option<&ActionButton> {
        self.slots.get(position as usize)
    }

    pub fn slots(&self) -> &[ActionButton] {
        &self.slots
    }

    /// Overwrite one slot. Callers validate through [`Self::check_updates`] first.
    pub fn set(&mut self, position: u32, button: ActionButton) -> bool {
        match self.slots.get_mut(position as usize) {
            Some(slot) => {
                *slot = button;
                true
            }
            None => false,
        }
    }

    /// Positions currently bound to the given ability
    pub fn positions_of(&self, ability: AbilityId) -> Vec<u32> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, b)| b.ability_id() == Some(ability))
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Flip every slot bound to `ability` between enabled and disabled.
    pub fn set_spell_autocast(&mut self, ability: AbilityId, enabled: bool) {
        let state = if enabled {
            ActiveState::Enabled
        } else {
            ActiveState::Disabled
        };
        for slot in self.slots.iter_mut() {
            if slot.ability_id() == Some(ability) {
                slot.state = state;
            }
        }
    }

    /// Validate a whole set-action batch. Nothing is applied here; an `Err`
    /// means the batch must be dropped in full.
    pub fn check_updates(&self, updates: &[SlotUpdate]) -> Result<(), ControlError> {
        if updates.is_empty() || updates.len() > 2 {
            return Err(ControlError::MalformedBatch(updates.len()));
        }

        let mut moves_command = false;
        for update in updates {
            if update.position as usize >= MAX_UNIT_ACTION_BAR_INDEX {
                return Err(ControlError::SlotOutOfRange(update.position));
            }
            // A lone update touching a command/reaction would remove it
            if update.button.state.is_command_or_reaction() {
                if updates.len() == 1 {
                    return Err(ControlError::CommandRemoval(update.position));
                }
                moves_command = true;
            }
        }

        // The client removes abilities in a separate request before a
        // command<->ability swap, so only the command side is checked.
        if moves_command {
            let (first, second) = (updates[0], updates[1]);
            if first.button.state.is_command_or_reaction()
                && self.get(second.position) != Some(&first.button)
            {
                return Err(ControlError::StaleSwap(second.position));
            }
            if second.button.state.is_command_or_reaction()
                && self.get(first.position) != Some(&second.button)
            {
                return Err(ControlError::StaleSwap(first.position));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_pack_unpack() {
        let packed = (0xC1u32 << 24) | 17253;
        let button = ActionButton::unpack(packed).unwrap();
        assert_eq!(button.state, ActiveState::Enabled);
        assert_eq!(button.action, 17253);
        assert_eq!(button.pack(), packed);
    }

    #[test]
    fn test_unpack_rejects_unknown_state_byte() {
        let err = ActionButton::unpack((0x05u32 << 24) | 2).unwrap_err();
        assert_eq!(err, ControlError::UnknownActionType { state: 0x05, action: 2 });
    }

    #[test]
    fn test_default_layout() {
        let bar = ActionBar::default();
        assert_eq!(bar.get(0).unwrap().kind(), BindingKind::Command);
        assert_eq!(bar.get(3).unwrap().kind(), BindingKind::Ability);
        assert!(bar.get(3).unwrap().is_empty());
        assert_eq!(bar.get(9).unwrap().kind(), BindingKind::Reaction);
        assert!(bar.get(10).is_none());
    }

    #[test]
    fn test_single_update_cannot_remove_command() {
        let bar = ActionBar::default();
        let updates: SlotUpdateBatch = smallvec![SlotUpdate {
            position: 0,
            button: ActionButton::command(CommandState::Attack),
        }];
        assert_eq!(bar.check_updates(&updates), Err(ControlError::CommandRemoval(0)));
    }

    #[test]
    fn test_swap_of_two_commands_is_accepted() {
        let bar = ActionBar::default();
        // Attack (slot 0) and Stay (slot 2) trade places
        let updates: SlotUpdateBatch = smallvec![
            SlotUpdate { position: 2, button: ActionButton::command(CommandState::Attack) },
            SlotUpdate { position: 0, button: ActionButton::command(CommandState::Stay) },
        ];
        assert_eq!(bar.check_updates(&updates), Ok(()));
    }

    #[test]
    fn test_swap_against_stale_bar_is_rejected() {
        let bar = ActionBar::default();
        // Client believes slot 2 holds Follow, it holds Stay
        let updates: SlotUpdateBatch = smallvec![
            SlotUpdate { position: 2, button: ActionButton::command(CommandState::Attack) },
            SlotUpdate { position: 0, button: ActionButton::command(CommandState::Follow) },
        ];
        assert_eq!(bar.check_updates(&updates), Err(ControlError::StaleSwap(2)));
    }

    #[test]
    fn test_out_of_range_slot() {
        let bar = ActionBar::default();
        let updates: SlotUpdateBatch = smallvec![SlotUpdate {
            position: 10,
            button: ActionButton::empty(),
        }];
        assert_eq!(bar.check_updates(&updates), Err(ControlError::SlotOutOfRange(10)));
    }

    #[test]
    fn test_autocast_flips_bound_slots() {
        let mut bar = ActionBar::with_abilities(&[(AbilityId(17253), ActiveState::Disabled)]);
        bar.set_spell_autocast(AbilityId(17253), true);
        assert_eq!(bar.get(3).unwrap().state, ActiveState::Enabled);
        assert_eq!(bar.positions_of(AbilityId(17253)), vec![3]);
    }
}
