//! Integration tests for pet-action dispatch and the command/reaction
//! state machines
//!
//! These tests verify that:
//! - Requests from anyone but the registered controller are dropped untouched
//! - Stay, Follow, and Attack leave the unit in the documented state
//! - Passive halts the attack and re-issues Follow unless the unit stays
//! - Abandon differs for tamed companions, summons, charms, and temporary summons

mod common;

use bevy::prelude::*;
use common::*;

use petcontrol::control::action_bar::ActionButton;
use petcontrol::control::action_bar::ActiveState;
use petcontrol::control::components::{
    ActiveAuras, Aura, AuraType, CombatAi, DeathState, MotionMaster, MotionPolicy, Pet, PetModeFlags, PetType, Spellbook, Unit,
};
use petcontrol::control::notices::{AiReactionNotice, CharmReleased, PetSaveMode, PetTalkNotice, PetUnsummoned};
use petcontrol::control::profile::{CommandState, ControlProfile, ReactState};
use petcontrol::control::spawn::{charm_unit, possess_player, spawn_creature, spawn_player};
use petcontrol::control::{ControlError, ControlLog, ControlLogEventType, GameRng, Outcome, RequestKind};
use petcontrol::settings::ControlSettings;

fn profile(world: &World, unit: Entity) -> &ControlProfile {
    world.get::<ControlProfile>(unit).unwrap()
}

// ============================================================================
// Ownership and liveness
// ============================================================================

#[test]
fn test_wrong_controller_is_dropped_without_effect() {
    let Arena {
        mut world, pet, boar, ..
    } = arena();
    let stranger = spawn_player(&mut world, "Stranger", 1, Vec3::new(5.0, 0.0, 0.0));

    let before = profile(&world, pet).clone();
    let result = press(&mut world, stranger, pet, ActionButton::command(CommandState::Stay), None);
    assert_eq!(
        result,
        Err(ControlError::NotController {
            unit: pet,
            controller: stranger
        })
    );

    let after = profile(&world, pet);
    assert_eq!(after.command_state, before.command_state);
    assert_eq!(after.stay_position, None);
    assert!(!after.retreating);

    // A cast from the stranger doesn't reach the engine either
    let result = press(
        &mut world,
        stranger,
        pet,
        ActionButton::ability(BITE, ActiveState::Enabled),
        Some(boar),
    );
    assert!(result.is_err());
    assert!(!world.get::<Spellbook>(pet).unwrap().has_cooldown(BITE));

    let log = world.resource::<ControlLog>();
    assert_eq!(log.count(ControlLogEventType::Dropped), 2);
}

#[test]
fn test_unknown_unit_is_dropped() {
    let Arena { mut world, owner, .. } = arena();
    let missing = world.spawn_empty().id();
    let result = press(&mut world, owner, missing, ActionButton::command(CommandState::Follow), None);
    assert_eq!(result, Err(ControlError::UnknownUnit(missing)));
}

#[test]
fn test_dead_unit_ignores_pet_actions() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    world.get_mut::<Unit>(pet).unwrap().death_state = DeathState::Dead;

    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Stay), None);
    assert_eq!(result, Err(ControlError::UnitDead(pet)));
    assert_eq!(profile(&world, pet).command_state, CommandState::Follow);
}

#[test]
fn test_unknown_state_byte_is_a_protocol_violation() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    let result = send(
        &mut world,
        owner,
        RequestKind::PetAction {
            pet,
            data: (0x05 << 24) | 1,
            target: None,
        },
    );
    assert_eq!(result, Err(ControlError::UnknownActionType { state: 0x05, action: 1 }));
}

#[test]
fn test_unknown_command_code_is_dropped() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    let button = ActionButton::new(9, ActiveState::Command);
    let result = press(&mut world, owner, pet, button, None);
    assert_eq!(result, Err(ControlError::UnknownCommand(9)));
}

// ============================================================================
// Movement commands
// ============================================================================

#[test]
fn test_stay_then_follow() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();

    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Stay), None);
    assert_eq!(result, Ok(Outcome::Command(CommandState::Stay)));
    {
        let p = profile(&world, pet);
        assert_eq!(p.command_state, CommandState::Stay);
        assert_eq!(p.stay_position, Some(Vec3::new(1.0, 0.0, 0.0)));
        assert!(p.retreating);
    }
    assert_eq!(world.get::<MotionMaster>(pet).unwrap().current(), MotionPolicy::Idle);

    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Follow), None);
    assert_eq!(result, Ok(Outcome::Command(CommandState::Follow)));
    let p = profile(&world, pet);
    assert_eq!(p.command_state, CommandState::Follow);
    assert_eq!(p.stay_position, None);

    let settings = ControlSettings::default();
    assert_eq!(
        world.get::<MotionMaster>(pet).unwrap().current(),
        MotionPolicy::Follow {
            target: owner,
            distance: settings.follow_distance,
            angle: settings.follow_angle,
        }
    );
}

#[test]
fn test_stay_halts_current_attack() {
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena();
    press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar)).unwrap();
    assert_eq!(world.get::<Unit>(pet).unwrap().victim, Some(boar));

    press(&mut world, owner, pet, ActionButton::command(CommandState::Stay), None).unwrap();
    assert_eq!(world.get::<Unit>(pet).unwrap().victim, None);
    assert_eq!(world.get::<CombatAi>(pet).unwrap().engaged, None);
}

#[test]
fn test_attack_hands_unit_to_combat_driver() {
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena();
    profile_set_opener(&mut world, pet);

    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar));
    assert_eq!(result, Ok(Outcome::Command(CommandState::Attack)));

    assert_eq!(world.get::<Unit>(pet).unwrap().victim, Some(boar));
    assert_eq!(world.get::<CombatAi>(pet).unwrap().engaged, Some(boar));
    assert_eq!(world.get::<Unit>(owner).unwrap().in_combat_with, Some(boar));
    assert_eq!(sent::<AiReactionNotice>(&world), vec![AiReactionNotice { pet }]);

    let p = profile(&world, pet);
    assert!(p.retreating);
    assert_eq!(p.spell_opener, None);
    // Attack leaves the movement command alone
    assert_eq!(p.command_state, CommandState::Follow);
}

fn profile_set_opener(world: &mut World, pet: Entity) {
    world
        .get_mut::<ControlProfile>(pet)
        .unwrap()
        .set_opener(BITE, 0.0, 5.0);
}

#[test]
fn test_attack_on_friendly_target_is_refused() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    let ally = spawn_player(&mut world, "Ally", 1, Vec3::new(3.0, 0.0, 0.0));

    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(ally));
    assert_eq!(result, Err(ControlError::InvalidAttackTarget));
    assert_eq!(world.get::<Unit>(pet).unwrap().victim, None);

    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), None);
    assert_eq!(result, Err(ControlError::InvalidAttackTarget));
}

#[test]
fn test_tamed_companion_never_talks() {
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena();
    world.insert_resource(ControlSettings {
        attack_talk_chance: 1.0,
        ..default()
    });
    press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar)).unwrap();
    assert!(sent::<PetTalkNotice>(&world).is_empty());
}

#[test]
fn test_summoned_companion_talk_roll() {
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena_with(PetType::Summon, &[FIREBOLT]);
    world.insert_resource(ControlSettings {
        attack_talk_chance: 1.0,
        ..default()
    });
    press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar)).unwrap();
    assert_eq!(sent::<PetTalkNotice>(&world).len(), 1);

    // Never talks at zero chance, whatever the rng says
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena_with(PetType::Summon, &[FIREBOLT]);
    world.insert_resource(ControlSettings {
        attack_talk_chance: 0.0,
        ..default()
    });
    world.insert_resource(GameRng::from_seed(99));
    press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar)).unwrap();
    assert!(sent::<PetTalkNotice>(&world).is_empty());
}

#[test]
fn test_unit_without_combat_driver_engages_directly() {
    let mut world = control_world();
    let owner = spawn_player(&mut world, "Rexxar", 1, Vec3::ZERO);
    let victim = spawn_player(&mut world, "Victim", 1, Vec3::new(2.0, 0.0, 0.0));
    let enemy = spawn_creature(&mut world, "Boar", 2, Vec3::new(4.0, 0.0, 0.0), &[], false);
    possess_player(&mut world, victim, owner);

    let result = press(&mut world, owner, victim, ActionButton::command(CommandState::Attack), Some(enemy));
    assert_eq!(result, Ok(Outcome::Command(CommandState::Attack)));
    assert_eq!(
        world.get::<MotionMaster>(victim).unwrap().current(),
        MotionPolicy::Chase { target: enemy }
    );
    assert!(sent::<AiReactionNotice>(&world).is_empty());
}

#[test]
fn test_possessed_player_only_accepts_attack() {
    let mut world = control_world();
    let owner = spawn_player(&mut world, "Rexxar", 1, Vec3::ZERO);
    let victim = spawn_player(&mut world, "Victim", 2, Vec3::new(2.0, 0.0, 0.0));
    possess_player(&mut world, victim, owner);

    for button in [
        ActionButton::command(CommandState::Stay),
        ActionButton::command(CommandState::Follow),
        ActionButton::reaction(ReactState::Passive),
        ActionButton::ability(BITE, ActiveState::Enabled),
    ] {
        let result = press(&mut world, owner, victim, button, None);
        assert_eq!(result, Err(ControlError::PlayerUnitRestricted(victim)));
    }
    assert_eq!(profile(&world, victim).command_state, CommandState::Follow);
}

#[test]
fn test_possession_keeps_existing_auras() {
    let mut world = control_world();
    let owner = spawn_player(&mut world, "Rexxar", 1, Vec3::ZERO);
    let victim = spawn_player(&mut world, "Victim", 2, Vec3::new(2.0, 0.0, 0.0));
    world.entity_mut(victim).insert(ActiveAuras {
        auras: vec![Aura::new(AuraType::Stun)],
    });
    possess_player(&mut world, victim, owner);

    let auras = world.get::<ActiveAuras>(victim).unwrap();
    assert!(auras.has(AuraType::Stun));
    assert!(auras.has(AuraType::Possess));
}

// ============================================================================
// Reactions
// ============================================================================

#[test]
fn test_passive_halts_attack_and_resumes_follow() {
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena();
    press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar)).unwrap();
    profile_set_opener(&mut world, pet);

    let result = press(&mut world, owner, pet, ActionButton::reaction(ReactState::Passive), None);
    assert_eq!(result, Ok(Outcome::Reaction(ReactState::Passive)));
    assert_eq!(world.get::<Unit>(pet).unwrap().victim, None);
    assert!(matches!(
        world.get::<MotionMaster>(pet).unwrap().current(),
        MotionPolicy::Follow { target, .. } if target == owner
    ));
    let p = profile(&world, pet);
    assert_eq!(p.reaction_state, ReactState::Passive);
    assert_eq!(p.spell_opener, None);
}

#[test]
fn test_passive_while_staying_keeps_position() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    press(&mut world, owner, pet, ActionButton::command(CommandState::Stay), None).unwrap();

    press(&mut world, owner, pet, ActionButton::reaction(ReactState::Passive), None).unwrap();
    assert_eq!(world.get::<MotionMaster>(pet).unwrap().current(), MotionPolicy::Idle);
    assert_eq!(profile(&world, pet).reaction_state, ReactState::Passive);
}

#[test]
fn test_aggressive_is_a_pure_state_write() {
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena();
    press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar)).unwrap();

    press(&mut world, owner, pet, ActionButton::reaction(ReactState::Aggressive), None).unwrap();
    assert_eq!(profile(&world, pet).reaction_state, ReactState::Aggressive);
    assert_eq!(world.get::<Unit>(pet).unwrap().victim, Some(boar));
}

// ============================================================================
// Abandon
// ============================================================================

#[test]
fn test_abandon_deletes_tamed_companion() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Abandon), None);
    assert_eq!(result, Ok(Outcome::Command(CommandState::Abandon)));
    assert!(world.get_entity(pet).is_err());
    assert_eq!(
        sent::<PetUnsummoned>(&world),
        vec![PetUnsummoned {
            pet,
            owner,
            save_mode: PetSaveMode::AsDeleted
        }]
    );
}

#[test]
fn test_abandon_kills_summoned_companion() {
    let Arena {
        mut world, owner, pet, ..
    } = arena_with(PetType::Summon, &[FIREBOLT]);
    press(&mut world, owner, pet, ActionButton::command(CommandState::Abandon), None).unwrap();

    let unit = world.get::<Unit>(pet).unwrap();
    assert_eq!(unit.death_state, DeathState::Corpse);
    assert!(sent::<PetUnsummoned>(&world).is_empty());

    // Control ends with the death
    assert!(world.get::<ControlProfile>(pet).is_none());
    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Follow), None);
    assert!(matches!(result, Err(ControlError::NotController { .. })));
    let result = send(&mut world, owner, RequestKind::NameQuery { pet, pet_number: 1 });
    assert_eq!(result, Ok(Outcome::NameAnswered { found: false }));
}

#[test]
fn test_abandon_releases_charm() {
    let mut world = control_world();
    let owner = spawn_player(&mut world, "Rexxar", 1, Vec3::ZERO);
    let kobold = spawn_creature(&mut world, "Kobold", 2, Vec3::new(2.0, 0.0, 0.0), &[FIREBOLT], true);
    charm_unit(&mut world, kobold, owner, false);
    assert_eq!(world.get::<Unit>(kobold).unwrap().team, 1);

    press(&mut world, owner, kobold, ActionButton::command(CommandState::Abandon), None).unwrap();
    assert!(world.get::<ControlProfile>(kobold).is_none());
    assert_eq!(world.get::<Unit>(kobold).unwrap().team, 2);
    assert_eq!(
        sent::<CharmReleased>(&world),
        vec![CharmReleased {
            unit: kobold,
            former_controller: owner
        }]
    );

    // Control is gone, so the former controller is refused from now on
    let result = press(&mut world, owner, kobold, ActionButton::command(CommandState::Stay), None);
    assert!(matches!(result, Err(ControlError::NotController { .. })));
}

#[test]
fn test_abandon_despawns_temporary_summon() {
    let mut world = control_world();
    let owner = spawn_player(&mut world, "Rexxar", 1, Vec3::ZERO);
    let totem = spawn_creature(&mut world, "Eye", 2, Vec3::new(2.0, 0.0, 0.0), &[], false);
    charm_unit(&mut world, totem, owner, true);

    press(&mut world, owner, totem, ActionButton::command(CommandState::Abandon), None).unwrap();
    assert!(world.get_entity(totem).is_err());
}

#[test]
fn test_standalone_abandon_unsummons_companion() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    let result = send(&mut world, owner, RequestKind::Abandon { pet });
    assert_eq!(result, Ok(Outcome::Abandoned));
    assert!(world.get_entity(pet).is_err());
    assert_eq!(sent::<PetUnsummoned>(&world).len(), 1);
}

#[test]
fn test_disabled_action_bar_drops_actions() {
    let Arena {
        mut world, owner, pet, ..
    } = arena();
    world
        .get_mut::<Pet>(pet)
        .unwrap()
        .mode_flags
        .insert(PetModeFlags::DISABLE_ACTIONS);

    let result = press(&mut world, owner, pet, ActionButton::command(CommandState::Stay), None);
    assert_eq!(result, Err(ControlError::ActionsDisabled(pet)));
    assert_eq!(profile(&world, pet).stay_position, None);
}

#[test]
fn test_stop_attack() {
    let Arena {
        mut world,
        owner,
        pet,
        boar,
    } = arena();
    press(&mut world, owner, pet, ActionButton::command(CommandState::Attack), Some(boar)).unwrap();

    let result = send(&mut world, owner, RequestKind::StopAttack { pet });
    assert_eq!(result, Ok(Outcome::AttackStopped));
    assert_eq!(world.get::<Unit>(pet).unwrap().victim, None);
    assert_eq!(world.get::<CombatAi>(pet).unwrap().engaged, None);
}
