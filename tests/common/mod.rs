//! Shared fixtures for the integration tests
#![allow(dead_code)]

use bevy::prelude::*;

use petcontrol::control::abilities::AbilityId;
use petcontrol::control::ability_config::{load_ability_definitions, ABILITIES_CONFIG_PATH};
use petcontrol::control::action_bar::ActionButton;
use petcontrol::control::components::PetType;
use petcontrol::control::spawn::{init_control_world, spawn_companion, spawn_creature, spawn_player};
use petcontrol::control::{apply_request, ControlError, ControlRequest, Outcome, RequestKind};

pub const BITE: AbilityId = AbilityId(17253);
pub const CLAW: AbilityId = AbilityId(16827);
pub const COWER: AbilityId = AbilityId(1742);
pub const LIGHTNING_BREATH: AbilityId = AbilityId(24844);
pub const CHARGE: AbilityId = AbilityId(7371);
pub const FIREBOLT: AbilityId = AbilityId(3110);
pub const THUNDERSTOMP: AbilityId = AbilityId(63900);
pub const MEND: AbilityId = AbilityId(54044);
pub const GREAT_STAMINA: AbilityId = AbilityId(4187);

/// A hunter, their companion, and a hostile boar three yards in front of
/// the companion.
pub struct Arena {
    pub world: World,
    pub owner: Entity,
    pub pet: Entity,
    pub boar: Entity,
}

pub fn control_world() -> World {
    let mut world = World::new();
    let definitions = load_ability_definitions(ABILITIES_CONFIG_PATH).expect("bundled ability definitions");
    world.insert_resource(definitions);
    init_control_world(&mut world);
    world
}

pub fn arena() -> Arena {
    arena_with(PetType::Hunter, &[BITE, CLAW, COWER, GREAT_STAMINA])
}

pub fn arena_with(pet_type: PetType, abilities: &[AbilityId]) -> Arena {
    let mut world = control_world();
    let owner = spawn_player(&mut world, "Rexxar", 1, Vec3::ZERO);
    let pet = spawn_companion(&mut world, owner, "Misha", pet_type, 1, abilities, Vec3::new(1.0, 0.0, 0.0));
    let boar = spawn_creature(&mut world, "Boar", 2, Vec3::new(1.0, 0.0, -3.0), &[], true);
    Arena { world, owner, pet, boar }
}

pub fn send(world: &mut World, controller: Entity, kind: RequestKind) -> Result<Outcome, ControlError> {
    apply_request(world, &ControlRequest::new(controller, kind))
}

/// Press an action-bar button for `pet`.
pub fn press(
    world: &mut World,
    controller: Entity,
    pet: Entity,
    button: ActionButton,
    target: Option<Entity>,
) -> Result<Outcome, ControlError> {
    send(
        world,
        controller,
        RequestKind::PetAction {
            pet,
            data: button.pack(),
            target,
        },
    )
}

/// Every event of type `T` sent so far.
pub fn sent<T: Event + Clone>(world: &World) -> Vec<T> {
    world
        .resource::<Events<T>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}
