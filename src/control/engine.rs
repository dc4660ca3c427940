//! Ability-resolution engine seam
//!
//! The cast pipeline never resolves an ability itself. It builds a
//! [`PendingCast`], asks the engine whether the caster may cast it, and
//! then either starts it or aborts it. Ownership makes the hand-off exact:
//! `start` and `abort` both consume the pending cast, so every pipeline path
//! gives it up exactly once.
//!
//! [`BuiltinResolver`] is the default engine. It runs the local legality
//! check against the unit's components and hands started casts on as
//! [`AbilityStarted`] events.

use bevy::prelude::*;
use serde::Serialize;

use super::abilities::{AbilityId, ImplicitTarget};
use super::ability_config::{AbilityConfig, AbilityDefinitions};
use super::components::{ActiveAuras, AuraType, Spellbook, Unit};
use super::geometry::{ground_distance, is_in_front, LineOfSight};
use super::notices::AbilityStarted;
use super::requests::CastTargets;

/// Why the local legality check refused a cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CastFailure {
    NotReady,
    Stunned,
    Silenced,
    Pacified,
    NoPower,
    BadTargets,
    TargetsDead,
    TargetFriendly,
    TargetEnemy,
    OutOfRange,
    TooClose,
    LineOfSight,
    UnitNotInfront,
    CasterDead,
}

/// A cast under validation. Lives only for the duration of one request.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingCast {
    pub caster: Entity,
    pub ability: AbilityId,
    /// Client correlation counter, 0 for action-bar casts
    pub cast_count: u8,
    /// Target named in the request, before resolution
    pub explicit_target: Option<Entity>,
    /// Resolved targets; the unit target is filled by the legality check
    pub targets: CastTargets,
    /// Triggered by an already validated effect
    pub triggered: bool,
}

impl PendingCast {
    pub fn new(caster: Entity, ability: AbilityId, explicit_target: Option<Entity>) -> Self {
        Self {
            caster,
            ability,
            cast_count: 0,
            explicit_target,
            targets: CastTargets {
                unit: explicit_target,
                destination: None,
            },
            triggered: false,
        }
    }

    pub fn unit_target(&self) -> Option<Entity> {
        self.targets.unit
    }
}

/// The external ability-resolution engine.
pub trait AbilityResolver: Send + Sync + 'static {
    /// Local legality check. May resolve the implicit unit target into
    /// `cast.targets`.
    fn check_cast(&self, world: &World, cast: &mut PendingCast) -> Result<(), CastFailure>;

    /// Take over a validated cast.
    fn start(&self, world: &mut World, cast: PendingCast);

    /// Discard a cast that will not happen.
    fn abort(&self, world: &mut World, cast: PendingCast);
}

/// Resource holding the engine the pipeline talks to.
#[derive(Resource)]
pub struct AbilityEngine(pub Box<dyn AbilityResolver>);

impl Default for AbilityEngine {
    fn default() -> Self {
        Self(Box::new(BuiltinResolver))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinResolver;

impl AbilityResolver for BuiltinResolver {
    fn check_cast(&self, world: &World, cast: &mut PendingCast) -> Result<(), CastFailure> {
        let Some(def) = world
            .get_resource::<AbilityDefinitions>()
            .and_then(|defs| defs.get(cast.ability))
        else {
            // The pipeline rejects unknown ids before asking
            return Err(CastFailure::BadTargets);
        };
        check_pet_cast(world, cast, def)
    }

    fn start(&self, world: &mut World, cast: PendingCast) {
        debug!("Starting ability {} for {:?}", cast.ability, cast.caster);
        world.send_event(AbilityStarted { cast });
    }

    fn abort(&self, _world: &mut World, cast: PendingCast) {
        debug!("Discarding ability {} for {:?}", cast.ability, cast.caster);
    }
}

/// Resolve the unit an ability lands on when the request named none.
fn resolve_unit_target(caster: Entity, caster_unit: &Unit, cast: &PendingCast, def: &AbilityConfig) -> Option<Entity> {
    match def.unit_target_kind() {
        Some(ImplicitTarget::EnemyUnit) => cast.explicit_target.or(caster_unit.victim),
        Some(ImplicitTarget::FriendlyUnit) => cast.explicit_target.or(Some(caster)),
        _ if def.is_self_cast() => Some(caster),
        _ => cast.explicit_target,
    }
}

/// The local legality check for a controlled unit's cast.
///
/// Facing is checked last so that `UnitNotInfront` only comes back when
/// every other requirement holds.
pub fn check_pet_cast(world: &World, cast: &mut PendingCast, def: &AbilityConfig) -> Result<(), CastFailure> {
    let caster = cast.caster;
    let Some(caster_unit) = world.get::<Unit>(caster) else {
        return Err(CastFailure::CasterDead);
    };
    if !caster_unit.is_alive() {
        return Err(CastFailure::CasterDead);
    }

    if world
        .get::<Spellbook>(caster)
        .is_some_and(|book| book.has_cooldown(cast.ability))
    {
        return Err(CastFailure::NotReady);
    }

    if let Some(auras) = world.get::<ActiveAuras>(caster) {
        if auras.has(AuraType::Stun) {
            return Err(CastFailure::Stunned);
        }
        if def.school.is_physical() && auras.has(AuraType::Pacify) {
            return Err(CastFailure::Pacified);
        }
        if !def.school.is_physical() && auras.has(AuraType::Silence) {
            return Err(CastFailure::Silenced);
        }
    }

    if caster_unit.current_mana < def.mana_cost {
        return Err(CastFailure::NoPower);
    }

    let target = resolve_unit_target(caster, caster_unit, cast, def);
    cast.targets.unit = target;

    let needs_unit = def.unit_target_kind().is_some();
    let Some(target) = target else {
        return if needs_unit {
            Err(CastFailure::BadTargets)
        } else {
            Ok(())
        };
    };
    if target == caster {
        return Ok(());
    }

    let Some(target_unit) = world.get::<Unit>(target) else {
        return Err(CastFailure::BadTargets);
    };
    if !target_unit.is_alive() {
        return Err(CastFailure::TargetsDead);
    }
    match def.unit_target_kind() {
        Some(ImplicitTarget::EnemyUnit) if caster_unit.is_friendly_to(target_unit) => {
            return Err(CastFailure::TargetFriendly);
        }
        Some(ImplicitTarget::FriendlyUnit) if !caster_unit.is_friendly_to(target_unit) => {
            return Err(CastFailure::TargetEnemy);
        }
        _ => {}
    }

    let (Some(caster_tf), Some(target_tf)) = (world.get::<Transform>(caster), world.get::<Transform>(target)) else {
        return Err(CastFailure::BadTargets);
    };
    let distance = ground_distance(caster_tf.translation, target_tf.translation);
    if distance > def.max_range {
        return Err(CastFailure::OutOfRange);
    }
    if distance < def.min_range {
        return Err(CastFailure::TooClose);
    }
    let clear = world
        .get_resource::<LineOfSight>()
        .map_or(true, |los| los.is_clear(caster_tf.translation, target_tf.translation));
    if !clear {
        return Err(CastFailure::LineOfSight);
    }

    if def.requires_facing && !is_in_front(caster_tf, target_tf.translation) {
        return Err(CastFailure::UnitNotInfront);
    }

    Ok(())
}
