//! Pet naming: name queries, renames, and the name rules behind them.
//!
//! A rename is validated in full (name, reserved list, declined forms)
//! before anything on the companion changes.

use bevy::prelude::*;
use regex::Regex;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::settings::ControlSettings;

use super::components::{ControlKind, DeclinedNames, Pet, PetType, Unit};
use super::dispatch::{require_profile, resolve_controlled, Outcome};
use super::errors::ControlError;
use super::notices::{NameQueryResponse, PetNameInvalidNotice, PetNameInvalidReason, PetRenamed};
use super::profile::ControlProfile;

const LATIN_NAME: &str = r"^[A-Za-z]+$";
const CYRILLIC_NAME: &str = r"^[А-Яа-яЁё]+$";
const ANY_LETTERS: &str = r"^[A-Za-zА-Яа-яЁё]+$";

/// Endings dropped from a Cyrillic name to get the stem its declined forms
/// must start with.
const CYRILLIC_ENDINGS: &[char] = &['а', 'е', 'ё', 'и', 'о', 'у', 'ы', 'э', 'ю', 'я', 'ь', 'й'];

struct NamePatterns {
    latin: Regex,
    cyrillic: Regex,
    letters: Regex,
}

fn patterns() -> &'static NamePatterns {
    static PATTERNS: OnceLock<NamePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| NamePatterns {
        latin: Regex::new(LATIN_NAME).expect("literal pattern"),
        cyrillic: Regex::new(CYRILLIC_NAME).expect("literal pattern"),
        letters: Regex::new(ANY_LETTERS).expect("literal pattern"),
    })
}

fn has_three_consecutive(name: &str) -> bool {
    let lowered: Vec<char> = name.to_lowercase().chars().collect();
    lowered.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

/// Check `name` against the charset, length, and repetition rules.
pub fn check_pet_name(name: &str, settings: &ControlSettings) -> Result<(), PetNameInvalidReason> {
    if name.is_empty() {
        return Err(PetNameInvalidReason::NoName);
    }
    let length = name.chars().count();
    if length < settings.min_pet_name_length {
        return Err(PetNameInvalidReason::TooShort);
    }
    if length > settings.max_pet_name_length {
        return Err(PetNameInvalidReason::TooLong);
    }

    let p = patterns();
    if !p.letters.is_match(name) {
        return Err(PetNameInvalidReason::Invalid);
    }
    if !p.latin.is_match(name) && !p.cyrillic.is_match(name) {
        return Err(PetNameInvalidReason::MixedLanguages);
    }
    if has_three_consecutive(name) {
        return Err(PetNameInvalidReason::ThreeConsecutive);
    }
    Ok(())
}

/// Lowercased stem of a name: Cyrillic names lose one trailing vowel or
/// soft sign.
pub fn main_part_of_name(name: &str) -> String {
    let mut lowered = name.to_lowercase();
    if patterns().cyrillic.is_match(name) && lowered.chars().count() > 1 && lowered.ends_with(CYRILLIC_ENDINGS) {
        lowered.pop();
    }
    lowered
}

/// Every declined form must be a non-empty valid name starting with the
/// base name's stem.
pub fn check_declined_names(base: &str, declined: &DeclinedNames) -> bool {
    let stem = main_part_of_name(base);
    let p = patterns();
    declined.cases.iter().all(|case| {
        !case.is_empty()
            && (p.latin.is_match(case) || p.cyrillic.is_match(case))
            && case.to_lowercase().starts_with(&stem)
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// Requests
// ============================================================================

/// Answer a name query. Anyone may ask; a missing companion or a number
/// mismatch gets an empty answer.
pub fn handle_name_query(world: &mut World, requester: Entity, unit: Entity, pet_number: u32) -> Outcome {
    let known_number = world.get::<ControlProfile>(unit).map(|p| p.pet_number);
    let response = match (world.get::<Unit>(unit), known_number) {
        (Some(u), Some(number)) if number == pet_number => {
            let pet = world.get::<Pet>(unit);
            NameQueryResponse {
                recipient: requester,
                pet_number,
                name: Some(u.name.clone()),
                name_timestamp: pet.map_or(0, |p| p.name_timestamp),
                declined: pet.and_then(|p| p.declined_names.clone()),
            }
        }
        _ => NameQueryResponse {
            recipient: requester,
            pet_number,
            name: None,
            name_timestamp: 0,
            declined: None,
        },
    };
    let found = response.name.is_some();
    world.send_event(response);
    Outcome::NameAnswered { found }
}

pub fn handle_rename(
    world: &mut World,
    controller: Entity,
    unit: Entity,
    name: String,
    declined: Option<DeclinedNames>,
) -> Result<Outcome, ControlError> {
    let ctx = resolve_controlled(world, controller, unit)?;
    let renameable = ctx.caps.kind == ControlKind::Pet
        && world
            .get::<Pet>(unit)
            .is_some_and(|pet| pet.pet_type == PetType::Hunter && pet.can_be_renamed);
    if !renameable {
        return Err(ControlError::RenameNotPermitted(unit));
    }
    require_profile(world, unit)?;

    let settings = world.get_resource::<ControlSettings>().cloned().unwrap_or_default();
    let verdict = check_pet_name(&name, &settings).and_then(|()| {
        if settings.is_reserved(&name) {
            return Err(PetNameInvalidReason::Reserved);
        }
        match &declined {
            Some(forms) if !check_declined_names(&name, forms) => {
                Err(PetNameInvalidReason::DeclensionDoesntMatchBaseName)
            }
            _ => Ok(()),
        }
    });
    if let Err(reason) = verdict {
        world.send_event(PetNameInvalidNotice {
            recipient: controller,
            reason,
            name,
            declined,
        });
        return Ok(Outcome::NameRejected(reason));
    }

    if let Some(mut u) = world.get_mut::<Unit>(unit) {
        u.name = name.clone();
    }
    if let Some(mut pet) = world.get_mut::<Pet>(unit) {
        pet.can_be_renamed = false;
        pet.name_timestamp = unix_now();
        pet.declined_names = declined.clone();
    }
    let pet_number = world.get::<ControlProfile>(unit).map_or(0, |p| p.pet_number);
    world.send_event(PetRenamed {
        owner: controller,
        pet: unit,
        pet_number,
        name: name.clone(),
        declined,
    });
    info!("{:?} renamed companion {:?} to {}", controller, unit, name);
    Ok(Outcome::Renamed(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ControlSettings {
        ControlSettings {
            reserved_names: vec!["Garrosh".to_string()],
            ..default()
        }
    }

    #[test]
    fn test_name_rules() {
        let s = settings();
        assert_eq!(check_pet_name("Fluffy", &s), Ok(()));
        assert_eq!(check_pet_name("Шарик", &s), Ok(()));
        assert_eq!(check_pet_name("", &s), Err(PetNameInvalidReason::NoName));
        assert_eq!(check_pet_name("F", &s), Err(PetNameInvalidReason::TooShort));
        assert_eq!(check_pet_name("Fluffernutterz", &s), Err(PetNameInvalidReason::TooLong));
        assert_eq!(check_pet_name("Fluf fy", &s), Err(PetNameInvalidReason::Invalid));
        assert_eq!(check_pet_name("Flшарик", &s), Err(PetNameInvalidReason::MixedLanguages));
        assert_eq!(check_pet_name("Grrrowl", &s), Err(PetNameInvalidReason::ThreeConsecutive));
    }

    #[test]
    fn test_cyrillic_stem_drops_one_ending() {
        assert_eq!(main_part_of_name("Мурка"), "мурк");
        assert_eq!(main_part_of_name("Шарик"), "шарик");
        assert_eq!(main_part_of_name("Fluffy"), "fluffy");
    }

    #[test]
    fn test_declined_forms_must_share_the_stem() {
        let good = DeclinedNames {
            cases: ["Мурки", "Мурке", "Мурку", "Муркой", "Мурке"].map(String::from),
        };
        assert!(check_declined_names("Мурка", &good));

        let bad = DeclinedNames {
            cases: ["Мурки", "Барсику", "Мурку", "Муркой", "Мурке"].map(String::from),
        };
        assert!(!check_declined_names("Мурка", &bad));

        let empty = DeclinedNames::default();
        assert!(!check_declined_names("Мурка", &empty));
    }
}
