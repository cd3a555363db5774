//! `%kid1` / `%kid2` substitution in dialogue lines.
//!
//! The host replaces these tokens with its children's names. Once a child is
//! converted the host no longer sees it as a child, so the live actor's
//! display name is substituted here first. Tokens for empty slots are left
//! alone for the host's own substitution.

use std::borrow::Cow;

use crate::conversion::registry::ActorRegistry;
use crate::shared::ChildSlot;

fn token(slot: ChildSlot) -> &'static str {
    match slot {
        ChildSlot::First => "%kid1",
        ChildSlot::Second => "%kid2",
    }
}

pub fn substitute_kid_names<'a>(text: &'a str, registry: &ActorRegistry) -> Cow<'a, str> {
    let mut out = Cow::Borrowed(text);
    for slot in ChildSlot::ALL {
        let Some(actor) = registry.get(slot) else {
            continue;
        };
        if out.contains(token(slot)) {
            out = Cow::Owned(out.replace(token(slot), &actor.display_name));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::registry::RegisteredActor;
    use bevy::prelude::Entity;

    fn registry_with_first() -> ActorRegistry {
        let mut registry = ActorRegistry::default();
        registry.register(
            ChildSlot::First,
            RegisteredActor {
                entity: Entity::from_raw(3),
                identity: "FirstLittleNPCLily7".into(),
                display_name: "Lily".into(),
            },
        );
        registry
    }

    #[test]
    fn test_live_slot_is_substituted() {
        let registry = registry_with_first();
        assert_eq!(
            substitute_kid_names("Have you seen %kid1 today?", &registry),
            "Have you seen Lily today?"
        );
    }

    #[test]
    fn test_empty_slot_left_for_host() {
        let registry = registry_with_first();
        assert_eq!(
            substitute_kid_names("%kid1 and %kid2 were playing.", &registry),
            "Lily and %kid2 were playing."
        );
    }

    #[test]
    fn test_untouched_text_is_borrowed() {
        let registry = ActorRegistry::default();
        assert!(matches!(
            substitute_kid_names("Nice weather.", &registry),
            Cow::Borrowed(_)
        ));
    }
}
