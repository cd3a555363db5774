//! Small host hooks: the social listing and child interaction.

use bevy::prelude::*;

use crate::config::LittleNpcConfig;
use crate::shared::ChildRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialEntry {
    pub name: String,
    pub character: Option<Entity>,
}

/// The host's social page, as populated by the host.
#[derive(Resource, Debug, Clone, Default)]
pub struct SocialListing {
    pub entries: Vec<SocialEntry>,
}

/// System: drop hidden children from the social listing. Their actor has its
/// own entry, and a child must not be listed twice.
pub fn filter_social_listing(mut listing: ResMut<SocialListing>, children: Query<&ChildRecord>) {
    let hidden = |entry: &SocialEntry| {
        entry
            .character
            .and_then(|c| children.get(c).ok())
            .is_some_and(|child| child.invisible)
    };
    if listing.entries.iter().any(hidden) {
        listing.entries.retain(|entry| !hidden(entry));
    }
}

/// Whether the host should run its own interaction for `child`. Children old
/// enough to be converted answer through their actor instead.
pub fn child_accepts_interaction(child: &ChildRecord, config: &LittleNpcConfig) -> bool {
    child.days_old < config.age_when_kids_are_modified
}
