//! Owner/name index over the busy channels
//!
//! Lets the controller tell whether an owner is already playing a named
//! sound, so a repeated trigger returns the running channel instead of
//! starting the sound again. The pool holds at most a few hundred channels,
//! so a linear scan is all this needs.

use crate::domain::channel::{Channel, ChannelId, OwnerId};
use std::collections::VecDeque;

pub struct Registry<'a> {
    channels: &'a [Channel],
    busy: &'a VecDeque<ChannelId>,
}

impl<'a> Registry<'a> {
    pub(crate) fn new(channels: &'a [Channel], busy: &'a VecDeque<ChannelId>) -> Self {
        Self { channels, busy }
    }

    /// First busy channel playing `name` for `owner`, oldest first
    ///
    /// Un-owned emissions are never deduplicated.
    pub fn find_by_owner_and_name(&self, owner: Option<OwnerId>, name: &str) -> Option<&'a Channel> {
        let owner = owner?;
        let channels = self.channels;
        self.busy
            .iter()
            .map(move |id| &channels[id.index()])
            .find(|channel| channel.owner() == Some(owner) && channel.name() == name)
    }

    /// Busy channels belonging to `owner`
    pub fn owned_by(&self, owner: OwnerId) -> impl Iterator<Item = &'a Channel> + 'a {
        let channels = self.channels;
        let busy = self.busy;
        busy.iter()
            .map(move |id| &channels[id.index()])
            .filter(move |channel| channel.owner() == Some(owner))
    }
}
