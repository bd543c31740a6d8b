//! Fixed-size channel pool
//!
//! All channels are created once at construction and afterwards only move
//! between two sequences: the idle free list and the busy queue. Channels are
//! appended to the busy queue in the order they are handed out, so its front
//! is always the oldest busy channel and the next one to be evicted when the
//! pool runs dry.

use crate::domain::audio::Device;
use crate::domain::channel::{Channel, ChannelId, ChannelSnapshot};
use crate::domain::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use tracing::{debug, info};

pub const DEFAULT_CAPACITY: usize = 128;

pub struct ChannelPool {
    channels: Box<[Channel]>,
    idle: Vec<ChannelId>,
    busy: VecDeque<ChannelId>,
    next_serial: u64,
}

impl ChannelPool {
    /// Build `capacity` idle channels, asking `make_device` for each one's device
    pub fn new<F>(capacity: NonZeroUsize, mut make_device: F) -> Self
    where
        F: FnMut(ChannelId) -> Box<dyn Device>,
    {
        let channels: Box<[Channel]> = (0..capacity.get())
            .map(ChannelId::new)
            .map(|id| Channel::new(id, make_device(id)))
            .collect();
        let idle = channels.iter().map(Channel::id).collect();

        info!(capacity = capacity.get(), "Channel pool ready");

        Self {
            channels,
            idle,
            busy: VecDeque::with_capacity(capacity.get()),
            next_serial: 0,
        }
    }

    /// Hand out a channel, evicting the oldest busy one if none is idle
    ///
    /// The returned channel is at the back of the busy queue.
    pub fn allocate(&mut self) -> &mut Channel {
        let id = match self.idle.pop() {
            Some(id) => id,
            None => {
                let oldest = self
                    .busy
                    .pop_front()
                    .expect("non-zero capacity keeps a busy channel when none is idle");
                let channel = &mut self.channels[oldest.index()];
                debug!(channel = %oldest, name = %channel.name(), "Evicting oldest busy channel");
                channel.stop();
                oldest
            }
        };

        self.busy.push_back(id);
        self.next_serial += 1;

        let channel = &mut self.channels[id.index()];
        channel.set_serial(self.next_serial);
        channel
    }

    /// Stop and idle every busy channel matching `predicate`
    ///
    /// Busy channels are visited oldest first, each exactly once.
    pub fn release_where<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&Channel) -> bool,
    {
        let mut released = 0;
        let mut index = 0;

        // Removal shifts the next entry into `index`, so only advance on a miss
        while index < self.busy.len() {
            let id = self.busy[index];
            if predicate(&self.channels[id.index()]) {
                self.channels[id.index()].stop();
                self.busy.remove(index);
                self.idle.push(id);
                released += 1;
            } else {
                index += 1;
            }
        }

        if released > 0 {
            debug!(released, busy = self.busy.len(), "Released channels");
        }
        released
    }

    /// Release channels that finished playing or whose fade-out expired
    pub fn cleanup(&mut self, now: u64) -> usize {
        self.release_where(|channel| !channel.is_busy() || channel.is_expired(now))
    }

    pub fn capacity(&self) -> usize {
        self.channels.len()
    }

    pub fn busy_len(&self) -> usize {
        self.busy.len()
    }

    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.index())
    }

    pub(crate) fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(id.index())
    }

    pub fn is_busy_channel(&self, id: ChannelId) -> bool {
        self.busy.contains(&id)
    }

    /// Busy channels, oldest first
    pub fn busy_channels(&self) -> impl Iterator<Item = &Channel> + '_ {
        self.busy.iter().map(|id| &self.channels[id.index()])
    }

    /// Busy channel ids, oldest first
    pub fn busy_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.busy.iter().copied()
    }

    /// Visit every busy channel mutably, oldest first
    pub fn for_each_busy<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Channel),
    {
        for id in &self.busy {
            visit(&mut self.channels[id.index()]);
        }
    }

    /// Owner/name lookup over the busy channels
    pub fn registry(&self) -> Registry<'_> {
        Registry::new(&self.channels, &self.busy)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            capacity: self.capacity(),
            idle: self.idle_len(),
            busy: self.busy_channels().map(Channel::snapshot).collect(),
        }
    }
}

impl Drop for ChannelPool {
    fn drop(&mut self) {
        let busy = self.busy.len();
        for id in self.busy.drain(..) {
            self.channels[id.index()].stop();
        }
        info!(busy, "Shutting down channel pool");
    }
}

/// Serializable view of the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub capacity: usize,
    pub idle: usize,
    pub busy: Vec<ChannelSnapshot>,
}
