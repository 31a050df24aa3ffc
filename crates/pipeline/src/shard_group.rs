//! Shard groups - round-robin firehose partitions
//!
//! All firehose members registered under the same shard id form one group.
//! Each firehose envelope goes to exactly one member per group; the members
//! take turns.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use plexus_routing::{ShardId, SinkId};
use plexus_sinks::Sink;

/// Members of one firehose shard plus the rotation cursor
#[derive(Debug)]
pub struct ShardGroup {
    shard_id: ShardId,
    members: Vec<Arc<Sink>>,
    /// Index of the member `next` hands out; always `< members.len()` or 0
    cursor: AtomicUsize,
}

impl ShardGroup {
    /// Create an empty group
    pub fn new(shard_id: ShardId) -> Self {
        Self {
            shard_id,
            members: Vec::new(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Shard this group serves
    #[inline]
    pub fn shard_id(&self) -> &ShardId {
        &self.shard_id
    }

    /// Append a member at the end of the rotation
    pub fn add_member(&mut self, sink: Arc<Sink>) {
        self.members.push(sink);
    }

    /// Remove a member by id
    ///
    /// The rotation continues with the member that followed the removed one.
    pub fn remove_member(&mut self, id: &SinkId) -> Option<Arc<Sink>> {
        let index = self.members.iter().position(|m| m.id() == id)?;
        let removed = self.members.remove(index);

        let cursor = self.cursor.get_mut();
        if index < *cursor {
            *cursor -= 1;
        }
        if *cursor >= self.members.len() {
            *cursor = 0;
        }

        Some(removed)
    }

    /// Pick the member whose turn it is and advance the rotation
    ///
    /// Lock-free; concurrent callers each get a distinct turn.
    pub fn next(&self) -> Option<Arc<Sink>> {
        let len = self.members.len();
        if len == 0 {
            return None;
        }

        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);

        self.members.get(previous % len).cloned()
    }

    /// Number of members
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the group has no members
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in rotation order
    #[inline]
    pub fn members(&self) -> &[Arc<Sink>] {
        &self.members
    }

    /// Check if a sink is a member
    pub fn contains(&self, id: &SinkId) -> bool {
        self.members.iter().any(|m| m.id() == id)
    }
}

#[cfg(test)]
#[path = "shard_group_test.rs"]
mod tests;
