//! The [`EntityStore`] aggregate: every user, channel and message on the
//! server, plus the id counters, as one serializable unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::models::{
    Channel, ChannelId, Message, MessageId, User, UserId, HANDLE_MAX_LEN,
};

/// The full entity graph.  Identifiers are allocated by the counters and are
/// never reused, even after an entity is deleted.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityStore {
    users: BTreeMap<UserId, User>,
    channels: BTreeMap<ChannelId, Channel>,
    messages: BTreeMap<MessageId, Message>,
    user_id_counter: u64,
    channel_id_counter: u64,
    message_id_counter: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Id allocation
    // ------------------------------------------------------------------

    /// Allocate the next user id.  Strictly increasing, starting at 1.
    pub fn new_user_id(&mut self) -> UserId {
        self.user_id_counter += 1;
        self.user_id_counter
    }

    pub fn new_channel_id(&mut self) -> ChannelId {
        self.channel_id_counter += 1;
        self.channel_id_counter
    }

    pub fn new_message_id(&mut self) -> MessageId {
        self.message_id_counter += 1;
        self.message_id_counter
    }

    /// The last user id handed out (0 before any registration).
    pub fn user_id_counter(&self) -> u64 {
        self.user_id_counter
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert a user under its id.  An existing entry under the same id is
    /// replaced; callers never hand the same id to two logical users.
    pub fn register_user(&mut self, u_id: UserId, user: User) {
        self.users.insert(u_id, user);
    }

    pub fn user(&self, u_id: UserId) -> Result<&User> {
        self.users.get(&u_id).ok_or(StoreError::NotFound("user"))
    }

    pub fn user_mut(&mut self, u_id: UserId) -> Result<&mut User> {
        self.users.get_mut(&u_id).ok_or(StoreError::NotFound("user"))
    }

    /// All registered user ids, in ascending order.
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.keys().copied()
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    pub fn register_channel(&mut self, channel_id: ChannelId, channel: Channel) {
        self.channels.insert(channel_id, channel);
    }

    pub fn channel(&self, channel_id: ChannelId) -> Result<&Channel> {
        self.channels
            .get(&channel_id)
            .ok_or(StoreError::NotFound("channel"))
    }

    pub fn channel_mut(&mut self, channel_id: ChannelId) -> Result<&mut Channel> {
        self.channels
            .get_mut(&channel_id)
            .ok_or(StoreError::NotFound("channel"))
    }

    pub fn channel_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.keys().copied()
    }

    /// Create a channel with its creator as first member and owner.
    pub fn create_channel(
        &mut self,
        creator: UserId,
        name: &str,
        is_public: bool,
    ) -> Result<ChannelId> {
        // Validate the creator and the name before allocating an id.
        self.user(creator)?;
        let channel = Channel::new(name, is_public)?;
        let channel_id = self.new_channel_id();
        self.register_channel(channel_id, channel);
        self.join_channel(creator, channel_id)?;
        self.channel_mut(channel_id)?.add_owner(creator)?;
        Ok(channel_id)
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Add a user to a channel, updating both sides of the relationship.
    /// This is the only way membership is ever granted, which keeps
    /// `User::channels` and `Channel::members` consistent by construction.
    pub fn join_channel(&mut self, u_id: UserId, channel_id: ChannelId) -> Result<()> {
        self.user(u_id)?;
        let channel = self.channel_mut(channel_id)?;
        if channel.is_member(u_id) {
            return Err(StoreError::invalid(
                "User is already a member of the channel",
            ));
        }
        channel.add_member(u_id);
        self.user_mut(u_id)?.add_channel(channel_id);
        Ok(())
    }

    /// Remove a user from a channel, updating both sides.  Leaving also
    /// revokes channel ownership.
    pub fn leave_channel(&mut self, u_id: UserId, channel_id: ChannelId) -> Result<()> {
        self.user(u_id)?;
        self.channel_mut(channel_id)?.remove_member(u_id)?;
        self.user_mut(u_id)?.remove_channel(channel_id)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub fn register_message(&mut self, message_id: MessageId, message: Message) {
        self.messages.insert(message_id, message);
    }

    pub fn message(&self, message_id: MessageId) -> Result<&Message> {
        self.messages
            .get(&message_id)
            .ok_or(StoreError::NotFound("message"))
    }

    pub fn message_mut(&mut self, message_id: MessageId) -> Result<&mut Message> {
        self.messages
            .get_mut(&message_id)
            .ok_or(StoreError::NotFound("message"))
    }

    /// Delete a message.  Double-deletion is an error, not a no-op.
    pub fn delete_message(&mut self, message_id: MessageId) -> Result<()> {
        self.messages
            .remove(&message_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("message"))
    }

    // ------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------

    pub fn is_registered_email(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email() == email)
    }

    pub fn is_registered_handle(&self, handle: &str) -> bool {
        self.users.values().any(|u| u.handle() == handle)
    }

    pub fn user_id_by_email(&self, email: &str) -> Result<UserId> {
        self.users
            .iter()
            .find(|(_, u)| u.email() == email)
            .map(|(&u_id, _)| u_id)
            .ok_or_else(|| StoreError::invalid("Unregistered email"))
    }

    /// Derive a free handle from a base string.  The base is truncated to the
    /// handle limit; if taken, it is shortened further to leave room for a
    /// zero-padded numeric suffix (`001`, `002`, ...) that makes it unique.
    pub fn generate_unique_handle(&self, base: &str) -> String {
        let mut base: String = base.chars().take(HANDLE_MAX_LEN).collect();
        if self.is_registered_handle(&base) && base.chars().count() > HANDLE_MAX_LEN - 3 {
            base = base.chars().take(HANDLE_MAX_LEN - 3).collect();
        }
        if !self.is_registered_handle(&base) {
            return base;
        }
        let mut i = 0u32;
        loop {
            i += 1;
            let candidate = format!("{base}{i:03}");
            if !self.is_registered_handle(&candidate) {
                return candidate;
            }
        }
    }
}
