//! Domain model structs held in the [`crate::EntityStore`] aggregate.
//!
//! Every struct derives `Serialize` and `Deserialize` so the whole graph can
//! be written out as one snapshot blob.  Field constraints (name lengths,
//! handle shape, message size) are enforced by the constructors and setters
//! here, so an entity that exists is always a valid one.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Sequentially allocated user identifier, starting at 1.
pub type UserId = u64;
/// Sequentially allocated channel identifier, starting at 1.
pub type ChannelId = u64;
/// Sequentially allocated message identifier, starting at 1.
pub type MessageId = u64;
/// Identifier of a reaction kind.
pub type ReactId = u32;

pub const NAME_MIN_LEN: usize = 1;
pub const NAME_MAX_LEN: usize = 50;
pub const HANDLE_MIN_LEN: usize = 3;
pub const HANDLE_MAX_LEN: usize = 20;
pub const CHANNEL_NAME_MAX_LEN: usize = 20;
pub const MESSAGE_MAX_LEN: usize = 1000;

/// The only reaction kind currently recognised.
pub const REACT_THUMBS_UP: ReactId = 1;

/// Profile picture every user starts with.
pub const DEFAULT_PFP_FILENAME: &str = "default.jpeg";

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("email regex");
}

/// Check an email address against the accepted shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Validate an email address, returning the standard error on failure.
pub fn validate_email(email: &str) -> Result<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(StoreError::invalid("Invalid email"))
    }
}

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// Site-wide permission level.  The first registered user is the sole
/// initial [`Permission::Owner`]; everyone after that starts as a
/// [`Permission::Member`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Permission {
    Owner,
    Admin,
    Member,
}

impl Permission {
    /// Map the wire-level permission id (1 = owner, 2 = admin, 3 = member).
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Permission::Owner),
            2 => Some(Permission::Admin),
            3 => Some(Permission::Member),
            _ => None,
        }
    }

    /// Whether this level carries moderation rights (pinning, removing and
    /// editing other users' messages).
    pub fn can_moderate(self) -> bool {
        matches!(self, Permission::Owner | Permission::Admin)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.  The id is not stored on the struct; it is the key
/// under which the user lives in the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    email: String,
    password_hash: String,
    name_first: String,
    name_last: String,
    handle: String,
    permission: Permission,
    pfp_filename: String,
    channels: Vec<ChannelId>,
}

impl User {
    /// Build a user from an already-hashed password.  The email shape and
    /// name lengths are validated; uniqueness checks belong to the aggregate.
    pub fn new(
        email: &str,
        password_hash: String,
        name_first: &str,
        name_last: &str,
    ) -> Result<Self> {
        let mut user = User {
            email: String::new(),
            password_hash,
            name_first: String::new(),
            name_last: String::new(),
            handle: String::new(),
            permission: Permission::Member,
            pfp_filename: DEFAULT_PFP_FILENAME.to_string(),
            channels: Vec::new(),
        };
        user.set_email(email)?;
        user.set_name_first(name_first)?;
        user.set_name_last(name_last)?;
        Ok(user)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: &str) -> Result<()> {
        validate_email(email)?;
        self.email = email.to_string();
        Ok(())
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
    }

    pub fn name_first(&self) -> &str {
        &self.name_first
    }

    pub fn set_name_first(&mut self, name_first: &str) -> Result<()> {
        let len = name_first.chars().count();
        if (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
            self.name_first = name_first.to_string();
            Ok(())
        } else {
            Err(StoreError::invalid("Invalid first name"))
        }
    }

    pub fn name_last(&self) -> &str {
        &self.name_last
    }

    pub fn set_name_last(&mut self, name_last: &str) -> Result<()> {
        let len = name_last.chars().count();
        if (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
            self.name_last = name_last.to_string();
            Ok(())
        } else {
            Err(StoreError::invalid("Invalid last name"))
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn set_handle(&mut self, handle: &str) -> Result<()> {
        let len = handle.chars().count();
        if (HANDLE_MIN_LEN..=HANDLE_MAX_LEN).contains(&len) {
            self.handle = handle.to_string();
            Ok(())
        } else {
            Err(StoreError::invalid("Invalid handle"))
        }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    pub fn pfp_filename(&self) -> &str {
        &self.pfp_filename
    }

    pub fn set_pfp_filename(&mut self, filename: &str) {
        self.pfp_filename = filename.to_string();
    }

    /// Channels the user belongs to, in join order.
    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Membership edits go through [`crate::EntityStore::join_channel`] and
    /// [`crate::EntityStore::leave_channel`], which keep this list and the
    /// channel's member list in lockstep.
    pub(crate) fn add_channel(&mut self, channel_id: ChannelId) {
        self.channels.push(channel_id);
    }

    pub(crate) fn remove_channel(&mut self, channel_id: ChannelId) -> Result<()> {
        match self.channels.iter().position(|&c| c == channel_id) {
            Some(pos) => {
                self.channels.remove(pos);
                Ok(())
            }
            None => Err(StoreError::invalid(
                "User is not a member of the channel",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A conversation channel.  Owners are always a subset of members, and the
/// message list holds ids in send order (oldest first).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    name: String,
    is_public: bool,
    members: Vec<UserId>,
    owners: Vec<UserId>,
    messages: Vec<MessageId>,
}

impl Channel {
    pub fn new(name: &str, is_public: bool) -> Result<Self> {
        let mut channel = Channel {
            name: String::new(),
            is_public,
            members: Vec::new(),
            owners: Vec::new(),
            messages: Vec::new(),
        };
        channel.set_name(name)?;
        Ok(channel)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.chars().count() <= CHANNEL_NAME_MAX_LEN {
            self.name = name.to_string();
            Ok(())
        } else {
            Err(StoreError::invalid("Invalid channel name"))
        }
    }

    /// Whether the channel can be joined without admin privileges.  Fixed at
    /// creation time.
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    pub fn is_member(&self, u_id: UserId) -> bool {
        self.members.contains(&u_id)
    }

    pub(crate) fn add_member(&mut self, u_id: UserId) {
        self.members.push(u_id);
    }

    pub(crate) fn remove_member(&mut self, u_id: UserId) -> Result<()> {
        match self.members.iter().position(|&m| m == u_id) {
            Some(pos) => {
                self.members.remove(pos);
                // An owner who leaves stops being an owner.
                self.owners.retain(|&o| o != u_id);
                Ok(())
            }
            None => Err(StoreError::invalid(
                "User is not a member of the channel",
            )),
        }
    }

    pub fn owners(&self) -> &[UserId] {
        &self.owners
    }

    pub fn is_owner(&self, u_id: UserId) -> bool {
        self.owners.contains(&u_id)
    }

    /// Promote a member to owner.  Owners must already be members.
    pub fn add_owner(&mut self, u_id: UserId) -> Result<()> {
        if !self.is_member(u_id) {
            return Err(StoreError::invalid(
                "User is not a member of the channel",
            ));
        }
        if self.is_owner(u_id) {
            return Err(StoreError::invalid(
                "User is already owner of the channel",
            ));
        }
        self.owners.push(u_id);
        Ok(())
    }

    pub fn remove_owner(&mut self, u_id: UserId) -> Result<()> {
        match self.owners.iter().position(|&o| o == u_id) {
            Some(pos) => {
                self.owners.remove(pos);
                Ok(())
            }
            None => Err(StoreError::invalid(
                "User is not an owner of the channel",
            )),
        }
    }

    /// Message ids in send order (oldest first).
    pub fn message_ids(&self) -> &[MessageId] {
        &self.messages
    }

    pub fn add_message(&mut self, message_id: MessageId) {
        self.messages.push(message_id);
    }

    /// Remove a message id from anywhere in the sequence.
    pub fn remove_message(&mut self, message_id: MessageId) -> Result<()> {
        match self.messages.iter().position(|&m| m == message_id) {
            Some(pos) => {
                self.messages.remove(pos);
                Ok(())
            }
            None => Err(StoreError::invalid("Message is not in the channel")),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.  `time_sent` may lie in the future for messages
/// scheduled for deferred delivery; such messages exist in the aggregate but
/// are not listed in any channel until delivery fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    channel_id: ChannelId,
    sender: UserId,
    body: String,
    time_sent: DateTime<Utc>,
    is_pinned: bool,
    reacts: BTreeMap<ReactId, BTreeSet<UserId>>,
}

impl Message {
    pub fn new(
        sender: UserId,
        channel_id: ChannelId,
        body: &str,
        time_sent: DateTime<Utc>,
    ) -> Result<Self> {
        validate_message_body(body)?;
        Ok(Message {
            channel_id,
            sender,
            body: body.to_string(),
            time_sent,
            is_pinned: false,
            reacts: BTreeMap::new(),
        })
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn sender(&self) -> UserId {
        self.sender
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: &str) -> Result<()> {
        validate_message_body(body)?;
        self.body = body.to_string();
        Ok(())
    }

    pub fn time_sent(&self) -> DateTime<Utc> {
        self.time_sent
    }

    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    pub fn pin(&mut self) -> Result<()> {
        if self.is_pinned {
            return Err(StoreError::invalid("Message is already pinned"));
        }
        self.is_pinned = true;
        Ok(())
    }

    pub fn unpin(&mut self) -> Result<()> {
        if !self.is_pinned {
            return Err(StoreError::invalid("Message is already unpinned"));
        }
        self.is_pinned = false;
        Ok(())
    }

    /// Reactions by kind, each holding the set of users who reacted.
    pub fn reacts(&self) -> &BTreeMap<ReactId, BTreeSet<UserId>> {
        &self.reacts
    }

    /// Record a reaction.  Reacting twice with the same kind is an error.
    pub fn add_react(&mut self, u_id: UserId, react_id: ReactId) -> Result<()> {
        let reactors = self.reacts.entry(react_id).or_default();
        if !reactors.insert(u_id) {
            return Err(StoreError::invalid("User has already reacted"));
        }
        Ok(())
    }

    /// Withdraw a reaction.  The kind disappears once its last reactor does.
    pub fn remove_react(&mut self, u_id: UserId, react_id: ReactId) -> Result<()> {
        let removed = match self.reacts.get_mut(&react_id) {
            Some(reactors) => reactors.remove(&u_id),
            None => false,
        };
        if !removed {
            return Err(StoreError::invalid("User has not reacted"));
        }
        if self.reacts.get(&react_id).is_some_and(|r| r.is_empty()) {
            self.reacts.remove(&react_id);
        }
        Ok(())
    }
}

/// Check a message body against the length limit.
pub fn validate_message_body(body: &str) -> Result<()> {
    if body.chars().count() > MESSAGE_MAX_LEN {
        return Err(StoreError::invalid(
            "Message exceeds the 1000 character limit",
        ));
    }
    Ok(())
}
