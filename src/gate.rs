//! The verification gate: new members must post a photo before their
//! deadline or they are banned.
//!
//! A join creates a pending entry and schedules its deadline. A photo and
//! an expiring deadline both race to claim that entry from the
//! [`PendingStore`]; whichever claims it first acts, the other finds nothing
//! and returns. Notices posted on either outcome are deleted again after a
//! short TTL.

use crate::deadline::Deadline;
use crate::messenger::{MemberProfile, Messenger};
use crate::notices;
use crate::pending::{PendingEntry, PendingKey, PendingStore};
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId, UserId};

/// Inbound events the gate reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    MemberJoined {
        chat: ChatId,
        user: UserId,
        profile: MemberProfile,
    },
    PhotoReceived {
        chat: ChatId,
        user: UserId,
        username: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct GateSettings {
    pub verify_window: Duration,
    pub notice_ttl_verified: Duration,
    pub notice_ttl_removed: Duration,
    /// Greeting with a `{mention}` placeholder.
    pub welcome_text: String,
    pub rules_text: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            verify_window: Duration::from_secs(4 * 60 * 60),
            notice_ttl_verified: Duration::from_secs(10),
            notice_ttl_removed: Duration::from_secs(15),
            welcome_text: notices::DEFAULT_WELCOME.to_string(),
            rules_text: notices::DEFAULT_RULES.to_string(),
        }
    }
}

pub struct VerificationGate<M> {
    messenger: Arc<M>,
    store: PendingStore,
    settings: Arc<GateSettings>,
}

impl<M> Clone for VerificationGate<M> {
    fn clone(&self) -> Self {
        Self {
            messenger: self.messenger.clone(),
            store: self.store.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<M: Messenger> VerificationGate<M> {
    pub fn new(messenger: Arc<M>, settings: GateSettings) -> Self {
        Self {
            messenger,
            store: PendingStore::new(),
            settings: Arc::new(settings),
        }
    }

    pub async fn handle_event(&self, event: GateEvent) {
        match event {
            GateEvent::MemberJoined {
                chat,
                user,
                profile,
            } => self.on_member_joined(chat, user, profile).await,
            GateEvent::PhotoReceived {
                chat,
                user,
                username,
            } => self.on_photo_received(chat, user, username.as_deref()).await,
        }
    }

    /// Put a new member on the clock and greet them.
    pub async fn on_member_joined(&self, chat: ChatId, user: UserId, profile: MemberProfile) {
        let key = (chat, user);
        let gate = self.clone();
        let window = self.settings.verify_window;
        let inserted = self
            .store
            .insert_with(key, |id| {
                Deadline::schedule(window, async move { gate.on_deadline(key, id).await })
            })
            .await;
        if inserted.is_none() {
            log::debug!(
                "User {} in chat {} is already pending verification, ignoring join",
                user.0,
                chat.0
            );
            return;
        }
        log::info!(
            "User {} joined chat {}, awaiting photo within {:?} ({} pending)",
            user.0,
            chat.0,
            window,
            self.store.len().await
        );

        let text = notices::welcome(
            &self.settings.welcome_text,
            &self.settings.rules_text,
            &profile,
        );
        if let Err(e) = self.messenger.send_message(chat, text).await {
            log::error!("Failed to send welcome to user {} in chat {}: {}", user.0, chat.0, e);
        }
        self.audit(notices::joined_log(&profile, chat)).await;
    }

    /// Verify the sender if they are pending in this chat; otherwise do nothing.
    pub async fn on_photo_received(&self, chat: ChatId, user: UserId, username: Option<&str>) {
        let Some(entry) = self.store.claim_verified((chat, user)).await else {
            log::debug!(
                "Photo from user {} in chat {} with nothing pending",
                user.0,
                chat.0
            );
            return;
        };
        entry.deadline.cancel();
        log::info!(
            "User {} verified in chat {} after {:?}",
            user.0,
            chat.0,
            entry.created_at.elapsed()
        );

        let handle = notices::handle_or_id(username, user);
        let sent = self
            .messenger
            .send_message(chat, notices::verified(username))
            .await;
        self.audit(notices::verified_log(&handle)).await;
        match sent {
            Ok(message) => self.delete_later(chat, message, self.settings.notice_ttl_verified),
            Err(e) => log::error!(
                "Failed to send verification notice for user {} in chat {}: {}",
                user.0,
                chat.0,
                e
            ),
        }
    }

    /// Body of the deadline scheduled at join time.
    async fn on_deadline(&self, key: PendingKey, id: u64) {
        let Some(entry) = self.store.claim_expired(key, id).await else {
            log::debug!(
                "Deadline for user {} in chat {} fired with nothing to do",
                key.1.0,
                key.0.0
            );
            return;
        };
        log::info!(
            "Timeout reached for user {} in chat {} after {:?}, removing",
            entry.user_id.0,
            entry.chat_id.0,
            entry.created_at.elapsed()
        );
        self.remove_unverified(entry).await;
    }

    /// Ban a member whose entry has already been claimed from the store.
    async fn remove_unverified(&self, entry: PendingEntry) {
        let (chat, user) = (entry.chat_id, entry.user_id);

        let handle = match self.messenger.fetch_member(chat, user).await {
            Ok(profile) => notices::handle_or_id(profile.username.as_deref(), user),
            Err(e) => {
                log::warn!("Failed to look up user {} in chat {}: {}", user.0, chat.0, e);
                user.0.to_string()
            }
        };

        if let Err(e) = self.messenger.ban_member(chat, user).await {
            log::error!("Failed to remove user {} from chat {}: {}", user.0, chat.0, e);
            return;
        }
        log::info!("User {} removed from chat {}", user.0, chat.0);

        let sent = self
            .messenger
            .send_message(chat, notices::removed(&handle))
            .await;
        self.audit(notices::removed_log(&handle)).await;
        match sent {
            Ok(message) => self.delete_later(chat, message, self.settings.notice_ttl_removed),
            Err(e) => log::error!(
                "Failed to send removal notice for user {} in chat {}: {}",
                user.0,
                chat.0,
                e
            ),
        }
    }

    /// Delete `message` once `ttl` has passed. Runs detached; never retried.
    fn delete_later(&self, chat: ChatId, message: MessageId, ttl: Duration) {
        let messenger = self.messenger.clone();
        Deadline::schedule(ttl, async move {
            match messenger.delete_message(chat, message).await {
                Ok(()) => log::debug!("Deleted notice {} in chat {}", message.0, chat.0),
                Err(e) => log::warn!("Failed to delete notice {} in chat {}: {}", message.0, chat.0, e),
            }
        });
    }

    async fn audit(&self, text: String) {
        if let Err(e) = self.messenger.send_log(text).await {
            log::debug!("Audit line dropped: {}", e);
        }
    }
}
