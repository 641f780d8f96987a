//! Telegram side of the bot: the `Messenger` implementation over a teloxide
//! `Bot`, and the dispatcher tree that turns updates into gate events.

use crate::gate::{GateEvent, VerificationGate};
use crate::messenger::{MemberProfile, Messenger, MessengerError};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, User, UserId};

pub type TelegramGate = VerificationGate<TelegramMessenger>;

pub struct TelegramMessenger {
    bot: Bot,
    log_chat: Option<ChatId>,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, log_chat: Option<ChatId>) -> Self {
        Self { bot, log_chat }
    }
}

fn profile_of(user: &User) -> MemberProfile {
    MemberProfile::new(user.full_name(), user.username.clone())
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(&self, chat: ChatId, text: String) -> Result<MessageId, MessengerError> {
        let sent = self.bot.send_message(chat, text).await?;
        Ok(sent.id)
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), MessengerError> {
        self.bot.delete_message(chat, message).await?;
        Ok(())
    }

    async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<(), MessengerError> {
        self.bot.ban_chat_member(chat, user).await?;
        Ok(())
    }

    async fn fetch_member(
        &self,
        chat: ChatId,
        user: UserId,
    ) -> Result<MemberProfile, MessengerError> {
        let member = self.bot.get_chat_member(chat, user).await?;
        Ok(profile_of(&member.user))
    }

    async fn send_log(&self, text: String) -> Result<(), MessengerError> {
        let chat = self.log_chat.ok_or(MessengerError::NoLogChat)?;
        self.bot.send_message(chat, text).await?;
        Ok(())
    }
}

/// Gate events carried by one message. A join message may list several
/// members; bots joining are not gated.
pub fn events_from_message(msg: &Message) -> Vec<GateEvent> {
    let chat = msg.chat.id;
    if let Some(members) = msg.new_chat_members() {
        return members
            .iter()
            .filter(|member| !member.is_bot)
            .map(|member| GateEvent::MemberJoined {
                chat,
                user: member.id,
                profile: profile_of(member),
            })
            .collect();
    }
    match (msg.photo(), msg.from.as_ref()) {
        (Some(_), Some(sender)) => vec![GateEvent::PhotoReceived {
            chat,
            user: sender.id,
            username: sender.username.clone(),
        }],
        _ => Vec::new(),
    }
}

async fn handle_message(gate: Arc<TelegramGate>, msg: Message) -> anyhow::Result<()> {
    for event in events_from_message(&msg) {
        gate.handle_event(event).await;
    }
    Ok(())
}

pub fn schema() -> UpdateHandler<anyhow::Error> {
    Update::filter_message()
        .filter(|msg: Message| msg.new_chat_members().is_some() || msg.photo().is_some())
        .endpoint(handle_message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(extra: serde_json::Value) -> Message {
        let mut raw = json!({
            "message_id": 10,
            "date": 1_700_000_000,
            "chat": {"id": -1001, "type": "supergroup", "title": "gate"},
            "from": {"id": 42, "is_bot": false, "first_name": "Alice", "username": "alice"}
        });
        for (key, value) in extra.as_object().unwrap() {
            raw[key.as_str()] = value.clone();
        }
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_join_message_yields_one_event_per_human() {
        let msg = message(json!({
            "new_chat_members": [
                {"id": 42, "is_bot": false, "first_name": "Alice", "username": "alice"},
                {"id": 43, "is_bot": false, "first_name": "Bob", "last_name": "Lee"},
                {"id": 44, "is_bot": true, "first_name": "Spam", "username": "spam_bot"}
            ]
        }));

        let events = events_from_message(&msg);
        assert_eq!(
            events,
            vec![
                GateEvent::MemberJoined {
                    chat: ChatId(-1001),
                    user: UserId(42),
                    profile: MemberProfile::new("Alice", Some("alice".to_string())),
                },
                GateEvent::MemberJoined {
                    chat: ChatId(-1001),
                    user: UserId(43),
                    profile: MemberProfile::new("Bob Lee", None),
                },
            ]
        );
    }

    #[test]
    fn test_photo_message_yields_photo_event() {
        let msg = message(json!({
            "photo": [
                {"file_id": "f1", "file_unique_id": "u1", "width": 90, "height": 90, "file_size": 1024}
            ]
        }));

        assert_eq!(
            events_from_message(&msg),
            vec![GateEvent::PhotoReceived {
                chat: ChatId(-1001),
                user: UserId(42),
                username: Some("alice".to_string()),
            }]
        );
    }

    #[test]
    fn test_text_message_is_ignored() {
        let msg = message(json!({"text": "hello"}));
        assert!(events_from_message(&msg).is_empty());
    }
}
