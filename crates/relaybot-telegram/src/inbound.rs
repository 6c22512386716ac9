//! teloxide `Message` -> core `InboundMessage`.

use teloxide::types::{Message, User};

use relaybot_core::{
    content::ContentFields,
    domain::{ChatId, InboundMessage, MessageId, Sender, UserId},
};

/// Messages without a sender (channel posts) are not relayed.
pub fn to_inbound(msg: &Message) -> Option<InboundMessage> {
    let user = msg.from()?;

    let fields = ContentFields {
        // Telegram lists photo sizes smallest first.
        photo: msg
            .photo()
            .and_then(|sizes| sizes.last())
            .map(|p| p.file.id.clone()),
        document: msg.document().map(|d| d.file.id.clone()),
        video: msg.video().map(|v| v.file.id.clone()),
        audio: msg.audio().map(|a| a.file.id.clone()),
        voice: msg.voice().map(|v| v.file.id.clone()),
        video_note: msg.video_note().map(|v| v.file.id.clone()),
        sticker: msg.sticker().map(|s| s.file.id.clone()),
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
    };

    let mut inbound = InboundMessage::new(ChatId(msg.chat.id.0), sender(user), fields.classify());
    if let Some(replied) = msg.reply_to_message() {
        inbound = inbound.replying_to(MessageId(replied.id.0));
    }
    Some(inbound)
}

fn sender(user: &User) -> Sender {
    Sender {
        user_id: UserId(user.id.0 as i64),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

#[cfg(test)]
mod tests {
    use relaybot_core::content::{Content, FileRef};

    use super::*;

    fn parse(v: serde_json::Value) -> Message {
        serde_json::from_value(v).unwrap()
    }

    fn user_json() -> serde_json::Value {
        serde_json::json!({
            "id": 500,
            "is_bot": false,
            "first_name": "Ann",
            "last_name": "Lee",
            "username": "ann"
        })
    }

    fn chat_json() -> serde_json::Value {
        serde_json::json!({ "id": 500, "type": "private", "first_name": "Ann" })
    }

    #[test]
    fn text_reply_keeps_sender_and_reply_target() {
        let msg = parse(serde_json::json!({
            "message_id": 12,
            "date": 1_700_000_000,
            "chat": chat_json(),
            "from": user_json(),
            "text": "thanks",
            "reply_to_message": {
                "message_id": 7,
                "date": 1_699_999_000,
                "chat": chat_json(),
                "from": user_json(),
                "text": "earlier"
            }
        }));

        let inbound = to_inbound(&msg).unwrap();
        assert_eq!(inbound.chat_id, ChatId(500));
        assert_eq!(inbound.sender.user_id, UserId(500));
        assert_eq!(inbound.sender.last_name.as_deref(), Some("Lee"));
        assert_eq!(inbound.sender.username.as_deref(), Some("ann"));
        assert_eq!(inbound.content, Content::text("thanks"));
        assert_eq!(inbound.reply_to, Some(MessageId(7)));
    }

    #[test]
    fn photo_uses_largest_size_and_caption() {
        let msg = parse(serde_json::json!({
            "message_id": 13,
            "date": 1_700_000_000,
            "chat": chat_json(),
            "from": user_json(),
            "caption": "receipt",
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 100 },
                { "file_id": "large", "file_unique_id": "l", "width": 800, "height": 800, "file_size": 9000 }
            ]
        }));

        let inbound = to_inbound(&msg).unwrap();
        assert_eq!(
            inbound.content,
            Content::Photo {
                file: FileRef::from("large"),
                caption: Some("receipt".to_string())
            }
        );
        assert_eq!(inbound.reply_to, None);
    }
}
