//! Outbound messaging port (Telegram today).

pub mod throttled;

use async_trait::async_trait;

use crate::{
    content::{BareKind, CaptionedKind, FileRef},
    domain::{ChatId, MessageRef},
    Result,
};

/// Hexagonal port for everything the relay sends.
///
/// Media are re-sent by provider file handle; every call returns the id the
/// provider assigned to the new message so replies to it can be resolved.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef>;
    async fn send_document(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef>;
    async fn send_video(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef>;
    async fn send_audio(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef>;
    async fn send_voice(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef>;

    async fn send_video_note(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef>;
    async fn send_sticker(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef>;
}

/// Send a caption-capable attachment through the matching port method.
pub async fn send_captioned(
    channel: &dyn Channel,
    chat_id: ChatId,
    kind: CaptionedKind,
    file: &FileRef,
    caption: Option<&str>,
) -> Result<MessageRef> {
    match kind {
        CaptionedKind::Photo => channel.send_photo(chat_id, file, caption).await,
        CaptionedKind::Document => channel.send_document(chat_id, file, caption).await,
        CaptionedKind::Video => channel.send_video(chat_id, file, caption).await,
        CaptionedKind::Audio => channel.send_audio(chat_id, file, caption).await,
        CaptionedKind::Voice => channel.send_voice(chat_id, file, caption).await,
    }
}

pub async fn send_bare(
    channel: &dyn Channel,
    chat_id: ChatId,
    kind: BareKind,
    file: &FileRef,
) -> Result<MessageRef> {
    match kind {
        BareKind::VideoNote => channel.send_video_note(chat_id, file).await,
        BareKind::Sticker => channel.send_sticker(chat_id, file).await,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording fake shared by the engine tests.

    use std::{
        collections::{HashMap, HashSet},
        sync::{Arc, Mutex},
    };

    use tokio::sync::Notify;

    use super::*;
    use crate::{domain::MessageId, errors::Error};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Sent {
        pub chat_id: ChatId,
        pub message_id: MessageId,
        pub kind: &'static str,
        pub file: Option<String>,
        pub text: Option<String>,
    }

    #[derive(Default)]
    pub struct FakeChannel {
        next_id: Mutex<i32>,
        sent: Mutex<Vec<Sent>>,
        failing: Mutex<HashSet<ChatId>>,
        stalled: Mutex<HashMap<ChatId, Arc<Notify>>>,
    }

    impl FakeChannel {
        pub fn new() -> Self {
            Self {
                next_id: Mutex::new(1),
                ..Default::default()
            }
        }

        /// Every send to `chat_id` fails from now on.
        pub fn fail_chat(&self, chat_id: ChatId) {
            self.failing.lock().unwrap().insert(chat_id);
        }

        /// Each send to `chat_id` blocks until the returned handle is notified.
        pub fn stall_chat(&self, chat_id: ChatId) -> Arc<Notify> {
            self.stalled
                .lock()
                .unwrap()
                .entry(chat_id)
                .or_insert_with(|| Arc::new(Notify::new()))
                .clone()
        }

        async fn gate(&self, chat_id: ChatId) {
            let stall = self.stalled.lock().unwrap().get(&chat_id).cloned();
            if let Some(stall) = stall {
                stall.notified().await;
            }
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        pub fn sent_to(&self, chat_id: ChatId) -> Vec<Sent> {
            self.sent()
                .into_iter()
                .filter(|s| s.chat_id == chat_id)
                .collect()
        }

        fn push(
            &self,
            chat_id: ChatId,
            kind: &'static str,
            file: Option<&FileRef>,
            text: Option<&str>,
        ) -> Result<MessageRef> {
            if self.failing.lock().unwrap().contains(&chat_id) {
                return Err(Error::Delivery(format!("chat {} unreachable", chat_id.0)));
            }
            let message_id = {
                let mut guard = self.next_id.lock().unwrap();
                let id = MessageId(*guard);
                *guard += 1;
                id
            };
            self.sent.lock().unwrap().push(Sent {
                chat_id,
                message_id,
                kind,
                file: file.map(|f| f.0.clone()),
                text: text.map(|t| t.to_string()),
            });
            Ok(MessageRef {
                chat_id,
                message_id,
            })
        }
    }

    #[async_trait]
    impl Channel for FakeChannel {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "text", None, Some(text))
        }

        async fn send_photo(
            &self,
            chat_id: ChatId,
            file: &FileRef,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "photo", Some(file), caption)
        }

        async fn send_document(
            &self,
            chat_id: ChatId,
            file: &FileRef,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "document", Some(file), caption)
        }

        async fn send_video(
            &self,
            chat_id: ChatId,
            file: &FileRef,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "video", Some(file), caption)
        }

        async fn send_audio(
            &self,
            chat_id: ChatId,
            file: &FileRef,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "audio", Some(file), caption)
        }

        async fn send_voice(
            &self,
            chat_id: ChatId,
            file: &FileRef,
            caption: Option<&str>,
        ) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "voice", Some(file), caption)
        }

        async fn send_video_note(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "video_note", Some(file), None)
        }

        async fn send_sticker(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef> {
            self.gate(chat_id).await;
            self.push(chat_id, "sticker", Some(file), None)
        }
    }
}
