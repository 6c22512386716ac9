//! Telegram adapter (teloxide).
//!
//! This crate implements the `relaybot-core` Channel port over the Telegram
//! Bot API and feeds inbound updates into the relay engine.

use async_trait::async_trait;

use teloxide::{prelude::*, types::InputFile};

use tokio::time::sleep;

pub mod inbound;
pub mod router;

use relaybot_core::{
    channel::Channel,
    content::FileRef,
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    Result,
};

#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_file(file: &FileRef) -> InputFile {
        InputFile::file_id(file.as_str().to_string())
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Delivery(format!("telegram error: {e}"))
    }

    fn message_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_photo(Self::tg_chat(chat_id), Self::tg_file(file));
                if let Some(c) = caption {
                    req = req.caption(c.to_string());
                }
                req
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_document(Self::tg_chat(chat_id), Self::tg_file(file));
                if let Some(c) = caption {
                    req = req.caption(c.to_string());
                }
                req
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_video(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_video(Self::tg_chat(chat_id), Self::tg_file(file));
                if let Some(c) = caption {
                    req = req.caption(c.to_string());
                }
                req
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_audio(Self::tg_chat(chat_id), Self::tg_file(file));
                if let Some(c) = caption {
                    req = req.caption(c.to_string());
                }
                req
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_voice(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_voice(Self::tg_chat(chat_id), Self::tg_file(file));
                if let Some(c) = caption {
                    req = req.caption(c.to_string());
                }
                req
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_video_note(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_video_note(Self::tg_chat(chat_id), Self::tg_file(file))
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_sticker(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_sticker(Self::tg_chat(chat_id), Self::tg_file(file))
            })
            .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }
}
