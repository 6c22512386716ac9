use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    channel::Channel,
    content::FileRef,
    domain::{ChatId, MessageRef},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat (Telegram 1 msg/sec style limits).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// Channel decorator that rate-limits outbound calls.
///
/// Fan-out to several operators bursts one call per operator chat, so the
/// per-chat limit rarely bites there; the global limit keeps the whole bot
/// under the provider's flood threshold.
pub struct ThrottledChannel {
    inner: Arc<dyn Channel>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledChannel {
    pub fn new(inner: Arc<dyn Channel>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_chat(&self, chat_id: ChatId) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id.0).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl Channel for ThrottledChannel {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_text(chat_id, text).await
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_photo(chat_id, file, caption).await
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_document(chat_id, file, caption).await
    }

    async fn send_video(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_video(chat_id, file, caption).await
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_audio(chat_id, file, caption).await
    }

    async fn send_voice(
        &self,
        chat_id: ChatId,
        file: &FileRef,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_voice(chat_id, file, caption).await
    }

    async fn send_video_note(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_video_note(chat_id, file).await
    }

    async fn send_sticker(&self, chat_id: ChatId, file: &FileRef) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_sticker(chat_id, file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::FakeChannel;

    #[test]
    fn limiter_spaces_reservations() {
        let mut lim = IntervalLimiter::new(Duration::from_secs(10));
        assert!(lim.reserve().is_zero());
        let second = lim.reserve();
        assert!(second > Duration::from_secs(9));
        assert!(second <= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn forwards_to_inner_channel() {
        let fake = Arc::new(FakeChannel::new());
        let throttled = ThrottledChannel::new(
            fake.clone(),
            ThrottleConfig {
                global_min_interval: Duration::ZERO,
                per_chat_min_interval: Duration::ZERO,
            },
        );

        throttled.send_text(ChatId(5), "hi").await.unwrap();
        throttled
            .send_sticker(ChatId(5), &FileRef::from("st"))
            .await
            .unwrap();

        let sent = fake.sent_to(ChatId(5));
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, "text");
        assert_eq!(sent[1].kind, "sticker");
    }
}
