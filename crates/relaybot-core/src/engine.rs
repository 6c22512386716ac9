//! Relay engine: routes each inbound message to the right flow.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use crate::{
    audit::{AuditEvent, AuditLogger},
    channel::Channel,
    config::Config,
    conversation::ConversationStore,
    domain::{ChatId, InboundMessage, UserId},
    fanout::{FanoutDispatcher, FanoutReport},
    locks::UserLocks,
    reply_router::{ReplyOutcome, ReplyRouter},
    reply_table::ReplyTable,
    texts::Texts,
};

/// What the engine did with one inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    Reply(ReplyOutcome),
    Started { welcome_sent: bool },
    Forwarded(FanoutReport),
    PromptedStart,
}

pub struct RelayEngine {
    operators: HashSet<UserId>,
    channel: Arc<dyn Channel>,
    texts: Arc<Texts>,
    conversations: Arc<ConversationStore>,
    table: Arc<ReplyTable>,
    locks: UserLocks,
    fanout: FanoutDispatcher,
    router: ReplyRouter,
    audit: Option<AuditLogger>,
}

impl RelayEngine {
    /// `operators` keeps its order for fan-out; duplicates are the caller's problem.
    pub fn new(
        channel: Arc<dyn Channel>,
        operators: &[UserId],
        texts: Texts,
        legacy_reply_lookup: bool,
    ) -> Self {
        let texts = Arc::new(texts);
        let conversations = Arc::new(ConversationStore::new());
        let table = Arc::new(ReplyTable::new(legacy_reply_lookup));

        let fanout = FanoutDispatcher::new(
            channel.clone(),
            conversations.clone(),
            table.clone(),
            operators.iter().map(|&u| ChatId::from(u)).collect(),
            texts.clone(),
        );
        let router = ReplyRouter::new(channel.clone(), table.clone(), texts.clone());

        Self {
            operators: operators.iter().copied().collect(),
            channel,
            texts,
            conversations,
            table,
            locks: UserLocks::default(),
            fanout,
            router,
            audit: None,
        }
    }

    pub fn from_config(cfg: &Config, channel: Arc<dyn Channel>) -> Self {
        let engine = Self::new(
            channel,
            &cfg.operator_ids,
            cfg.texts.clone(),
            cfg.legacy_reply_lookup,
        );
        match &cfg.audit_log_path {
            Some(path) => engine.with_audit(AuditLogger::new(path.clone(), cfg.audit_log_json)),
            None => engine,
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn is_operator(&self, user: UserId) -> bool {
        self.operators.contains(&user)
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn reply_table(&self) -> &ReplyTable {
        &self.table
    }

    /// Route one message. Delivery problems are handled inside the flows,
    /// so there is nothing for the caller to recover from.
    pub async fn handle(&self, msg: InboundMessage, now: DateTime<FixedOffset>) -> Routed {
        let sender = &msg.sender;

        if self.is_operator(sender.user_id) {
            let outcome = self.router.route(&msg).await;
            self.audit_reply(&msg, &outcome);
            return Routed::Reply(outcome);
        }

        let _guard = self.locks.lock_user(sender.user_id).await;

        if msg.content.is_start_command() {
            self.conversations.start(sender.user_id).await;
            let welcome_sent = match self.channel.send_text(msg.chat_id, &self.texts.welcome).await
            {
                Ok(_) => true,
                Err(e) => {
                    warn!(user_id = sender.user_id.0, "failed to send welcome: {e}");
                    false
                }
            };
            info!(
                user_id = sender.user_id.0,
                username = sender.handle(),
                "user started a conversation"
            );
            self.audit(AuditEvent::start(sender));
            return Routed::Started { welcome_sent };
        }

        if self.conversations.state(sender.user_id).await.started() {
            let report = self.fanout.dispatch(&msg, &now).await;
            self.audit(AuditEvent::forwarded(
                sender,
                msg.content.kind_label(),
                msg.content.text_or_caption(),
                report.delivered.len(),
                report.failed.len(),
            ));
            return Routed::Forwarded(report);
        }

        if let Err(e) = self
            .channel
            .send_text(msg.chat_id, &self.texts.start_prompt)
            .await
        {
            warn!(user_id = sender.user_id.0, "failed to send start prompt: {e}");
        }
        self.audit(AuditEvent::prompt_start(sender));
        Routed::PromptedStart
    }

    fn audit_reply(&self, msg: &InboundMessage, outcome: &ReplyOutcome) {
        let (user, error) = match outcome {
            ReplyOutcome::Delivered { user, .. } => (*user, None),
            ReplyOutcome::Failed { user, error } => (*user, Some(error.as_str())),
            ReplyOutcome::NotAReply | ReplyOutcome::Unresolved { .. } => return,
        };
        self.audit(AuditEvent::reply(
            &msg.sender,
            user.0,
            msg.content.kind_label(),
            msg.content.text_or_caption(),
            error,
        ));
    }

    fn audit(&self, event: AuditEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Err(e) = audit.write(event) {
            warn!("audit log write failed: {e}");
        }
    }
}
