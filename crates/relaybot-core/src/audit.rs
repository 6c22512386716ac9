use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{domain::Sender, errors::Error, Result};

const AUDIT_MAX_TEXT: usize = 500;

/// One line (or block) of the relay audit log.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    fn base(event: &str, sender: &Sender) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            user_id: Some(sender.user_id.0),
            username: Some(sender.handle().to_string()),
            operator_id: None,
            message_type: None,
            content: None,
            delivered: None,
            failed: None,
            error: None,
        }
    }

    pub fn start(sender: &Sender) -> Self {
        Self::base("start", sender)
    }

    pub fn prompt_start(sender: &Sender) -> Self {
        Self::base("prompt_start", sender)
    }

    pub fn forwarded(
        sender: &Sender,
        message_type: &str,
        content: Option<&str>,
        delivered: usize,
        failed: usize,
    ) -> Self {
        Self {
            message_type: Some(message_type.to_string()),
            content: content.map(|s| s.to_string()),
            delivered: Some(delivered),
            failed: Some(failed),
            ..Self::base("forwarded", sender)
        }
    }

    /// Operator reply; `user_id` is the resolved end-user.
    pub fn reply(
        operator: &Sender,
        user_id: i64,
        message_type: &str,
        content: Option<&str>,
        error: Option<&str>,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            operator_id: Some(operator.user_id.0),
            message_type: Some(message_type.to_string()),
            content: content.map(|s| s.to_string()),
            error: error.map(|s| s.to_string()),
            ..Self::base(if error.is_some() { "delivery_error" } else { "reply" }, operator)
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.content {
            event.content = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::UserId;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.log"))
    }

    #[test]
    fn truncate_text_adds_ellipsis() {
        let s = "a".repeat(AUDIT_MAX_TEXT + 10);
        let t = truncate_text(&s, AUDIT_MAX_TEXT);
        assert!(t.ends_with("..."));
        assert_eq!(t.chars().count(), AUDIT_MAX_TEXT + 3);
        assert_eq!(truncate_text("short", AUDIT_MAX_TEXT), "short");
    }

    #[test]
    fn json_lines_are_truncated_on_write() {
        let log = AuditLogger::new(tmp_file("relay-audit-json"), true);
        let sender = Sender::new(UserId(5), "Ann").with_username("ann");
        let body = "x".repeat(AUDIT_MAX_TEXT + 1);
        log.write(AuditEvent::forwarded(&sender, "text", Some(&body), 2, 1))
            .unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        let v: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(v["event"], "forwarded");
        assert_eq!(v["user_id"], 5);
        assert_eq!(v["delivered"], 2);
        assert!(v["content"].as_str().unwrap().ends_with("..."));
        assert!(v.get("error").is_none());
        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn failed_reply_is_a_delivery_error_block() {
        let log = AuditLogger::new(tmp_file("relay-audit-text"), false);
        let operator = Sender::new(UserId(1), "Op");
        log.write(AuditEvent::reply(&operator, 42, "sticker", None, Some("blocked")))
            .unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        assert!(written.contains("event: delivery_error"));
        assert!(written.contains("operator_id: 1"));
        assert!(written.contains("user_id: 42"));
        assert!(written.contains("error: blocked"));
        let _ = std::fs::remove_file(log.path());
    }
}
