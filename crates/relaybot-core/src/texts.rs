//! Fixed user- and operator-facing texts.

pub const DEFAULT_WELCOME: &str = "💬 Good day!\n\n\
Thank you for reaching out 💛\n\n\
Please write your question and an operator will answer you shortly.";

pub const DEFAULT_CONFIRMATION: &str = "✨ Your message has been received!\n\n\
Our team is already looking at it and you will get an answer very soon 🤍";

pub const DEFAULT_START_PROMPT: &str = "👋 Hi! Send the /start command to begin.";

pub const DEFAULT_FAILURE: &str =
    "❌ Something went wrong while sending your message. Please try again later.";

pub const DEFAULT_REPLY_ACK: &str = "✅ Reply delivered to the user";

pub const DEFAULT_OPERATOR_REPLY_FALLBACK: &str = "Operator reply";

/// Texts the relay sends on its own behalf.
///
/// Deployments override the user-facing ones through config; the operator
/// acknowledgment and the empty-reply fallback keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texts {
    pub welcome: String,
    pub confirmation: String,
    pub start_prompt: String,
    pub failure: String,
    pub reply_ack: String,
    pub operator_reply_fallback: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            welcome: DEFAULT_WELCOME.to_string(),
            confirmation: DEFAULT_CONFIRMATION.to_string(),
            start_prompt: DEFAULT_START_PROMPT.to_string(),
            failure: DEFAULT_FAILURE.to_string(),
            reply_ack: DEFAULT_REPLY_ACK.to_string(),
            operator_reply_fallback: DEFAULT_OPERATOR_REPLY_FALLBACK.to_string(),
        }
    }
}

impl Texts {
    /// Failure notice sent back to an operator whose reply could not be delivered.
    pub fn reply_failed(&self, error: &str) -> String {
        format!("❌ Failed to deliver the reply: {error}")
    }
}
