//! Message content model and classification.

/// Caption limit for photos, documents, videos and audio.
pub const MEDIA_CAPTION_LIMIT: usize = 1024;

/// Caption limit for voice messages.
pub const VOICE_CAPTION_LIMIT: usize = 200;

/// Opaque provider-issued file handle, re-sendable without re-upload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileRef {
    fn from(s: &str) -> Self {
        FileRef(s.to_string())
    }
}

/// Exactly one content kind per message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text { text: Option<String> },
    Photo { file: FileRef, caption: Option<String> },
    Document { file: FileRef, caption: Option<String> },
    Video { file: FileRef, caption: Option<String> },
    Audio { file: FileRef, caption: Option<String> },
    Voice { file: FileRef, caption: Option<String> },
    VideoNote { file: FileRef },
    Sticker { file: FileRef },
}

/// Attachment kinds that carry a caption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptionedKind {
    Photo,
    Document,
    Video,
    Audio,
    Voice,
}

impl CaptionedKind {
    pub fn caption_limit(self) -> usize {
        match self {
            CaptionedKind::Voice => VOICE_CAPTION_LIMIT,
            _ => MEDIA_CAPTION_LIMIT,
        }
    }
}

/// Attachment kinds that cannot carry a caption at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BareKind {
    VideoNote,
    Sticker,
}

/// Borrowed view used by the dispatch code to pick a send path.
#[derive(Clone, Copy, Debug)]
pub enum ContentView<'a> {
    Text(Option<&'a str>),
    Captioned {
        kind: CaptionedKind,
        file: &'a FileRef,
        caption: Option<&'a str>,
    },
    Bare {
        kind: BareKind,
        file: &'a FileRef,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text {
            text: Some(text.into()),
        }
    }

    pub fn view(&self) -> ContentView<'_> {
        use ContentView::{Bare, Captioned};
        match self {
            Content::Text { text } => ContentView::Text(text.as_deref()),
            Content::Photo { file, caption } => Captioned {
                kind: CaptionedKind::Photo,
                file,
                caption: caption.as_deref(),
            },
            Content::Document { file, caption } => Captioned {
                kind: CaptionedKind::Document,
                file,
                caption: caption.as_deref(),
            },
            Content::Video { file, caption } => Captioned {
                kind: CaptionedKind::Video,
                file,
                caption: caption.as_deref(),
            },
            Content::Audio { file, caption } => Captioned {
                kind: CaptionedKind::Audio,
                file,
                caption: caption.as_deref(),
            },
            Content::Voice { file, caption } => Captioned {
                kind: CaptionedKind::Voice,
                file,
                caption: caption.as_deref(),
            },
            Content::VideoNote { file } => Bare {
                kind: BareKind::VideoNote,
                file,
            },
            Content::Sticker { file } => Bare {
                kind: BareKind::Sticker,
                file,
            },
        }
    }

    /// Short label for logs and audit entries.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Content::Text { .. } => "text",
            Content::Photo { .. } => "photo",
            Content::Document { .. } => "document",
            Content::Video { .. } => "video",
            Content::Audio { .. } => "audio",
            Content::Voice { .. } => "voice",
            Content::VideoNote { .. } => "video_note",
            Content::Sticker { .. } => "sticker",
        }
    }

    /// Text or caption, whichever the message carries.
    pub fn text_or_caption(&self) -> Option<&str> {
        match self.view() {
            ContentView::Text(t) => t,
            ContentView::Captioned { caption, .. } => caption,
            ContentView::Bare { .. } => None,
        }
    }

    /// `/start`, `/start@bot_name` or `/start <payload>`.
    pub fn is_start_command(&self) -> bool {
        let Content::Text { text: Some(text) } = self else {
            return false;
        };
        let Some(first) = text.split_whitespace().next() else {
            return false;
        };
        match first.strip_prefix("/start") {
            Some("") => true,
            Some(rest) => rest.starts_with('@') && rest.len() > 1,
            None => false,
        }
    }
}

/// Raw attachment fields as an inbound message exposes them.
///
/// Several may be present at once on some providers; `classify` picks one.
#[derive(Clone, Debug, Default)]
pub struct ContentFields {
    pub photo: Option<String>,
    pub document: Option<String>,
    pub video: Option<String>,
    pub audio: Option<String>,
    pub voice: Option<String>,
    pub video_note: Option<String>,
    pub sticker: Option<String>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl ContentFields {
    /// Precedence: photo > document > video > audio > voice > video note
    /// > sticker > text. Anything else falls back to text built from the
    /// text or caption field.
    pub fn classify(self) -> Content {
        let ContentFields {
            photo,
            document,
            video,
            audio,
            voice,
            video_note,
            sticker,
            text,
            caption,
        } = self;

        if let Some(f) = photo {
            return Content::Photo {
                file: FileRef(f),
                caption,
            };
        }
        if let Some(f) = document {
            return Content::Document {
                file: FileRef(f),
                caption,
            };
        }
        if let Some(f) = video {
            return Content::Video {
                file: FileRef(f),
                caption,
            };
        }
        if let Some(f) = audio {
            return Content::Audio {
                file: FileRef(f),
                caption,
            };
        }
        if let Some(f) = voice {
            return Content::Voice {
                file: FileRef(f),
                caption,
            };
        }
        if let Some(f) = video_note {
            return Content::VideoNote { file: FileRef(f) };
        }
        if let Some(f) = sticker {
            return Content::Sticker { file: FileRef(f) };
        }
        Content::Text {
            text: text.or(caption),
        }
    }
}

/// Truncate to at most `max` chars without splitting a char.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
