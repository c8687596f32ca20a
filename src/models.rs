use serde::{Deserialize, Serialize};

// ===== Sentinels =====

/// Shown for messages whose only content is one or more attachments.
pub const ATTACHMENT_SENTINEL: &str = "[Attachment]";

/// Shown for tapbacks, group events and other content-free system rows.
pub const REACTION_OR_SYSTEM_SENTINEL: &str = "[Reaction or system message]";

/// Shown when a payload was present but no text could be recovered from it.
pub const UNABLE_TO_PARSE_SENTINEL: &str = "[Unable to parse message content]";

// ===== Source Records =====

/// A message row as read from the platform message store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessageRecord {
    pub id: i64,
    #[serde(default)]
    pub text: Option<String>,
    /// Raw `attributedBody` archive, base64 encoded on the wire.
    #[serde(default, with = "base64_bytes")]
    pub attributed_body: Option<Vec<u8>>,
    #[serde(default)]
    pub attachment_count: u32,
}

// ===== Resolved Text =====

/// Where a message's display text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Verbatim,
    Extracted,
    Attachment,
    ReactionOrSystem,
    UnableToParse,
}

/// Final display text for a message. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMessageText {
    Verbatim(String),
    Extracted(String),
    Attachment,
    ReactionOrSystem,
    UnableToParse,
}

impl ResolvedMessageText {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedMessageText::Verbatim(text) | ResolvedMessageText::Extracted(text) => text,
            ResolvedMessageText::Attachment => ATTACHMENT_SENTINEL,
            ResolvedMessageText::ReactionOrSystem => REACTION_OR_SYSTEM_SENTINEL,
            ResolvedMessageText::UnableToParse => UNABLE_TO_PARSE_SENTINEL,
        }
    }

    pub fn source(&self) -> TextSource {
        match self {
            ResolvedMessageText::Verbatim(_) => TextSource::Verbatim,
            ResolvedMessageText::Extracted(_) => TextSource::Extracted,
            ResolvedMessageText::Attachment => TextSource::Attachment,
            ResolvedMessageText::ReactionOrSystem => TextSource::ReactionOrSystem,
            ResolvedMessageText::UnableToParse => TextSource::UnableToParse,
        }
    }
}

impl std::fmt::Display for ResolvedMessageText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ResolvedMessageText> for String {
    fn from(resolved: ResolvedMessageText) -> Self {
        match resolved {
            ResolvedMessageText::Verbatim(text) | ResolvedMessageText::Extracted(text) => text,
            sentinel => sentinel.as_str().to_string(),
        }
    }
}

// ===== Imported Rows =====

/// A message ready to be written to the application's message table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedMessage {
    pub id: i64,
    pub text: String,
    pub source: TextSource,
}

impl ImportedMessage {
    pub fn new(id: i64, resolved: ResolvedMessageText) -> Self {
        let source = resolved.source();
        Self {
            id,
            text: resolved.into(),
            source,
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded.trim()))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
