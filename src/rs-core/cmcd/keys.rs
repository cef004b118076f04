use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Every CMCD key this crate may emit.
///
/// The declaration order is the order in which keys are serialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CmcdKey {
    #[serde(rename = "sid")]
    SessionId,
    #[serde(rename = "cid")]
    ContentId,
    #[serde(rename = "v")]
    Version,
    #[serde(rename = "sf")]
    StreamingFormat,
    #[serde(rename = "st")]
    StreamType,
    #[serde(rename = "pr")]
    PlaybackRate,
    #[serde(rename = "br")]
    EncodedBitrate,
    #[serde(rename = "tb")]
    TopBitrate,
    #[serde(rename = "ot")]
    ObjectType,
    #[serde(rename = "d")]
    ObjectDuration,
    #[serde(rename = "bl")]
    BufferLength,
    #[serde(rename = "dl")]
    Deadline,
    #[serde(rename = "mtp")]
    MeasuredThroughput,
    #[serde(rename = "nor")]
    NextObjectRequest,
    #[serde(rename = "su")]
    Startup,
    #[serde(rename = "bs")]
    BufferStarvation,
}

/// CMCD groups its keys in four categories, which are only used here for display purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmcdCategory {
    Object,
    Request,
    Session,
    Status,
}

/// Kind of value associated to a key, as shown next to it in a values panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueUnit {
    Kbps,
    Milliseconds,
    Boolean,
    String,
    Token,
    Decimal,
    Integer,
}

impl ValueUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueUnit::Kbps => "kbps",
            ValueUnit::Milliseconds => "ms",
            ValueUnit::Boolean => "boolean",
            ValueUnit::String => "string",
            ValueUnit::Token => "token",
            ValueUnit::Decimal => "decimal",
            ValueUnit::Integer => "integer",
        }
    }
}

impl CmcdKey {
    pub const ALL: [CmcdKey; 16] = [
        CmcdKey::SessionId,
        CmcdKey::ContentId,
        CmcdKey::Version,
        CmcdKey::StreamingFormat,
        CmcdKey::StreamType,
        CmcdKey::PlaybackRate,
        CmcdKey::EncodedBitrate,
        CmcdKey::TopBitrate,
        CmcdKey::ObjectType,
        CmcdKey::ObjectDuration,
        CmcdKey::BufferLength,
        CmcdKey::Deadline,
        CmcdKey::MeasuredThroughput,
        CmcdKey::NextObjectRequest,
        CmcdKey::Startup,
        CmcdKey::BufferStarvation,
    ];

    /// The key as written on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            CmcdKey::SessionId => "sid",
            CmcdKey::ContentId => "cid",
            CmcdKey::Version => "v",
            CmcdKey::StreamingFormat => "sf",
            CmcdKey::StreamType => "st",
            CmcdKey::PlaybackRate => "pr",
            CmcdKey::EncodedBitrate => "br",
            CmcdKey::TopBitrate => "tb",
            CmcdKey::ObjectType => "ot",
            CmcdKey::ObjectDuration => "d",
            CmcdKey::BufferLength => "bl",
            CmcdKey::Deadline => "dl",
            CmcdKey::MeasuredThroughput => "mtp",
            CmcdKey::NextObjectRequest => "nor",
            CmcdKey::Startup => "su",
            CmcdKey::BufferStarvation => "bs",
        }
    }

    pub fn category(&self) -> CmcdCategory {
        match self {
            CmcdKey::EncodedBitrate
            | CmcdKey::TopBitrate
            | CmcdKey::ObjectType
            | CmcdKey::ObjectDuration => CmcdCategory::Object,
            CmcdKey::BufferLength
            | CmcdKey::Deadline
            | CmcdKey::MeasuredThroughput
            | CmcdKey::NextObjectRequest
            | CmcdKey::Startup => CmcdCategory::Request,
            CmcdKey::SessionId
            | CmcdKey::ContentId
            | CmcdKey::Version
            | CmcdKey::StreamingFormat
            | CmcdKey::StreamType
            | CmcdKey::PlaybackRate => CmcdCategory::Session,
            CmcdKey::BufferStarvation => CmcdCategory::Status,
        }
    }

    /// Human-readable name of the key.
    pub fn label(&self) -> &'static str {
        match self {
            CmcdKey::SessionId => "Session ID",
            CmcdKey::ContentId => "Content ID",
            CmcdKey::Version => "CMCD Version",
            CmcdKey::StreamingFormat => "Streaming Format",
            CmcdKey::StreamType => "Stream Type",
            CmcdKey::PlaybackRate => "Playback Rate",
            CmcdKey::EncodedBitrate => "Encoded Bitrate",
            CmcdKey::TopBitrate => "Top Bitrate",
            CmcdKey::ObjectType => "Object Type",
            CmcdKey::ObjectDuration => "Object Duration",
            CmcdKey::BufferLength => "Buffer Length",
            CmcdKey::Deadline => "Deadline",
            CmcdKey::MeasuredThroughput => "Measured Throughput",
            CmcdKey::NextObjectRequest => "Next Object Request",
            CmcdKey::Startup => "Startup",
            CmcdKey::BufferStarvation => "Buffer Starvation",
        }
    }

    pub fn unit(&self) -> ValueUnit {
        match self {
            CmcdKey::EncodedBitrate | CmcdKey::TopBitrate | CmcdKey::MeasuredThroughput => {
                ValueUnit::Kbps
            }
            CmcdKey::ObjectDuration | CmcdKey::BufferLength | CmcdKey::Deadline => {
                ValueUnit::Milliseconds
            }
            CmcdKey::Startup | CmcdKey::BufferStarvation => ValueUnit::Boolean,
            CmcdKey::SessionId | CmcdKey::ContentId | CmcdKey::NextObjectRequest => {
                ValueUnit::String
            }
            CmcdKey::StreamingFormat | CmcdKey::StreamType | CmcdKey::ObjectType => {
                ValueUnit::Token
            }
            CmcdKey::PlaybackRate => ValueUnit::Decimal,
            CmcdKey::Version => ValueUnit::Integer,
        }
    }
}

impl fmt::Display for CmcdKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for CmcdCategory {
    /// Formatted the way CTA-5004 names its header shards.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CmcdCategory::Object => "CMCD-Object",
                CmcdCategory::Request => "CMCD-Request",
                CmcdCategory::Session => "CMCD-Session",
                CmcdCategory::Status => "CMCD-Status",
            }
        )
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("`{0}` is not a supported CMCD key")]
pub struct UnknownCmcdKey(pub String);

impl FromStr for CmcdKey {
    type Err = UnknownCmcdKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CmcdKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownCmcdKey(s.to_owned()))
    }
}

/// Media type of the requested object (`ot` key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectType {
    Manifest,
    InitSegment,
    Video,
    Audio,
}

impl ObjectType {
    pub fn token(&self) -> &'static str {
        match self {
            ObjectType::Manifest => "m",
            ObjectType::InitSegment => "i",
            ObjectType::Video => "v",
            ObjectType::Audio => "a",
        }
    }

    /// Only media segments carry a meaningful object duration or next object.
    pub fn is_media_segment(&self) -> bool {
        matches!(self, ObjectType::Video | ObjectType::Audio)
    }
}

/// Streaming format of the current content (`sf` key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamingFormat {
    Hls,
    Dash,
    Other,
}

impl StreamingFormat {
    pub fn token(&self) -> &'static str {
        match self {
            StreamingFormat::Hls => "h",
            StreamingFormat::Dash => "d",
            StreamingFormat::Other => "o",
        }
    }
}

/// Whether the content is VOD or live (`st` key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamType {
    Vod,
    Live,
}

impl StreamType {
    pub fn token(&self) -> &'static str {
        match self {
            StreamType::Vod => "v",
            StreamType::Live => "l",
        }
    }
}

/// Readable description of a token value, for display next to the raw token.
///
/// Tokens that CTA-5004 defines but that are never emitted here are still described, as they
/// may be found in decoded requests coming from other players.
pub fn describe_token(key: CmcdKey, token: &str) -> Option<&'static str> {
    match (key, token) {
        (CmcdKey::ObjectType, "m") => Some("manifest"),
        (CmcdKey::ObjectType, "i") => Some("init"),
        (CmcdKey::ObjectType, "v") => Some("video"),
        (CmcdKey::ObjectType, "a") => Some("audio"),
        (CmcdKey::ObjectType, "av") => Some("audio+video"),
        (CmcdKey::ObjectType, "c") => Some("caption"),
        (CmcdKey::ObjectType, "tt") => Some("text track"),
        (CmcdKey::ObjectType, "k") => Some("key"),
        (CmcdKey::ObjectType, "o") => Some("other"),
        (CmcdKey::StreamingFormat, "d") => Some("DASH"),
        (CmcdKey::StreamingFormat, "h") => Some("HLS"),
        (CmcdKey::StreamingFormat, "s") => Some("Smooth Streaming"),
        (CmcdKey::StreamingFormat, "o") => Some("other"),
        (CmcdKey::StreamType, "v") => Some("VOD"),
        (CmcdKey::StreamType, "l") => Some("Live"),
        _ => None,
    }
}
