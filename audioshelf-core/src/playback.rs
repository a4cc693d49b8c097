//! Resolving file references for playback

use std::ops::Range;

/// How a file reference should be delivered to a player
#[derive(Debug, Clone, PartialEq)]
pub enum Playback {
    /// The bytes live elsewhere; send the client to this URL
    Redirect(String),

    /// Stream the blob from our own store
    Stream(AudioFile),
}

/// A stored audio blob ready to be streamed
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    pub file_ref: String,
    pub size: u64,
    pub content_type: String,
    pub file_name: String,
}

/// A single `Range: bytes=` request, before it is checked against a length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start_inclusive: Option<u64>,
    end_inclusive: Option<u64>,
}

impl ByteRange {
    pub fn new(start_inclusive: Option<u64>, end_inclusive: Option<u64>) -> Self {
        Self {
            start_inclusive,
            end_inclusive,
        }
    }

    /// Parse a `Range` header value. Multi-range and malformed values yield
    /// `None`, which callers treat as "no range" and serve the whole blob.
    pub fn parse(s: &str) -> Option<Self> {
        let v = s.trim().strip_prefix("bytes=")?;
        let (start, end) = v.split_once('-')?;
        if end.contains('-') || v.contains(',') {
            return None;
        }

        let start = match start.trim() {
            "" => None,
            s => Some(s.parse::<u64>().ok()?),
        };
        let end = match end.trim() {
            "" => None,
            s => Some(s.parse::<u64>().ok()?),
        };
        if start.is_none() && end.is_none() {
            return None;
        }
        Some(Self::new(start, end))
    }

    /// Resolve against a blob of `len` bytes into a half-open span.
    ///
    /// Returns `None` when the range cannot be satisfied. A suffix range
    /// (`bytes=-N`) selects the last `N` bytes.
    pub fn resolve(&self, len: u64) -> Option<Range<u64>> {
        if len == 0 {
            return None;
        }
        let last = len - 1;
        let (start, end) = match (self.start_inclusive, self.end_inclusive) {
            (Some(start), Some(end)) => (start, end.min(last)),
            (Some(start), None) => (start, last),
            (None, Some(0)) => return None,
            (None, Some(suffix)) => (len.saturating_sub(suffix), last),
            (None, None) => (0, last),
        };
        if start > end {
            return None;
        }
        Some(start..end + 1)
    }
}

/// Pick an audio content type, sniffing the bytes before falling back to the extension
pub fn audio_content_type(data: &[u8], file_name: &str) -> String {
    if let Some(kind) = infer::get(data) {
        if kind.mime_type().starts_with("audio/") {
            return kind.mime_type().to_string();
        }
    }

    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("m4a") | Some("m4b") | Some("mp4") => "audio/mp4",
        Some("ogg") | Some("oga") | Some("opus") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("aac") => "audio/aac",
        Some("webm") => "audio/webm",
        _ => "audio/mpeg",
    }
    .to_string()
}
