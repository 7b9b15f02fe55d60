//! Input format and MIME type mapping
//!
//! The transcoder is told what demuxer to use for the inbound byte stream via
//! a format tag; that tag comes from the upload request's `Content-Type`.
//! Stored artifacts are served back with a MIME type derived from their file
//! extension.

/// Map an upload `Content-Type` to the transcoder input format tag.
///
/// Parameters after the media type (`audio/ogg; codecs=opus`) are ignored.
/// Returns `None` for types the pipeline cannot ingest.
pub fn format_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    match essence {
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/ogg" | "application/ogg" => Some("ogg"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        "audio/aac" | "audio/aacp" => Some("aac"),
        "audio/webm" | "video/webm" => Some("webm"),
        "audio/mp4" | "audio/x-m4a" => Some("mp4"),
        _ => None,
    }
}

/// MIME type for serving a stored artifact, from its file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "webm" => "audio/webm",
        "mp4" | "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}
