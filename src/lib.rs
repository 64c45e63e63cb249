//! Incremental MIME multipart streaming with async-first design.
//!
//! This crate parses multipart content (including `multipart/related` and
//! XOP packages) from a line-oriented byte stream without holding the whole
//! message in memory:
//! - Boundary recognition, with the boundary discovered from the first
//!   part's `Content-Type` when it is not known up front
//! - Lazy, bounded per-part body readers that stop exactly at the next boundary
//! - Automatic draining of unread bodies before moving to the next part
//! - An XOP wrapper that preloads the manifest part
//!
//! Bodies are opaque bytes; transfer encodings are not decoded.
//!
//! All I/O operations are async-first using tokio.

pub mod config;
pub mod content;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod header;
pub mod line;
pub mod media_type;
pub mod streamer;
pub mod xop;

// Re-export commonly used types
pub use config::{LeadingContent, StreamerConfig, Termination};
pub use content::Content;
pub use cursor::LineCursor;
pub use engine::Boundary;
pub use error::{Error, Result};
pub use header::HeaderMap;
pub use line::{Line, LineCodec, LineEnding};
pub use media_type::parse_media_type;
pub use streamer::{BodyLines, MimeStreamer, OwnedPart, Part, ReaderLines};
pub use xop::XopStreamer;
