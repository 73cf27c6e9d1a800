//! quizclips Excerpt Engine
//!
//! Turns catalog records into short audio excerpts by driving two external
//! tools, one record at a time.
//!
//! # Pipeline Architecture
//!
//! ```text
//! record ──┐
//!          ├── output exists? ── yes ──► Skipped
//!          │        │
//!          │        no
//!          │        ▼
//!          ├── yt-dlp (audio only) ──► temp_audio/{stem}.{mp3|webm|m4a}
//!          │                                   │
//!          │                                   ▼
//!          └── ffmpeg (-ss 30 -t 60) ──► audio/{stem}.mp3 ──► Done
//!
//! successful records ──► music_database.json
//! ```

pub mod deps;
pub mod fetch;
pub mod pipeline;
pub mod processor;
pub mod report;
pub mod sibling;
pub mod tools;
pub mod trim;

pub use pipeline::*;
pub use processor::*;
pub use report::*;
pub use tools::*;
