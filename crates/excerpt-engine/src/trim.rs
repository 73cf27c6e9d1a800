//! Fixed-window excerpt encoding.

use std::path::Path;
use std::time::Duration;

use quizclips_common::config::ExcerptConfig;

use crate::tools::ToolInvocation;

/// Encode settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct ExcerptPolicy {
    pub program: String,
    pub offset_secs: u32,
    pub duration_secs: u32,
    pub codec: String,
    pub bitrate: String,
    pub timeout: Duration,
}

impl From<&ExcerptConfig> for ExcerptPolicy {
    fn from(config: &ExcerptConfig) -> Self {
        Self {
            program: config.program.clone(),
            offset_secs: config.offset_secs,
            duration_secs: config.duration_secs,
            codec: config.codec.clone(),
            bitrate: config.bitrate.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for ExcerptPolicy {
    fn default() -> Self {
        Self::from(&ExcerptConfig::default())
    }
}

impl ExcerptPolicy {
    /// Skip the lead-in, keep the window, re-encode, overwrite `output`.
    pub fn invocation(&self, input: &Path, output: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program)
            .arg("-i")
            .path_arg(input)
            .arg("-ss")
            .arg(self.offset_secs.to_string())
            .arg("-t")
            .arg(self.duration_secs.to_string())
            .arg("-acodec")
            .arg(&self.codec)
            .arg("-ab")
            .arg(&self.bitrate)
            .arg("-y")
            .path_arg(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_uses_fixed_window() {
        let inv = ExcerptPolicy::default().invocation(
            Path::new("temp_audio/1a_bach_air.webm"),
            Path::new("audio/1a_bach_air.mp3"),
        );
        assert_eq!(inv.program, "ffmpeg");
        assert_eq!(inv.value_of("-i"), Some("temp_audio/1a_bach_air.webm"));
        assert_eq!(inv.value_of("-ss"), Some("30"));
        assert_eq!(inv.value_of("-t"), Some("60"));
        assert_eq!(inv.value_of("-acodec"), Some("libmp3lame"));
        assert_eq!(inv.value_of("-ab"), Some("128k"));
        assert!(inv.args.iter().any(|a| a == "-y"));
        assert_eq!(inv.args.last().map(String::as_str), Some("audio/1a_bach_air.mp3"));
    }

    #[test]
    fn test_timeout_comes_from_config() {
        let config = ExcerptConfig {
            timeout_secs: 15,
            ..ExcerptConfig::default()
        };
        assert_eq!(ExcerptPolicy::from(&config).timeout, Duration::from_secs(15));
    }
}
