use super::MediaConverter;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mediaferry_core::{AppError, ConversionKind};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Fixed encoding settings for a transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeProfile {
    /// VP8 + Vorbis in WebM, 500k video / 128k audio.
    Video,
    /// MP3 at 128k, video streams dropped.
    Audio,
}

impl TranscodeProfile {
    fn conversion_kind(self) -> ConversionKind {
        match self {
            TranscodeProfile::Video => ConversionKind::Video,
            TranscodeProfile::Audio => ConversionKind::Audio,
        }
    }

    fn codec_args(self) -> &'static [&'static str] {
        match self {
            TranscodeProfile::Video => &[
                "-c:v",
                "libvpx",
                "-b:v",
                "500k",
                "-c:a",
                "libvorbis",
                "-b:a",
                "128k",
            ],
            TranscodeProfile::Audio => &["-vn", "-c:a", "libmp3lame", "-b:a", "128k"],
        }
    }
}

/// Transcoder backed by an external ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    ffmpeg_path: String,
    profile: TranscodeProfile,
}

impl FfmpegConverter {
    pub fn new(ffmpeg_path: impl Into<String>, profile: TranscodeProfile) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            profile,
        }
    }

    /// Full ffmpeg argument list for one transcode.
    pub fn args(&self, source: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            source.to_string_lossy().to_string(),
        ];
        args.extend(self.profile.codec_args().iter().map(|a| a.to_string()));
        args.push(output.to_string_lossy().to_string());
        args
    }

    #[tracing::instrument(skip(self), fields(profile = ?self.profile))]
    async fn run(&self, source: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.ffmpeg_path)
            .args(self.args(source, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to execute ffmpeg")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            // The last lines carry the actual error; the rest is stream info.
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(5)..].join("\n");
            return Err(anyhow!("FFmpeg exited with {}: {}", result.status, tail));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaConverter for FfmpegConverter {
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), AppError> {
        self.run(source, output)
            .await
            .map_err(|e| AppError::conversion(self.profile.conversion_kind(), format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_video_args_use_webm_codecs_and_bitrates() {
        let converter = FfmpegConverter::new("ffmpeg", TranscodeProfile::Video);
        let args = converter.args(&PathBuf::from("in/clip.mp4"), &PathBuf::from("out/clip.webm"));

        let pair = |flag: &str| {
            let idx = args.iter().position(|a| a == flag).unwrap();
            args[idx + 1].clone()
        };
        assert_eq!(pair("-i"), "in/clip.mp4");
        assert_eq!(pair("-c:v"), "libvpx");
        assert_eq!(pair("-b:v"), "500k");
        assert_eq!(pair("-c:a"), "libvorbis");
        assert_eq!(pair("-b:a"), "128k");
        assert_eq!(args.last().unwrap(), "out/clip.webm");
    }

    #[test]
    fn test_audio_args_drop_video() {
        let converter = FfmpegConverter::new("ffmpeg", TranscodeProfile::Audio);
        let args = converter.args(&PathBuf::from("a.wav"), &PathBuf::from("a.mp3"));
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.contains(&"libmp3lame".to_string()));
        assert!(!args.contains(&"-b:v".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let converter = FfmpegConverter::new(
            dir.path().join("no-such-ffmpeg").to_string_lossy().to_string(),
            TranscodeProfile::Audio,
        );

        let err = converter
            .convert(&dir.path().join("a.wav"), &dir.path().join("a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conversion {
                kind: ConversionKind::Audio,
                ..
            }
        ));
    }
}
