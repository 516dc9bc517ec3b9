use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::attribute::{VideoCaptureAttribute, VideoCodecAttribute};
use crate::convert::FormatConverter;
use crate::format::PixelFormat;
use crate::session::ENCODER_INPUT_FORMAT;
use crate::source::SyntheticConfig;

const DEFAULT_FORMAT: PixelFormat = PixelFormat::Nv12;
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FPS: u32 = 30;
const DEFAULT_BITRATE: u32 = 1_000_000;
const DEFAULT_OUTPUT: &str = "capture.h264";

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    source: Option<SourceConfigFile>,
    encoder: Option<EncoderConfigFile>,
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    format: Option<PixelFormat>,
    width: Option<u32>,
    height: Option<u32>,
    frame_rate: Option<u32>,
    padding: Option<usize>,
    noise: Option<u8>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct EncoderConfigFile {
    backend: Option<String>,
    bitrate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub source: SourceSettings,
    pub encoder: EncoderSettings,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub padding: usize,
    pub noise: u8,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Registered backend name; `None` picks the registry default.
    pub backend: Option<String>,
    pub bitrate: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_file(PipelineConfigFile::default())
    }
}

impl PipelineConfig {
    /// Load from the file named by `CAPTURE_CODEC_CONFIG` (if set), then apply
    /// `CAPTURE_CODEC_*` overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CAPTURE_CODEC_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PipelineConfigFile) -> Self {
        let source = file.source.unwrap_or_default();
        let encoder = file.encoder.unwrap_or_default();
        Self {
            source: SourceSettings {
                format: source.format.unwrap_or(DEFAULT_FORMAT),
                width: source.width.unwrap_or(DEFAULT_WIDTH),
                height: source.height.unwrap_or(DEFAULT_HEIGHT),
                frame_rate: source.frame_rate.unwrap_or(DEFAULT_FPS),
                padding: source.padding.unwrap_or(0),
                noise: source.noise.unwrap_or(0),
                seed: source.seed.unwrap_or(0),
            },
            encoder: EncoderSettings {
                backend: encoder.backend.filter(|name| !name.trim().is_empty()),
                bitrate: encoder.bitrate.unwrap_or(DEFAULT_BITRATE),
            },
            output: file.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(format) = env_nonempty("CAPTURE_CODEC_FORMAT") {
            self.source.format = format
                .parse()
                .map_err(|e| anyhow!("CAPTURE_CODEC_FORMAT: {}", e))?;
        }
        if let Some(width) = env_parse("CAPTURE_CODEC_WIDTH")? {
            self.source.width = width;
        }
        if let Some(height) = env_parse("CAPTURE_CODEC_HEIGHT")? {
            self.source.height = height;
        }
        if let Some(fps) = env_parse("CAPTURE_CODEC_FPS")? {
            self.source.frame_rate = fps;
        }
        if let Some(bitrate) = env_parse("CAPTURE_CODEC_BITRATE")? {
            self.encoder.bitrate = bitrate;
        }
        if let Some(backend) = env_nonempty("CAPTURE_CODEC_BACKEND") {
            self.encoder.backend = Some(backend);
        }
        if let Some(output) = env_nonempty("CAPTURE_CODEC_OUTPUT") {
            self.output = PathBuf::from(output);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.source
            .format
            .check_dimensions(self.source.width, self.source.height)
            .context("invalid source dimensions")?;
        if !FormatConverter::is_supported(self.source.format, ENCODER_INPUT_FORMAT) {
            return Err(anyhow!(
                "source format {} cannot be converted to encoder input {}",
                self.source.format,
                ENCODER_INPUT_FORMAT
            ));
        }
        self.video_codec_attribute()
            .validate()
            .context("invalid encoder settings")?;
        Ok(())
    }

    pub fn video_capture_attribute(&self) -> VideoCaptureAttribute {
        VideoCaptureAttribute {
            format: self.source.format,
            width: self.source.width,
            height: self.source.height,
            frame_rate: self.source.frame_rate,
        }
    }

    /// The encoder always runs at the source geometry and rate.
    pub fn video_codec_attribute(&self) -> VideoCodecAttribute {
        VideoCodecAttribute {
            width: self.source.width,
            height: self.source.height,
            frame_rate: self.source.frame_rate,
            bitrate: self.encoder.bitrate,
        }
    }

    pub fn synthetic_config(&self) -> SyntheticConfig {
        SyntheticConfig {
            format: self.source.format,
            width: self.source.width,
            height: self.source.height,
            padding: self.source.padding,
            noise: self.source.noise,
            seed: self.source.seed,
        }
    }
}

fn read_config_file(path: &Path) -> Result<PipelineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_nonempty(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be an unsigned integer, got '{}'", key, value)),
        None => Ok(None),
    }
}
