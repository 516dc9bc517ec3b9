use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::{Builder, NamedTempFile};

use capture_codec::{PipelineConfig, PixelFormat};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "CAPTURE_CODEC_CONFIG",
        "CAPTURE_CODEC_FORMAT",
        "CAPTURE_CODEC_WIDTH",
        "CAPTURE_CODEC_HEIGHT",
        "CAPTURE_CODEC_FPS",
        "CAPTURE_CODEC_BITRATE",
        "CAPTURE_CODEC_BACKEND",
        "CAPTURE_CODEC_OUTPUT",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_config_with_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": {
            "format": "yuy2",
            "width": 320,
            "height": 240,
            "frame_rate": 15,
            "padding": 8
        },
        "encoder": {
            "backend": "stub",
            "bitrate": 400000
        },
        "output": "run.h264"
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("CAPTURE_CODEC_CONFIG", file.path());
    std::env::set_var("CAPTURE_CODEC_FORMAT", "I420");
    std::env::set_var("CAPTURE_CODEC_BITRATE", "750000");

    let cfg = PipelineConfig::load().expect("load config");

    assert_eq!(cfg.source.format, PixelFormat::I420);
    assert_eq!(cfg.source.width, 320);
    assert_eq!(cfg.source.height, 240);
    assert_eq!(cfg.source.frame_rate, 15);
    assert_eq!(cfg.source.padding, 8);
    assert_eq!(cfg.encoder.backend.as_deref(), Some("stub"));
    assert_eq!(cfg.encoder.bitrate, 750_000);
    assert_eq!(cfg.output, PathBuf::from("run.h264"));

    let codec = cfg.video_codec_attribute();
    assert_eq!((codec.width, codec.height, codec.frame_rate), (320, 240, 15));

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
output = "out.h264"

[source]
format = "nv12"
width = 1280
height = 720
frame_rate = 60

[encoder]
bitrate = 4000000
"#;
    file.write_all(toml.as_bytes()).expect("write config");

    let cfg = PipelineConfig::load_from(Some(file.path())).expect("load config");
    assert_eq!(cfg.source.format, PixelFormat::Nv12);
    assert_eq!((cfg.source.width, cfg.source.height), (1280, 720));
    assert_eq!(cfg.source.frame_rate, 60);
    assert_eq!(cfg.encoder.bitrate, 4_000_000);
    assert_eq!(cfg.encoder.backend, None);
    assert_eq!(cfg.output, PathBuf::from("out.h264"));
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PipelineConfig::load().expect("load defaults");
    assert_eq!(cfg, PipelineConfig::default());
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CAPTURE_CODEC_WIDTH", "wide");
    assert!(PipelineConfig::load().is_err());

    clear_env();
    std::env::set_var("CAPTURE_CODEC_FORMAT", "bgr48");
    assert!(PipelineConfig::load().is_err());

    clear_env();
    std::env::set_var("CAPTURE_CODEC_WIDTH", "641");
    let err = PipelineConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid source dimensions"));

    clear_env();
}

#[test]
fn rejects_source_format_the_encoder_cannot_take() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    for format in ["rgb24", "rgb32", "yuy2", "uyvy"] {
        std::env::set_var("CAPTURE_CODEC_FORMAT", format);
        let err = PipelineConfig::load().unwrap_err();
        assert!(err.to_string().contains("cannot be converted"), "{}", format);
    }

    clear_env();
}

#[test]
fn rejects_unknown_format_in_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(br#"{"source": {"format": "p010"}}"#)
        .expect("write config");
    assert!(PipelineConfig::load_from(Some(file.path())).is_err());
}
