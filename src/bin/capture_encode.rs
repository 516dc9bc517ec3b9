//! capture_encode - encode synthetic capture frames to an Annex B H.264 file

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use capture_codec::{
    AudioCodecAttribute, BackendRegistry, CaptureFrame, CodecError, EncodeOutcome,
    EncodedPacket, FrameOutcome, FramePipeline, PipelineConfig, SourceAttribute,
    SyntheticSource,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (.toml or .json).
    #[arg(long, env = "CAPTURE_CODEC_CONFIG")]
    config: Option<PathBuf>,
    /// Number of frames to generate.
    #[arg(long, default_value_t = 90)]
    frames: u64,
    /// Source pixel format (nv12, i420, ...).
    #[arg(long)]
    format: Option<String>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    fps: Option<u32>,
    /// Target bitrate in bits per second.
    #[arg(long)]
    bitrate: Option<u32>,
    /// Encoder backend name.
    #[arg(long)]
    backend: Option<String>,
    /// Extra bytes after each source row.
    #[arg(long)]
    padding: Option<usize>,
    /// Output Annex B file.
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// List compiled-in encoder backends and exit.
    #[arg(long)]
    list_backends: bool,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn apply_args(cfg: &mut PipelineConfig, args: &Args) -> Result<()> {
    if let Some(format) = &args.format {
        cfg.source.format = format.parse()?;
    }
    if let Some(width) = args.width {
        cfg.source.width = width;
    }
    if let Some(height) = args.height {
        cfg.source.height = height;
    }
    if let Some(fps) = args.fps {
        cfg.source.frame_rate = fps;
    }
    if let Some(bitrate) = args.bitrate {
        cfg.encoder.bitrate = bitrate;
    }
    if let Some(backend) = &args.backend {
        cfg.encoder.backend = Some(backend.clone());
    }
    if let Some(padding) = args.padding {
        cfg.source.padding = padding;
    }
    if let Some(output) = &args.output {
        cfg.output = output.clone();
    }
    cfg.validate()
}

fn write_packets(out: &mut impl Write, packets: &[EncodedPacket]) -> Result<u64> {
    let mut written = 0;
    for packet in packets {
        out.write_all(&packet.data)?;
        written += packet.len() as u64;
    }
    Ok(written)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = ui::Ui::from_args(&args.ui, std::io::stderr().is_terminal());

    let registry = BackendRegistry::with_builtin();
    if args.list_backends {
        for name in registry.list() {
            println!("{}", name);
        }
        return Ok(());
    }
    if args.frames == 0 {
        return Err(anyhow!("frames must be >= 1"));
    }

    let mut cfg = PipelineConfig::load_from(args.config.as_deref())?;
    apply_args(&mut cfg, &args)?;
    let backend = registry.select(cfg.encoder.backend.as_deref())?;

    let mut pipeline = FramePipeline::new(backend);
    {
        let _stage = ui.stage("Configure encoder");
        pipeline.set_source_attribute(SourceAttribute::Video(cfg.video_capture_attribute()))?;
        pipeline.set_video_codec_attribute(cfg.video_codec_attribute())?;
        pipeline.set_audio_codec_attribute(AudioCodecAttribute {
            sample_rate: 48_000,
            channels: 2,
            bitrate: 128_000,
        })?;
        pipeline.start()?;
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let mut source = SyntheticSource::new(cfg.synthetic_config())?;
    let file = File::create(&cfg.output)
        .with_context(|| format!("failed to create {}", cfg.output.display()))?;
    let mut out = BufWriter::new(file);
    let mut written = 0u64;

    let mut progress = ui.frames(args.frames);
    for _ in 0..args.frames {
        if stop.load(Ordering::SeqCst) {
            log::warn!("interrupted; stopping early");
            break;
        }
        let raw = source.next_frame()?;
        let frame = CaptureFrame::Video(raw.as_video());
        match pipeline.send_frame(Some(&frame)) {
            Ok(FrameOutcome::Video(EncodeOutcome::Packet(packet))) => {
                written += write_packets(&mut out, std::slice::from_ref(&packet))?;
            }
            Ok(_) => {}
            Err(CodecError::EncoderFailure(reason)) => {
                log::warn!("frame dropped: {}", reason);
            }
            Err(e) => return Err(e.into()),
        }
        progress.tick(written);
    }
    progress.finish();

    {
        let _stage = ui.stage("Flush encoder");
        let rest = pipeline.stop()?;
        written += write_packets(&mut out, &rest)?;
        out.flush()?;
    }

    let stats = pipeline.session_stats();
    log::info!(
        "wrote {} bytes to {} ({} frames, {} packets, {} dropped)",
        written,
        cfg.output.display(),
        stats.frames_submitted,
        stats.packets_emitted,
        stats.frames_dropped
    );
    Ok(())
}
