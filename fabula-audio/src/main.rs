//! Fabula Audio - command line entry point
//!
//! Drives the clip engine end to end: decode, extract, loop, mix,
//! analyze, record, play back, persist, and convert.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use fabula_audio::analysis::{
    compute_envelope, compute_static_metrics, run_monitor, LevelMonitor, LiveMetrics,
};
use fabula_audio::audio::capture::{list_input_devices, CaptureSession};
use fabula_audio::audio::output::list_output_devices;
use fabula_audio::audio::wav::encode_wav;
use fabula_audio::audio::{AudioDecoder, CpalPlayback};
use fabula_audio::clip::{
    apply_fades, extract_range, loop_to_length, mix, BackgroundAudioClip, FadeSpec,
};
use fabula_audio::config::Config;
use fabula_audio::convert::{convert_or_wav, CommandTranscoder, TargetFormat};
use fabula_audio::session::{EditSession, PlayMode, SystemClock, TransportState};
use fabula_audio::store::{ClipStore, FsClipStore};
use fabula_audio::SampleBuffer;
use fabula_common::timing::format_duration;
use fabula_common::FadeCurve;

/// Command-line arguments for fabula-audio
#[derive(Parser, Debug)]
#[command(name = "fabula-audio")]
#[command(about = "Sample-accurate clip editing for narration recordings")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "FABULA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a region with fades and write it as WAV
    Clip {
        input: PathBuf,
        /// Region start in seconds
        #[arg(long)]
        start: f64,
        /// Region end in seconds
        #[arg(long)]
        end: f64,
        #[arg(long, default_value_t = 0.0)]
        fade_in: f64,
        #[arg(long, default_value_t = 0.0)]
        fade_out: f64,
        #[arg(long, default_value = "linear")]
        curve: FadeCurve,
        /// Output WAV path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also save the clip into the store
        #[arg(long)]
        save: bool,
    },

    /// Repeat a source out to a target duration
    Loop {
        input: PathBuf,
        /// Target duration in seconds
        #[arg(long)]
        duration: f64,
        /// Crossfade length in seconds at each seam (0 = hard cut)
        #[arg(long, default_value_t = 0.0)]
        crossfade: f64,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Mix several sources into one buffer
    Mix {
        /// Input files, mixed in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Per-input gain, repeatable; unspecified inputs get 1.0
        #[arg(short, long)]
        gain: Vec<f32>,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Loop a background bed under a narration file
    Bed {
        narration: PathBuf,
        /// Background source
        #[arg(long)]
        bed: PathBuf,
        #[arg(long, default_value_t = 0.3)]
        volume: f32,
        #[arg(long, default_value_t = 0.0)]
        crossfade: f64,
        /// Use only this region of the bed (seconds)
        #[arg(long)]
        bed_start: Option<f64>,
        #[arg(long)]
        bed_end: Option<f64>,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Static quality metrics and waveform envelope as JSON
    Analyze {
        input: PathBuf,
        /// Envelope bucket count
        #[arg(long, default_value_t = 200)]
        envelope_width: usize,
    },

    /// Live input level monitoring
    Monitor {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration: Option<f64>,
        /// Capture device name (overrides config)
        #[arg(long)]
        device: Option<String>,
    },

    /// Record from an input device to a WAV file
    Record {
        output: PathBuf,
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration: Option<f64>,
        /// Capture device name (overrides config)
        #[arg(long)]
        device: Option<String>,
    },

    /// Play a file, optionally just a selection of it
    Play {
        input: PathBuf,
        /// Selection start in seconds
        #[arg(long)]
        start: Option<f64>,
        /// Selection end in seconds
        #[arg(long)]
        end: Option<f64>,
        #[arg(long, default_value_t = 1.0)]
        volume: f32,
        /// Output device name (overrides config)
        #[arg(long)]
        device: Option<String>,
    },

    /// Re-encode a file via the external transcoder
    Convert {
        input: PathBuf,
        #[arg(long, default_value = "ogg")]
        format: TargetFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Saved clip management
    Clips {
        #[command(subcommand)]
        action: ClipsAction,
    },

    /// List audio devices
    Devices,
}

#[derive(Subcommand, Debug)]
enum ClipsAction {
    /// List stored clips, oldest first
    List {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a stored clip by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabula_audio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Clip {
            input,
            start,
            end,
            fade_in,
            fade_out,
            curve,
            output,
            save,
        } => cmd_clip(
            &config,
            &input,
            start,
            end,
            FadeSpec::with_curve(fade_in, fade_out, curve),
            output.as_deref(),
            save,
        ),
        Command::Loop {
            input,
            duration,
            crossfade,
            output,
        } => cmd_loop(&input, duration, crossfade, &output),
        Command::Mix {
            inputs,
            gain,
            output,
        } => cmd_mix(&inputs, gain, &output),
        Command::Bed {
            narration,
            bed,
            volume,
            crossfade,
            bed_start,
            bed_end,
            output,
        } => cmd_bed(&narration, &bed, volume, crossfade, bed_start, bed_end, &output),
        Command::Analyze {
            input,
            envelope_width,
        } => cmd_analyze(&input, envelope_width),
        Command::Monitor { duration, device } => cmd_monitor(&config, duration, device).await,
        Command::Record {
            output,
            duration,
            device,
        } => cmd_record(&config, &output, duration, device).await,
        Command::Play {
            input,
            start,
            end,
            volume,
            device,
        } => cmd_play(&config, &input, start, end, volume, device).await,
        Command::Convert {
            input,
            format,
            output,
        } => cmd_convert(&config, &input, format, output),
        Command::Clips { action } => cmd_clips(&config, action),
        Command::Devices => cmd_devices(),
    }
}

fn cmd_clip(
    config: &Config,
    input: &Path,
    start: f64,
    end: f64,
    fades: FadeSpec,
    output: Option<&Path>,
    save: bool,
) -> Result<()> {
    if output.is_none() && !save {
        bail!("nothing to do: pass --output and/or --save");
    }

    let buffer = AudioDecoder::decode_file(input)?;
    let mut region = extract_range(&buffer, start, end)?;
    let duration = region.duration_seconds();
    apply_fades(&mut region, &fades.capped(duration))?;
    let wav = encode_wav(&region);

    if let Some(path) = output {
        fs::write(path, &wav).with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {} ({})", path.display(), format_duration(duration));
    }
    if save {
        let store = FsClipStore::new(&config.store_root)?;
        let id = Uuid::new_v4().to_string();
        store.save(&id, &wav, duration)?;
        println!("saved clip {}", id);
    }
    Ok(())
}

fn cmd_loop(input: &Path, duration: f64, crossfade: f64, output: &Path) -> Result<()> {
    let buffer = AudioDecoder::decode_file(input)?;
    let looped = loop_to_length(&buffer, duration, crossfade > 0.0, crossfade)?;
    fs::write(output, encode_wav(&looped))
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "wrote {} ({})",
        output.display(),
        format_duration(looped.duration_seconds())
    );
    Ok(())
}

fn cmd_mix(inputs: &[PathBuf], mut gains: Vec<f32>, output: &Path) -> Result<()> {
    let mut buffers = Vec::with_capacity(inputs.len());
    for path in inputs {
        buffers.push(AudioDecoder::decode_file(path)?);
    }
    if gains.len() > buffers.len() {
        bail!("{} gains for {} inputs", gains.len(), buffers.len());
    }
    gains.resize(buffers.len(), 1.0);

    let refs: Vec<&SampleBuffer> = buffers.iter().collect();
    let mixed = mix(&refs, &gains)?;
    fs::write(output, encode_wav(&mixed))
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "wrote {} ({})",
        output.display(),
        format_duration(mixed.duration_seconds())
    );
    Ok(())
}

fn cmd_bed(
    narration: &Path,
    bed: &Path,
    volume: f32,
    crossfade: f64,
    bed_start: Option<f64>,
    bed_end: Option<f64>,
    output: &Path,
) -> Result<()> {
    let narration_buffer = AudioDecoder::decode_file(narration)?;
    let bed_buffer = AudioDecoder::decode_file(bed)?;

    let name = bed
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bed".to_string());
    let mut clip = BackgroundAudioClip::new(name, bed_buffer);
    clip.set_volume(volume);
    if let Some(start) = bed_start {
        clip.selection.set_start(start);
    }
    if let Some(end) = bed_end {
        clip.selection.set_end(end);
    }

    let mixed = clip.mix_under(&narration_buffer, crossfade)?;
    fs::write(output, encode_wav(&mixed))
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "wrote {} ({})",
        output.display(),
        format_duration(mixed.duration_seconds())
    );
    Ok(())
}

fn cmd_analyze(input: &Path, envelope_width: usize) -> Result<()> {
    let buffer = AudioDecoder::decode_file(input)?;
    let metrics = compute_static_metrics(&buffer)?;
    let envelope = compute_envelope(&buffer, envelope_width);

    let report = serde_json::json!({
        "file": input.display().to_string(),
        "duration_secs": buffer.duration_seconds(),
        "sample_rate": buffer.sample_rate(),
        "channels": buffer.channel_count(),
        "metrics": metrics,
        "envelope": envelope,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_monitor(config: &Config, duration: Option<f64>, device: Option<String>) -> Result<()> {
    let device = device.or_else(|| config.capture_device.clone());
    let mut session = CaptureSession::start(device.as_deref())?;
    let mut monitor = LevelMonitor::new(config.monitor_params());

    level_loop(&mut session, &mut monitor, duration, config.monitor.tick_ms).await?;

    let summary = monitor.current();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_record(
    config: &Config,
    output: &Path,
    duration: Option<f64>,
    device: Option<String>,
) -> Result<()> {
    let device = device.or_else(|| config.capture_device.clone());
    let mut session = CaptureSession::start(device.as_deref())?;
    let mut monitor = LevelMonitor::new(config.monitor_params());

    level_loop(&mut session, &mut monitor, duration, config.monitor.tick_ms).await?;

    let buffer = session.finish();
    if buffer.is_empty() {
        bail!("no audio captured");
    }
    fs::write(output, encode_wav(&buffer))
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "wrote {} ({})",
        output.display(),
        format_duration(buffer.duration_seconds())
    );
    Ok(())
}

/// Drain capture frames through the monitor until Ctrl-C or the
/// deadline, mirroring each update on a single meter line.
async fn level_loop(
    session: &mut CaptureSession,
    monitor: &mut LevelMonitor,
    duration: Option<f64>,
    tick_ms: u64,
) -> Result<()> {
    if let Some(secs) = duration {
        if secs <= 0.0 {
            bail!("duration must be positive (got {})", secs);
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_on_signal = stop.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("stopping on Ctrl-C");
            stop_on_signal.store(true, Ordering::SeqCst);
        }
    });

    let (tx, rx) = watch::channel(LiveMetrics::initial());
    let printer = tokio::spawn(print_levels(rx));

    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs_f64(secs));
    run_monitor(
        monitor,
        || {
            if stop.load(Ordering::SeqCst) {
                return None;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return None;
                }
            }
            Some(session.drain())
        },
        &tx,
        Duration::from_millis(tick_ms),
    )
    .await;

    drop(tx);
    let _ = printer.await;
    eprintln!();
    Ok(())
}

/// Meter line on stderr so stdout stays machine-readable.
async fn print_levels(mut rx: watch::Receiver<LiveMetrics>) {
    while rx.changed().await.is_ok() {
        let m = *rx.borrow();
        eprint!(
            "\rlevel {:5.1}  peak {:5.1}  snr {:4.1} dB  {:<9}{}",
            m.current_level,
            m.peak_level,
            m.snr_db,
            m.rating.as_str(),
            if m.is_clipping { "  CLIPPING" } else { "          " }
        );
        let _ = std::io::stderr().flush();
    }
}

async fn cmd_play(
    config: &Config,
    input: &Path,
    start: Option<f64>,
    end: Option<f64>,
    volume: f32,
    device: Option<String>,
) -> Result<()> {
    let buffer = AudioDecoder::decode_file(input)?;
    let device = device.or_else(|| config.output_device.clone());
    let playback = CpalPlayback::new(device)?;
    playback.set_volume(volume);
    info!("playing on {}", playback.device_name());

    let mut session = EditSession::new(buffer, Box::new(playback), Box::new(SystemClock));
    match (start, end) {
        (Some(s), Some(e)) => {
            session.set_selection(s, e);
            session.set_mode(PlayMode::Selection);
        }
        (None, Some(e)) => {
            session.set_selection(0.0, e);
            session.set_mode(PlayMode::Selection);
        }
        (Some(s), None) => session.seek(s)?,
        (None, None) => {}
    }
    session.play()?;

    let mut interval = tokio::time::interval(Duration::from_millis(50));
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                session.tick()?;
                if session.state() == TransportState::Stopped {
                    break;
                }
                eprint!(
                    "\r{} / {}",
                    format_duration(session.current_time()),
                    format_duration(session.duration())
                );
                let _ = std::io::stderr().flush();
            }
            _ = &mut ctrl_c => {
                session.stop()?;
                break;
            }
        }
    }
    eprintln!();
    println!("stopped at {}", format_duration(session.current_time()));
    Ok(())
}

fn cmd_convert(
    config: &Config,
    input: &Path,
    format: TargetFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let buffer = AudioDecoder::decode_file(input)?;
    let wav = encode_wav(&buffer);

    let transcoder = CommandTranscoder::new(config.transcoder_program.as_str());
    let (bytes, actual) = convert_or_wav(&transcoder, &wav, format);

    let mut path = output.unwrap_or_else(|| input.with_extension(format.extension()));
    if actual != format {
        path.set_extension(actual.extension());
    }
    fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {} ({})", path.display(), actual);
    Ok(())
}

fn cmd_clips(config: &Config, action: ClipsAction) -> Result<()> {
    let store = FsClipStore::new(&config.store_root)?;
    match action {
        ClipsAction::List { json } => {
            let clips = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&clips)?);
            } else if clips.is_empty() {
                println!("no stored clips");
            } else {
                for clip in clips {
                    println!(
                        "{}  {:>8}  {:>10} bytes  {}",
                        clip.id,
                        format_duration(clip.duration_secs),
                        clip.size_bytes,
                        clip.saved_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }
        ClipsAction::Delete { id } => {
            store.delete(&id)?;
            println!("deleted {}", id);
        }
    }
    Ok(())
}

fn cmd_devices() -> Result<()> {
    println!("Output devices:");
    for name in list_output_devices()? {
        println!("  {}", name);
    }
    println!("Input devices:");
    for name in list_input_devices()? {
        println!("  {}", name);
    }
    Ok(())
}
