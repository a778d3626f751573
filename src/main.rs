//! Event Camera Emulation CLI
//!
//! Streams frames from a synthetic source or a directory of images,
//! emulates event camera output for every consecutive pair, and
//! optionally writes the rendered results as PNG files.

use clap::Parser;
use event_emulation::{
    analysis::StreamStatistics,
    capture::{
        FileConfig, Frame, FrameSource, ImageSequenceSource, OutputMode, SourceError,
        SyntheticSource,
    },
    emulation::{visualize, ChannelPolicy, Emulator, EventStream},
    metrics::{MetricsRegistry, MetricsSnapshot},
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "event-emulation",
    version,
    about = "Emulate event camera output from video frames"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of input images. Synthetic frames are used when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory receiving one PNG per processed frame pair.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to render for each frame pair.
    #[arg(long, value_enum)]
    mode: Option<OutputMode>,

    /// Event threshold.
    #[arg(long)]
    theta: Option<f64>,

    /// Number of frames to read.
    #[arg(long)]
    frames: Option<u32>,

    /// Run until interrupted.
    #[arg(long)]
    continuous: bool,

    /// Difference log intensities.
    #[arg(long)]
    log_diff: bool,

    /// Fire on 3-channel frames when any single channel crosses theta.
    #[arg(long)]
    any_channel: bool,

    /// Ignore brightness decreases.
    #[arg(long)]
    no_off_events: bool,

    /// Report OFF events as ON events.
    #[arg(long)]
    off_as_on: bool,

    /// Odd box-blur kernel applied before differencing.
    #[arg(long)]
    blur: Option<u32>,

    /// Read frames as single-channel grayscale.
    #[arg(long)]
    grayscale: bool,

    /// Print metrics in Prometheus text format on exit.
    #[arg(long)]
    print_metrics: bool,

    /// Metrics server port (0 disables; needs the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Cli {
    fn apply(&self, config: &mut FileConfig) {
        if let Some(theta) = self.theta {
            config.emulator.theta = theta;
        }
        if self.log_diff {
            config.emulator.use_log_diff = true;
        }
        if self.no_off_events {
            config.emulator.record_off_events = false;
        }
        if self.off_as_on {
            config.emulator.register_off_as_on = true;
        }
        if self.blur.is_some() {
            config.emulator.blur_kernel = self.blur;
        }
        if self.grayscale {
            config.capture.grayscale = true;
        }
        if let Some(frames) = self.frames {
            config.output.frame_count = frames;
        }
        if self.continuous {
            config.output.continuous = true;
        }
        if let Some(mode) = self.mode {
            config.output.mode = mode;
        }
        if self.output.is_some() {
            config.output.save_dir = self.output.clone();
        }
        if let Some(port) = self.metrics_port {
            config.output.metrics_port = port;
        }
    }
}

/// Where metric updates go: a local registry or the one behind the
/// HTTP server.
enum Exporter {
    Local(MetricsRegistry),
    #[cfg(feature = "metrics")]
    Served(Arc<tokio::sync::RwLock<event_emulation::metrics::MetricsState>>),
}

impl Exporter {
    fn start(registry: MetricsRegistry, port: u16) -> Self {
        #[cfg(feature = "metrics")]
        if port != 0 {
            use event_emulation::metrics::{MetricsServer, MetricsServerConfig};

            let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
            let state = server.state();
            let _server = server.spawn();
            return Exporter::Served(state);
        }
        #[cfg(not(feature = "metrics"))]
        if port != 0 {
            debug!(port, "Built without the metrics feature; not serving metrics");
        }
        Exporter::Local(registry)
    }

    fn update(&self, snapshot: &MetricsSnapshot) {
        match self {
            Exporter::Local(registry) => registry.update(snapshot),
            #[cfg(feature = "metrics")]
            Exporter::Served(state) => state.blocking_write().update(snapshot),
        }
    }

    fn encode(&self) -> Option<String> {
        let encoded = match self {
            Exporter::Local(registry) => registry.encode(),
            #[cfg(feature = "metrics")]
            Exporter::Served(state) => state.blocking_read().encode(),
        };
        encoded
            .map_err(|e| warn!("Failed to encode metrics: {}", e))
            .ok()
    }
}

fn save_output(
    dir: Option<&Path>,
    sequence: u64,
    save: impl FnOnce(&Path) -> image::ImageResult<()>,
) {
    if let Some(dir) = dir {
        let path = dir.join(format!("frame_{:06}.png", sequence));
        if let Err(e) = save(&path) {
            warn!("Failed to write {}: {}", path.display(), e);
        }
    }
}

fn mean_intensity(img: &image::GrayImage) -> f64 {
    let n = (img.width() as usize * img.height() as usize).max(1) as f64;
    img.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / n
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    info!("Event Camera Emulator v{}", event_emulation::VERSION);

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    cli.apply(&mut config);

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let emulator = match Emulator::new(config.emulator) {
        Ok(emulator) => emulator,
        Err(e) => {
            eprintln!("Invalid emulator settings: {}", e);
            std::process::exit(1);
        }
    };

    let mut source: Box<dyn FrameSource> = match &cli.input {
        Some(dir) => Box::new(ImageSequenceSource::new(dir)),
        None => {
            info!("No input directory given, using synthetic frames");
            Box::new(SyntheticSource::new())
        }
    };

    if let Err(e) = source.open(&config.capture) {
        eprintln!("Failed to open frame source: {}", e);
        std::process::exit(1);
    }

    let save_dir = config.output.save_dir.clone();
    if let Some(dir) = &save_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create output directory {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    let exporter = Exporter::start(registry, config.output.metrics_port);

    let mut stream = if cli.any_channel {
        EventStream::with_policy(emulator, ChannelPolicy::AnyChannel)
    } else {
        EventStream::new(emulator)
    };
    let mut stats = StreamStatistics::new();
    let mut previous: Option<Frame> = None;
    let mode = config.output.mode;

    info!(
        ?mode,
        theta = config.emulator.theta,
        log_diff = config.emulator.use_log_diff,
        "Processing frames..."
    );

    let mut frames_read: u32 = 0;
    while running.load(Ordering::SeqCst) {
        if !config.output.continuous && frames_read >= config.output.frame_count {
            break;
        }

        let frame = match source.capture() {
            Ok(f) => f,
            Err(SourceError::EndOfStream) => {
                info!("Frame source exhausted");
                break;
            }
            Err(e) => {
                warn!("Frame capture failed: {}", e);
                frames_read += 1;
                continue;
            }
        };
        frames_read += 1;
        let sequence = frame.sequence();

        match mode {
            OutputMode::Ssim => {
                if let Some(prev) = previous.replace(frame.clone()) {
                    match emulator.structural_diff(&frame, &prev) {
                        Ok(img) => {
                            stats.record_comparison(sequence);
                            debug!(sequence, mean = mean_intensity(&img), "Structural diff");
                            save_output(save_dir.as_deref(), sequence, |p| img.save(p));
                        }
                        Err(e) => {
                            stats.record_failure(sequence);
                            warn!("Frame {}: {}", sequence, e);
                        }
                    }
                }
            }
            OutputMode::Visual | OutputMode::Labels => match stream.process(&frame) {
                Ok(Some(events)) => {
                    let counts = events.counts();
                    stats.record(sequence, &counts);
                    debug!(
                        sequence,
                        on = counts.on,
                        off = counts.off,
                        density = counts.density(),
                        "Events emitted"
                    );
                    if mode == OutputMode::Visual {
                        save_output(save_dir.as_deref(), sequence, |p| visualize(&events).save(p));
                    } else {
                        save_output(save_dir.as_deref(), sequence, |p| {
                            events.to_label_image().save(p)
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    stats.record_failure(sequence);
                    warn!("Frame {}: {}", sequence, e);
                }
            },
        }

        exporter.update(&MetricsSnapshot::from_statistics(&stats));
    }

    source.close();

    info!(
        "Read {} frames: {} pairs processed, {} failed",
        frames_read, stats.frames_processed, stats.frames_failed
    );
    if mode != OutputMode::Ssim {
        info!(
            "Events: {} ON, {} OFF (mean density {:.4}, peak {:.4})",
            stats.total_on,
            stats.total_off,
            stats.mean_density(),
            stats.peak_density
        );
    }
    if cli.print_metrics {
        if let Some(output) = exporter.encode() {
            println!("{}", output);
        }
    }

    info!("Done.");
}
