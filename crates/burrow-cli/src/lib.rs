//! # Burrow CLI
//!
//! Command-line interface for the Burrow tunnel renderer.
//!
//! ## Commands
//! - `info` - Report mesh sizes and stream layout
//! - `play` - Headless playback at a simulated display rate
//! - `dump` - Write one frame's draw calls as JSON

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use serde::Serialize;

use burrow_core::{AnimationClock, DeltaTime, Stopwatch, TunnelConfig};
use burrow_renderer::{
    CommandRecorder, DrawCommand, Renderer, RendererConfig, RendererStats, StreamFormat, TunnelMesh,
};

/// Burrow tunnel CLI
#[derive(Parser)]
#[command(name = "burrow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Vertices per ring (overrides the config file)
    #[arg(short, long, global = true)]
    pub radial: Option<usize>,

    /// Rings along the tunnel (overrides the config file)
    #[arg(short, long, global = true)]
    pub depth: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Report mesh sizes and stream layout
    Info,

    /// Play the animation headless and report statistics
    Play {
        /// Display frames to simulate
        #[arg(short, long, default_value = "300")]
        frames: u32,

        /// Simulated display rate
        #[arg(long, default_value = "60")]
        fps: f64,
    },

    /// Dump the draw calls of a single frame as JSON
    Dump {
        /// Animation ticks to run before drawing
        #[arg(short, long, default_value = "0")]
        ticks: u32,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Mesh layout summary
#[derive(Debug, Serialize)]
pub struct MeshInfo {
    pub radial_segments: usize,
    pub depth_segments: usize,
    pub vertices: usize,
    pub indices: usize,
    pub strips: usize,
    pub strip_len: usize,
    /// wgpu topology of each strip draw
    pub topology: String,
    pub streams: Vec<StreamInfo>,
}

/// Size and GPU layout of one bound stream
#[derive(Debug, Serialize)]
pub struct StreamInfo {
    pub name: &'static str,
    pub bytes: usize,
    pub stride: usize,
    /// wgpu format, or "none" when the stream needs widening before upload
    pub gpu_format: String,
}

impl StreamInfo {
    fn new(name: &'static str, bytes: usize, format: StreamFormat) -> Self {
        let gpu_format = match (format.vertex_format(), format.index_format()) {
            (Some(vertex), _) => format!("{vertex:?}"),
            (None, Some(index)) => format!("{index:?}"),
            (None, None) => "none".to_string(),
        };
        Self {
            name,
            bytes,
            stride: format.stride(),
            gpu_format,
        }
    }
}

/// Outcome of a headless playback
#[derive(Debug, Serialize)]
pub struct PlayReport {
    pub frames: u64,
    pub ticks: u64,
    pub dropped_ticks: u64,
    pub rotation_phase: f64,
    pub scroll_phase: f32,
    pub translation: [f32; 2],
    pub totals: RendererStats,
    pub wall_time_ms: f64,
}

/// One recorded frame
#[derive(Debug, Serialize)]
pub struct FrameDump {
    pub radial_segments: usize,
    pub depth_segments: usize,
    pub ticks: u32,
    pub rotation_phase: f64,
    pub scroll_phase: f32,
    pub translation: [f32; 2],
    pub commands: Vec<DrawCommand>,
}

/// Load the config file if given, then apply flag overrides
pub fn resolve_config(cli: &Cli) -> Result<TunnelConfig> {
    let mut config = match &cli.config {
        Some(path) => TunnelConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TunnelConfig::default(),
    };

    if let Some(radial) = cli.radial {
        config.radial_segments = radial;
    }
    if let Some(depth) = cli.depth {
        config.depth_segments = depth;
    }
    config.validate().context("invalid tunnel configuration")?;
    Ok(config)
}

fn build_mesh(config: &TunnelConfig) -> Result<TunnelMesh> {
    TunnelMesh::new(config.radial_segments, config.depth_segments).context("failed to build tunnel mesh")
}

/// Describe the mesh a config produces
pub fn mesh_info(config: &TunnelConfig) -> Result<MeshInfo> {
    let mesh = build_mesh(config)?;
    let buffers = mesh.buffers();
    Ok(MeshInfo {
        radial_segments: mesh.radial_segments(),
        depth_segments: mesh.depth_segments(),
        vertices: mesh.vertex_count(),
        indices: mesh.indices().len(),
        strips: mesh.strip_count(),
        strip_len: mesh.strip_len(),
        topology: format!("{:?}", TunnelMesh::TOPOLOGY.to_wgpu()),
        streams: vec![
            StreamInfo::new("positions", buffers.positions().byte_len(), buffers.positions().format()),
            StreamInfo::new("tex_coords", buffers.tex_coords().byte_len(), buffers.tex_coords().format()),
            StreamInfo::new("colors", buffers.colors().byte_len(), buffers.colors().format()),
            StreamInfo::new("indices", buffers.indices().byte_len(), buffers.indices().format()),
        ],
    })
}

/// Simulate `frames` display frames at `fps`, ticking at the configured rate
pub fn play(config: &TunnelConfig, frames: u32, fps: f64) -> Result<PlayReport> {
    ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {fps}");

    let mut mesh = build_mesh(config)?;
    let mut renderer = Renderer::new(RendererConfig::from(config));
    let mut clock = AnimationClock::new(config.time_step());
    let mut recorder = CommandRecorder::new();
    let mut totals = RendererStats::default();
    let frame_delta = DeltaTime::from_secs(1.0 / fps);
    let stopwatch = Stopwatch::new();

    for _ in 0..frames {
        let ticks = clock.update(frame_delta);

        renderer.begin_frame();
        renderer.animate(&mut mesh, ticks);
        renderer.draw_tunnel(&mesh, &mut recorder);
        renderer.end_frame();

        totals.accumulate(renderer.stats());
        recorder.clear();
    }

    let translation = mesh.translation();
    Ok(PlayReport {
        frames: clock.frame_count(),
        ticks: clock.tick_count(),
        dropped_ticks: clock.dropped_ticks(),
        rotation_phase: mesh.rotation_phase(),
        scroll_phase: mesh.scroll_phase(),
        translation: translation.to_array(),
        totals,
        wall_time_ms: stopwatch.elapsed().as_secs_f64() * 1000.0,
    })
}

/// Advance `ticks` times, then record a single draw
pub fn dump_frame(config: &TunnelConfig, ticks: u32) -> Result<FrameDump> {
    let mut mesh = build_mesh(config)?;
    let mut renderer = Renderer::new(RendererConfig::from(config));
    let mut recorder = CommandRecorder::new();

    renderer.begin_frame();
    renderer.animate(&mut mesh, ticks);
    renderer.draw_tunnel(&mesh, &mut recorder);
    renderer.end_frame();

    Ok(FrameDump {
        radial_segments: mesh.radial_segments(),
        depth_segments: mesh.depth_segments(),
        ticks,
        rotation_phase: mesh.rotation_phase(),
        scroll_phase: mesh.scroll_phase(),
        translation: mesh.translation().to_array(),
        commands: recorder.take(),
    })
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = resolve_config(&cli)?;
    log::debug!("Using config: {:?}", config);

    match cli.command {
        Commands::Info => {
            let info = mesh_info(&config)?;
            log::info!("Tunnel {}x{}", info.radial_segments, info.depth_segments);
            log::info!("  Vertices: {}", info.vertices);
            log::info!(
                "  Indices: {} ({} {} strips of {})",
                info.indices,
                info.strips,
                info.topology,
                info.strip_len
            );
            for stream in &info.streams {
                log::info!(
                    "  {}: {} bytes, stride {}, format {}",
                    stream.name,
                    stream.bytes,
                    stream.stride,
                    stream.gpu_format
                );
            }
        }

        Commands::Play { frames, fps } => {
            log::info!("Playing {} frames at {} fps ({} ticks/s)...", frames, fps, config.tick_rate_hz);
            let report = play(&config, frames, fps)?;
            log::info!("  Ticks: {} ({} dropped)", report.ticks, report.dropped_ticks);
            log::info!("  Rotation: {:.1} deg, scroll: {:.2}", report.rotation_phase, report.scroll_phase);
            log::info!("  Offset: ({:.3}, {:.3})", report.translation[0], report.translation[1]);
            log::info!(
                "  Draw calls: {}, triangles: {}, bytes bound: {}",
                report.totals.draw_calls,
                report.totals.triangles,
                report.totals.bytes_bound
            );
            log::info!("Playback complete in {:.2} ms", report.wall_time_ms);
        }

        Commands::Dump { ticks, output } => {
            let dump = dump_frame(&config, ticks)?;
            let json = serde_json::to_string_pretty(&dump).context("failed to serialize frame")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    log::info!("Wrote {} commands to {}", dump.commands.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}
