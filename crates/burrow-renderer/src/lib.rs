//! # Burrow Renderer
//!
//! Procedural tunnel effect for immediate-mode graphics.
//!
//! ## Features
//! - Twisting, scrolling tunnel mesh with fixed-size attribute streams
//! - Buffer mirrors refilled in place every tick, never reallocated
//! - Backend-agnostic draw submission through [`ImmediateContext`]
//! - Call recording for inspection and dumps

pub mod buffer;
pub mod context;
pub mod mesh;

pub use buffer::{ComponentType, MirrorBuffer, StreamFormat};
pub use context::{CommandRecorder, DrawCommand, ImmediateContext, Topology};
pub use mesh::{TunnelBuffers, TunnelMesh};

use burrow_core::TunnelConfig;
use serde::Serialize;
use thiserror::Error;

/// Renderer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Z translation applied to the tunnel when drawing
    pub camera_depth: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { camera_depth: -3.0 }
    }
}

impl From<&TunnelConfig> for RendererConfig {
    fn from(config: &TunnelConfig) -> Self {
        Self {
            camera_depth: config.camera_depth,
        }
    }
}

/// Renderer statistics for the current frame
#[derive(Debug, Clone, Default, Serialize)]
pub struct RendererStats {
    /// Draw calls this frame
    pub draw_calls: u64,
    /// Triangles submitted
    pub triangles: u64,
    /// Stream bytes bound
    pub bytes_bound: u64,
    /// Animation ticks applied
    pub ticks: u64,
}

impl RendererStats {
    /// Add another frame's counters into this one
    pub fn accumulate(&mut self, other: &RendererStats) {
        self.draw_calls += other.draw_calls;
        self.triangles += other.triangles;
        self.bytes_bound += other.bytes_bound;
        self.ticks += other.ticks;
    }
}

/// Drives a tunnel through frames and keeps per-frame statistics
pub struct Renderer {
    config: RendererConfig,
    stats: RendererStats,
    frame_number: u64,
}

impl Renderer {
    /// Create a new renderer
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            stats: RendererStats::default(),
            frame_number: 0,
        }
    }

    /// Get the renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Get statistics for the current frame
    pub fn stats(&self) -> &RendererStats {
        &self.stats
    }

    /// Get the current frame number
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Begin a new frame
    pub fn begin_frame(&mut self) {
        self.frame_number += 1;
        self.stats = RendererStats::default();
    }

    /// Advance the tunnel by `ticks` animation steps
    pub fn animate(&mut self, mesh: &mut TunnelMesh, ticks: u32) {
        for _ in 0..ticks {
            mesh.advance_frame();
        }
        self.stats.ticks += u64::from(ticks);
    }

    /// Submit the tunnel at the configured camera depth
    pub fn draw_tunnel<C: ImmediateContext + ?Sized>(&mut self, mesh: &TunnelMesh, ctx: &mut C) {
        mesh.render(ctx, self.config.camera_depth);

        let strips = mesh.strip_count() as u64;
        self.stats.draw_calls += strips;
        self.stats.triangles += strips * TunnelMesh::TOPOLOGY.triangle_count(mesh.strip_len()) as u64;
        self.stats.bytes_bound += mesh.buffers().total_bytes() as u64;
    }

    /// End the current frame
    pub fn end_frame(&mut self) {
        log::trace!(
            "Frame {}: {} ticks, {} draw calls, {} triangles",
            self.frame_number,
            self.stats.ticks,
            self.stats.draw_calls,
            self.stats.triangles
        );
    }
}
