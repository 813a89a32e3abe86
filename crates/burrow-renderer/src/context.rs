//! Immediate-Mode Context
//!
//! The seam between mesh data and a fixed-function style graphics API.
//! Backends implement [`ImmediateContext`]; [`CommandRecorder`] captures the
//! call sequence for inspection and dumps.

use glam::Vec3;
use serde::Serialize;

/// Primitive topology for indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Topology {
    TriangleList,
    #[default]
    TriangleStrip,
}

impl Topology {
    /// Equivalent wgpu topology
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Self::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            Self::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Triangles produced by `index_count` indices
    pub fn triangle_count(self, index_count: usize) -> usize {
        match self {
            Self::TriangleList => index_count / 3,
            Self::TriangleStrip => index_count.saturating_sub(2),
        }
    }
}

/// Immediate-mode graphics API surface used by the tunnel
pub trait ImmediateContext {
    /// Multiply the current model-view transform by a translation
    fn translate(&mut self, offset: Vec3);

    /// Bind the position stream
    fn vertex_pointer(&mut self, components: u32, data: &[f32]);

    /// Bind the texture-coordinate stream
    fn tex_coord_pointer(&mut self, components: u32, data: &[f32]);

    /// Bind the colour stream (unsigned bytes)
    fn color_pointer(&mut self, components: u32, data: &[u8]);

    /// Draw indexed primitives from the bound streams
    fn draw_elements(&mut self, topology: Topology, indices: &[u16]);
}

/// One recorded context call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Translate { offset: Vec3 },
    VertexPointer { components: u32, data: Vec<f32> },
    TexCoordPointer { components: u32, data: Vec<f32> },
    ColorPointer { components: u32, data: Vec<u8> },
    DrawElements { topology: Topology, indices: Vec<u16> },
}

/// Context that records every call instead of drawing
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
    draw_calls: u64,
    triangles: u64,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded calls in submission order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    pub fn triangles(&self) -> u64 {
        self.triangles
    }

    /// Forget everything recorded so far, keeping the allocation
    pub fn clear(&mut self) {
        self.commands.clear();
        self.draw_calls = 0;
        self.triangles = 0;
    }

    /// Take the recorded calls, leaving the recorder empty
    pub fn take(&mut self) -> Vec<DrawCommand> {
        self.draw_calls = 0;
        self.triangles = 0;
        std::mem::take(&mut self.commands)
    }
}

impl ImmediateContext for CommandRecorder {
    fn translate(&mut self, offset: Vec3) {
        self.commands.push(DrawCommand::Translate { offset });
    }

    fn vertex_pointer(&mut self, components: u32, data: &[f32]) {
        self.commands.push(DrawCommand::VertexPointer {
            components,
            data: data.to_vec(),
        });
    }

    fn tex_coord_pointer(&mut self, components: u32, data: &[f32]) {
        self.commands.push(DrawCommand::TexCoordPointer {
            components,
            data: data.to_vec(),
        });
    }

    fn color_pointer(&mut self, components: u32, data: &[u8]) {
        self.commands.push(DrawCommand::ColorPointer {
            components,
            data: data.to_vec(),
        });
    }

    fn draw_elements(&mut self, topology: Topology, indices: &[u16]) {
        self.draw_calls += 1;
        self.triangles += topology.triangle_count(indices.len()) as u64;
        self.commands.push(DrawCommand::DrawElements {
            topology,
            indices: indices.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_triangles() {
        assert_eq!(Topology::TriangleStrip.triangle_count(10), 8);
        assert_eq!(Topology::TriangleStrip.triangle_count(1), 0);
        assert_eq!(Topology::TriangleList.triangle_count(9), 3);
        assert_eq!(Topology::TriangleStrip.to_wgpu(), wgpu::PrimitiveTopology::TriangleStrip);
    }

    #[test]
    fn test_recorder_counts() {
        let mut recorder = CommandRecorder::new();
        recorder.translate(Vec3::new(0.0, 0.0, -3.0));
        recorder.draw_elements(Topology::TriangleStrip, &[0, 1, 2, 3]);
        recorder.draw_elements(Topology::TriangleStrip, &[2, 3, 4, 5]);

        assert_eq!(recorder.commands().len(), 3);
        assert_eq!(recorder.draw_calls(), 2);
        assert_eq!(recorder.triangles(), 4);

        let taken = recorder.take();
        assert_eq!(taken.len(), 3);
        assert!(recorder.commands().is_empty());
        assert_eq!(recorder.draw_calls(), 0);
    }

    #[test]
    fn test_command_json_shape() {
        let cmd = DrawCommand::DrawElements {
            topology: Topology::TriangleStrip,
            indices: vec![0, 4],
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["op"], "draw_elements");
        assert_eq!(json["topology"], "TriangleStrip");
        assert_eq!(json["indices"], serde_json::json!([0, 4]));
    }
}
