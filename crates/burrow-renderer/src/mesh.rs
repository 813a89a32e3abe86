//! Tunnel Mesh
//!
//! A cylinder of rings along -Z, drawn as one closed triangle strip per pair
//! of neighbouring rings. Each animation tick swings every ring centre around
//! a circle, with far rings leading near ones so the tube appears to twist,
//! and scrolls the texture along the axis to fake forward motion.
//!
//! Index and colour data never change after construction. Positions and
//! texture coordinates are rebuilt every tick into the same storage.

use burrow_core::math::{ring_offset, Aabb, Vec2, Vec3};
use burrow_core::check_segments;

use crate::buffer::{MirrorBuffer, StreamFormat};
use crate::context::{ImmediateContext, Topology};
use crate::{RendererError, RendererResult};

/// Degrees added to the rotation phase per tick
pub const ROTATION_STEP_DEGREES: f64 = 2.0;

/// Texture units added to the scroll phase per tick
pub const SCROLL_STEP: f32 = 0.05;

/// Total phase lead, in degrees, of the farthest ring over the nearest
pub const TWIST_DEGREES: f64 = 220.0;

/// Pack a brightness in `[0, 1]` into a colour byte.
///
/// The level is truncated to `0..=255` and stored as a two's complement
/// signed byte, so anything above 128 comes out negative while keeping the
/// same bit pattern an unsigned reader expects.
pub fn pack_brightness(brightness: f32) -> i8 {
    let level = (brightness * 255.0) as i32;
    let wrapped = if level > 128 { level - 256 } else { level };
    wrapped as i8
}

/// Render-facing mirrors of the four attribute streams
#[derive(Debug, Clone)]
pub struct TunnelBuffers {
    positions: MirrorBuffer<f32>,
    tex_coords: MirrorBuffer<f32>,
    colors: MirrorBuffer<u8>,
    indices: MirrorBuffer<u16>,
}

impl TunnelBuffers {
    fn allocate(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: MirrorBuffer::zeroed(vertex_count * 3, StreamFormat::POSITION),
            tex_coords: MirrorBuffer::zeroed(vertex_count * 2, StreamFormat::TEX_COORD),
            colors: MirrorBuffer::zeroed(vertex_count * 3, StreamFormat::COLOR),
            indices: MirrorBuffer::zeroed(index_count, StreamFormat::INDEX),
        }
    }

    pub fn positions(&self) -> &MirrorBuffer<f32> {
        &self.positions
    }

    pub fn tex_coords(&self) -> &MirrorBuffer<f32> {
        &self.tex_coords
    }

    pub fn colors(&self) -> &MirrorBuffer<u8> {
        &self.colors
    }

    pub fn indices(&self) -> &MirrorBuffer<u16> {
        &self.indices
    }

    /// Bytes bound by one draw of the mesh
    pub fn total_bytes(&self) -> usize {
        self.positions.byte_len()
            + self.tex_coords.byte_len()
            + self.colors.byte_len()
            + self.indices.byte_len()
    }
}

/// Procedurally generated, animated tunnel
#[derive(Debug, Clone)]
pub struct TunnelMesh {
    radial_segments: usize,
    depth_segments: usize,

    /// Unit-circle offset of each radial slot, as `(sin, cos)` of its angle
    ring_profile: Vec<Vec2>,

    positions: Vec<f32>,
    indices: Vec<u16>,
    colors: Vec<i8>,
    tex_coords: Vec<f32>,

    buffers: TunnelBuffers,

    /// Degrees
    rotation_phase: f64,
    /// Texture units
    scroll_phase: f32,
    /// Centre of the nearest ring after the last tick
    translation: Vec2,
    frames_advanced: u64,
}

impl TunnelMesh {
    /// Topology of every strip draw
    pub const TOPOLOGY: Topology = Topology::TriangleStrip;

    /// Build a tunnel with `radial_segments` vertices per ring and
    /// `depth_segments` rings.
    pub fn new(radial_segments: usize, depth_segments: usize) -> RendererResult<Self> {
        check_segments(radial_segments, depth_segments).map_err(RendererError::InvalidParameter)?;

        let vertex_count = radial_segments * depth_segments;
        let index_count = (radial_segments + 1) * (depth_segments - 1) * 2;

        let ring_profile = (0..radial_segments)
            .map(|x| {
                let (sin, cos) = ring_offset(x as f64 * (360.0 / radial_segments as f64));
                Vec2::new(sin, cos)
            })
            .collect();

        let mut mesh = Self {
            radial_segments,
            depth_segments,
            ring_profile,
            positions: vec![0.0; vertex_count * 3],
            indices: vec![0; index_count],
            colors: vec![0; vertex_count * 3],
            tex_coords: vec![0.0; vertex_count * 2],
            buffers: TunnelBuffers::allocate(vertex_count, index_count),
            rotation_phase: 0.0,
            scroll_phase: 0.0,
            translation: Vec2::ZERO,
            frames_advanced: 0,
        };

        mesh.generate_positions();
        mesh.generate_indices();
        mesh.generate_colors();
        mesh.generate_tex_coords();

        mesh.buffers.positions.refill(&mesh.positions);
        mesh.buffers.indices.refill(&mesh.indices);
        mesh.buffers.colors.refill(bytemuck::cast_slice(mesh.colors.as_slice()));
        mesh.buffers.tex_coords.refill(&mesh.tex_coords);

        log::debug!(
            "Built tunnel {}x{}: {} vertices, {} indices in {} strips, {} bytes",
            radial_segments,
            depth_segments,
            vertex_count,
            index_count,
            mesh.strip_count(),
            mesh.buffers.total_bytes()
        );

        Ok(mesh)
    }

    /// Straight, centred cylinder of unit radius
    fn generate_positions(&mut self) {
        let radial = self.radial_segments;
        for (y, ring) in self.positions.chunks_exact_mut(radial * 3).enumerate() {
            let z = -(y as f32);
            for (vertex, offset) in ring.chunks_exact_mut(3).zip(&self.ring_profile) {
                vertex[0] = offset.x;
                vertex[1] = offset.y;
                vertex[2] = z;
            }
        }
    }

    fn generate_indices(&mut self) {
        let radial = self.radial_segments;
        let mut i = 0;
        for y in 0..self.depth_segments - 1 {
            let near = y * radial;
            for x in 0..radial {
                self.indices[i] = (near + x) as u16;
                self.indices[i + 1] = (near + x + radial) as u16;
                i += 2;
            }
            // close the ring
            self.indices[i] = near as u16;
            self.indices[i + 1] = (near + radial) as u16;
            i += 2;
        }
    }

    /// Grayscale fog: full brightness at the mouth fading toward the far end
    fn generate_colors(&mut self) {
        let radial = self.radial_segments;
        let step = 1.0 / self.depth_segments as f32;
        let mut brightness = 1.0f32;
        for ring in self.colors.chunks_exact_mut(radial * 3) {
            ring.fill(pack_brightness(brightness));
            brightness -= step;
        }
    }

    fn generate_tex_coords(&mut self) {
        self.write_tex_coords(0.0);
    }

    fn write_tex_coords(&mut self, scroll: f32) {
        let radial = self.radial_segments;
        let du = 1.0 / radial as f32;
        let dv = 1.0 / self.depth_segments as f32;
        for (y, ring) in self.tex_coords.chunks_exact_mut(radial * 2).enumerate() {
            let v = scroll + y as f32 * dv;
            for (x, uv) in ring.chunks_exact_mut(2).enumerate() {
                uv[0] = x as f32 * du;
                uv[1] = v;
            }
        }
    }

    /// Advance the animation by one tick.
    ///
    /// Rotates every ring centre, recentres on the nearest ring, scrolls the
    /// texture, and refills the position and texture mirrors.
    pub fn advance_frame(&mut self) {
        self.rotation_phase += ROTATION_STEP_DEGREES;

        let radial = self.radial_segments;
        let depth = self.depth_segments;
        let twist_step = TWIST_DEGREES / depth as f64;

        for (y, ring) in self.positions.chunks_exact_mut(radial * 3).enumerate() {
            let phase = self.rotation_phase + (depth - y) as f64 * twist_step;
            let (sin, cos) = ring_offset(phase);
            let centre = Vec2::new(cos, sin);
            if y == 0 {
                self.translation = centre;
            }

            let z = -(y as f32);
            for (vertex, offset) in ring.chunks_exact_mut(3).zip(&self.ring_profile) {
                vertex[0] = centre.x + offset.x;
                vertex[1] = centre.y + offset.y;
                vertex[2] = z;
            }
        }

        self.write_tex_coords(self.scroll_phase);
        self.scroll_phase += SCROLL_STEP;
        self.frames_advanced += 1;

        self.buffers.positions.refill(&self.positions);
        self.buffers.tex_coords.refill(&self.tex_coords);

        log::trace!(
            "Tunnel tick {}: rotation {:.1}, scroll {:.2}, offset ({:.3}, {:.3})",
            self.frames_advanced,
            self.rotation_phase,
            self.scroll_phase,
            self.translation.x,
            self.translation.y
        );
    }

    /// Submit the mesh to `ctx`, translated by `(-px, -py, depth)`.
    ///
    /// Binds positions, texture coordinates and colours in that order, then
    /// issues one triangle strip per ring pair.
    pub fn render<C: ImmediateContext + ?Sized>(&self, ctx: &mut C, depth: f32) {
        ctx.translate(Vec3::new(-self.translation.x, -self.translation.y, depth));
        ctx.vertex_pointer(StreamFormat::POSITION.components, self.buffers.positions.as_slice());
        ctx.tex_coord_pointer(StreamFormat::TEX_COORD.components, self.buffers.tex_coords.as_slice());
        ctx.color_pointer(StreamFormat::COLOR.components, self.buffers.colors.as_slice());

        for strip in self.strips() {
            ctx.draw_elements(Self::TOPOLOGY, strip);
        }
    }

    /// Index ranges of each ring-pair strip, nearest first
    pub fn strips(&self) -> std::slice::ChunksExact<'_, u16> {
        self.buffers.indices.as_slice().chunks_exact(self.strip_len())
    }

    pub fn radial_segments(&self) -> usize {
        self.radial_segments
    }

    pub fn depth_segments(&self) -> usize {
        self.depth_segments
    }

    pub fn vertex_count(&self) -> usize {
        self.radial_segments * self.depth_segments
    }

    /// Number of strips, one per ring pair
    pub fn strip_count(&self) -> usize {
        self.depth_segments - 1
    }

    /// Indices per strip, including the closing pair
    pub fn strip_len(&self) -> usize {
        (self.radial_segments + 1) * 2
    }

    /// Packed `xyz` positions
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Packed RGB colours as signed bytes
    pub fn colors(&self) -> &[i8] {
        &self.colors
    }

    /// Packed `uv` texture coordinates
    pub fn tex_coords(&self) -> &[f32] {
        &self.tex_coords
    }

    pub fn buffers(&self) -> &TunnelBuffers {
        &self.buffers
    }

    /// Rotation phase in degrees
    pub fn rotation_phase(&self) -> f64 {
        self.rotation_phase
    }

    /// Texture scroll phase; wraps only through texture sampling
    pub fn scroll_phase(&self) -> f32 {
        self.scroll_phase
    }

    /// Centre of the nearest ring, undone when drawing
    pub fn translation(&self) -> Vec2 {
        self.translation
    }

    pub fn frames_advanced(&self) -> u64 {
        self.frames_advanced
    }

    /// Bounds of the current positions
    pub fn bounds(&self) -> Aabb {
        Aabb::from_packed_positions(&self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CommandRecorder, DrawCommand};

    const EPS: f32 = 1e-5;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(TunnelMesh::new(0, 4), Err(RendererError::InvalidParameter(_))));
        assert!(matches!(TunnelMesh::new(4, 1), Err(RendererError::InvalidParameter(_))));
        assert!(matches!(TunnelMesh::new(4, 0), Err(RendererError::InvalidParameter(_))));
        assert!(matches!(TunnelMesh::new(300, 300), Err(RendererError::InvalidParameter(_))));
        assert!(TunnelMesh::new(1, 2).is_ok());
    }

    #[test]
    fn test_array_sizes() {
        for (r, d) in [(1, 2), (3, 2), (4, 3), (16, 32), (7, 11)] {
            let mesh = TunnelMesh::new(r, d).unwrap();
            assert_eq!(mesh.positions().len(), r * d * 3);
            assert_eq!(mesh.indices().len(), (r + 1) * (d - 1) * 2);
            assert_eq!(mesh.colors().len(), r * d * 3);
            assert_eq!(mesh.tex_coords().len(), r * d * 2);
            assert!(mesh.indices().iter().all(|&i| (i as usize) < r * d));
        }
    }

    #[test]
    fn test_small_example() {
        let mesh = TunnelMesh::new(4, 3).unwrap();
        assert_eq!(mesh.positions().len(), 36);
        assert_eq!(mesh.indices().len(), 20);

        // ring 0 at 0, 90, 180, 270 degrees: (sin, cos)
        let expected = [(0.0, 1.0), (1.0, 0.0), (0.0, -1.0), (-1.0, 0.0)];
        for (v, (ex, ey)) in mesh.positions()[..12].chunks_exact(3).zip(expected) {
            assert!((v[0] - ex).abs() < EPS, "x {} vs {}", v[0], ex);
            assert!((v[1] - ey).abs() < EPS, "y {} vs {}", v[1], ey);
            assert_eq!(v[2], 0.0);
        }
    }

    #[test]
    fn test_initial_rings() {
        let mesh = TunnelMesh::new(9, 5).unwrap();
        for (y, ring) in mesh.positions().chunks_exact(9 * 3).enumerate() {
            for v in ring.chunks_exact(3) {
                let r2 = v[0] * v[0] + v[1] * v[1];
                assert!((r2 - 1.0).abs() < 1e-5);
                assert_eq!(v[2], -(y as f32));
            }
        }
    }

    #[test]
    fn test_index_pattern() {
        let r = 5;
        let mesh = TunnelMesh::new(r, 4).unwrap();
        assert_eq!(mesh.strips().len(), 3);

        for (y, strip) in mesh.strips().enumerate() {
            assert_eq!(strip.len(), (r + 1) * 2);
            for x in 0..r {
                assert_eq!(strip[2 * x] as usize, x + y * r);
                assert_eq!(strip[2 * x + 1] as usize, x + y * r + r);
            }
            assert_eq!(strip[2 * r] as usize, y * r);
            assert_eq!(strip[2 * r + 1] as usize, y * r + r);
        }
    }

    #[test]
    fn test_brightness_packing() {
        assert_eq!(pack_brightness(1.0), -1);
        assert_eq!(pack_brightness(0.0), 0);
        assert_eq!(pack_brightness(0.5), 127);
        // 128 is not above the threshold but still wraps in the narrowing
        assert_eq!(pack_brightness(128.5 / 255.0), -128);
        assert_eq!(pack_brightness(200.5 / 255.0) as u8, 200);
    }

    #[test]
    fn test_color_fog() {
        let r = 6;
        let mesh = TunnelMesh::new(r, 10).unwrap();

        let levels: Vec<u8> = mesh
            .colors()
            .chunks_exact(r * 3)
            .map(|ring| {
                let first = ring[0];
                assert!(ring.iter().all(|&c| c == first), "ring not uniform");
                first as u8
            })
            .collect();

        assert_eq!(levels[0], 255);
        assert!(levels.windows(2).all(|w| w[0] >= w[1]), "{levels:?}");
        assert!(levels[9] <= 26);

        let mirror = mesh.buffers().colors().as_slice();
        let signed: &[u8] = bytemuck::cast_slice(mesh.colors());
        assert_eq!(mirror, signed);
    }

    #[test]
    fn test_initial_tex_coords() {
        let mesh = TunnelMesh::new(4, 2).unwrap();
        let expected = [
            0.0, 0.0, 0.25, 0.0, 0.5, 0.0, 0.75, 0.0, //
            0.0, 0.5, 0.25, 0.5, 0.5, 0.5, 0.75, 0.5,
        ];
        assert_eq!(mesh.tex_coords(), &expected);
    }

    #[test]
    fn test_phases_after_n_frames() {
        let mut mesh = TunnelMesh::new(8, 6).unwrap();
        let n = 25;
        for _ in 0..n {
            mesh.advance_frame();
        }

        assert!((mesh.rotation_phase() - 2.0 * n as f64).abs() < 1e-9);
        assert!((mesh.scroll_phase() - 0.05 * n as f32).abs() < 1e-4);
        assert_eq!(mesh.frames_advanced(), n as u64);

        // ring 0 leads by the full twist
        let phase = (2.0 * n as f64 + TWIST_DEGREES).to_radians();
        let centre = mesh.translation();
        assert!((centre.x - phase.cos() as f32).abs() < EPS);
        assert!((centre.y - phase.sin() as f32).abs() < EPS);

        // first vertex of ring 0 sits at angle 0 around that centre
        let v = &mesh.positions()[..3];
        assert!((v[0] - centre.x).abs() < EPS);
        assert!((v[1] - (centre.y + 1.0)).abs() < EPS);
    }

    #[test]
    fn test_rings_twist_with_depth() {
        let depth = 4;
        let mut mesh = TunnelMesh::new(3, depth).unwrap();
        mesh.advance_frame();

        for (y, ring) in mesh.positions().chunks_exact(3 * 3).enumerate() {
            let phase = 2.0 + (depth - y) as f64 * (TWIST_DEGREES / depth as f64);
            let (sin, cos) = ring_offset(phase);
            // slot 0 offset is (0, 1)
            assert!((ring[0] - cos).abs() < EPS);
            assert!((ring[1] - (sin + 1.0)).abs() < EPS);
            assert_eq!(ring[2], -(y as f32));
        }
    }

    #[test]
    fn test_scrolled_tex_coords() {
        let mut mesh = TunnelMesh::new(2, 4).unwrap();

        // first tick uses the scroll phase from before the increment
        mesh.advance_frame();
        assert_eq!(mesh.tex_coords()[1], 0.0);

        mesh.advance_frame();
        let uv = mesh.tex_coords();
        assert!((uv[1] - 0.05).abs() < 1e-6);
        // ring 3, slot 1
        let last = &uv[uv.len() - 2..];
        assert_eq!(last[0], 0.5);
        assert!((last[1] - (0.05 + 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_frames_reuse_buffers() {
        let mut mesh = TunnelMesh::new(6, 5).unwrap();
        let pointers = (
            mesh.buffers().positions().as_ptr(),
            mesh.buffers().tex_coords().as_ptr(),
            mesh.buffers().colors().as_ptr(),
            mesh.buffers().indices().as_ptr(),
        );
        let colors = mesh.buffers().colors().as_slice().to_vec();
        let indices = mesh.buffers().indices().as_slice().to_vec();

        let mut recorder = CommandRecorder::new();
        for _ in 0..10 {
            mesh.advance_frame();
            mesh.render(&mut recorder, -3.0);
        }

        assert_eq!(mesh.positions().len(), 6 * 5 * 3);
        assert_eq!(mesh.buffers().positions().len(), 6 * 5 * 3);
        assert_eq!(mesh.buffers().tex_coords().len(), 6 * 5 * 2);
        assert_eq!(
            pointers,
            (
                mesh.buffers().positions().as_ptr(),
                mesh.buffers().tex_coords().as_ptr(),
                mesh.buffers().colors().as_ptr(),
                mesh.buffers().indices().as_ptr(),
            )
        );

        // static streams filled once, dynamic ones every tick
        assert_eq!(mesh.buffers().colors().refill_count(), 1);
        assert_eq!(mesh.buffers().indices().refill_count(), 1);
        assert_eq!(mesh.buffers().positions().refill_count(), 11);
        assert_eq!(mesh.buffers().tex_coords().refill_count(), 11);
        assert_eq!(mesh.buffers().colors().as_slice(), colors.as_slice());
        assert_eq!(mesh.buffers().indices().as_slice(), indices.as_slice());

        assert_eq!(mesh.buffers().positions().as_slice(), mesh.positions());
    }

    #[test]
    fn test_render_sequence() {
        let mut mesh = TunnelMesh::new(4, 3).unwrap();
        mesh.advance_frame();

        let mut recorder = CommandRecorder::new();
        mesh.render(&mut recorder, -2.5);
        let commands = recorder.commands();
        assert_eq!(commands.len(), 4 + 2);

        let t = mesh.translation();
        assert_eq!(
            commands[0],
            DrawCommand::Translate {
                offset: Vec3::new(-t.x, -t.y, -2.5)
            }
        );
        assert!(matches!(&commands[1], DrawCommand::VertexPointer { components: 3, data } if data.len() == 36));
        assert!(matches!(&commands[2], DrawCommand::TexCoordPointer { components: 2, data } if data.len() == 24));
        assert!(matches!(&commands[3], DrawCommand::ColorPointer { components: 3, data } if data.len() == 36));

        let strips: Vec<&[u16]> = mesh.strips().collect();
        for (cmd, strip) in commands[4..].iter().zip(strips) {
            match cmd {
                DrawCommand::DrawElements { topology, indices } => {
                    assert_eq!(*topology, Topology::TriangleStrip);
                    assert_eq!(indices.as_slice(), strip);
                }
                other => panic!("unexpected command {other:?}"),
            }
        }

        assert_eq!(recorder.draw_calls(), 2);
        assert_eq!(recorder.triangles(), 2 * 8);
    }

    #[test]
    fn test_unanimated_render_is_centred() {
        let mesh = TunnelMesh::new(3, 2).unwrap();
        let mut recorder = CommandRecorder::new();
        mesh.render(&mut recorder, -1.0);
        assert_eq!(
            recorder.commands()[0],
            DrawCommand::Translate {
                offset: Vec3::new(-0.0, -0.0, -1.0)
            }
        );
    }

    #[test]
    fn test_bounds_follow_animation() {
        let mut mesh = TunnelMesh::new(8, 4).unwrap();
        let bounds = mesh.bounds();
        assert!((bounds.min.z + 3.0).abs() < EPS);
        assert_eq!(bounds.max.z, 0.0);
        assert!(bounds.max.x <= 1.0 + EPS && bounds.min.x >= -1.0 - EPS);

        mesh.advance_frame();
        let bounds = mesh.bounds();
        assert!(bounds.max.x <= 2.0 + EPS && bounds.min.x >= -2.0 - EPS);
        assert!(!bounds.is_empty());
    }
}
