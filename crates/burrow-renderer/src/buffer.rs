//! Buffer Mirrors
//!
//! Render-facing copies of the mesh's attribute arrays. Each mirror is sized
//! once and refilled in place, so a frame never allocates.

use bytemuck::Pod;
use serde::Serialize;

/// Scalar type of one stream component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComponentType {
    Float32,
    Unorm8,
    Uint16,
}

impl ComponentType {
    /// Size of one component in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Unorm8 => 1,
            Self::Uint16 => 2,
        }
    }
}

/// Layout of one element in a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamFormat {
    pub component: ComponentType,
    pub components: u32,
}

impl StreamFormat {
    pub const POSITION: Self = Self::new(ComponentType::Float32, 3);
    pub const TEX_COORD: Self = Self::new(ComponentType::Float32, 2);
    pub const COLOR: Self = Self::new(ComponentType::Unorm8, 3);
    pub const INDEX: Self = Self::new(ComponentType::Uint16, 1);

    pub const fn new(component: ComponentType, components: u32) -> Self {
        Self { component, components }
    }

    /// Bytes per element
    pub fn stride(&self) -> usize {
        self.component.size() * self.components as usize
    }

    /// Matching wgpu vertex attribute format.
    ///
    /// wgpu has no three-byte colour format; packed RGB needs widening to
    /// RGBA before upload, so it maps to `None`.
    pub fn vertex_format(&self) -> Option<wgpu::VertexFormat> {
        match (self.component, self.components) {
            (ComponentType::Float32, 1) => Some(wgpu::VertexFormat::Float32),
            (ComponentType::Float32, 2) => Some(wgpu::VertexFormat::Float32x2),
            (ComponentType::Float32, 3) => Some(wgpu::VertexFormat::Float32x3),
            (ComponentType::Float32, 4) => Some(wgpu::VertexFormat::Float32x4),
            (ComponentType::Unorm8, 2) => Some(wgpu::VertexFormat::Unorm8x2),
            (ComponentType::Unorm8, 4) => Some(wgpu::VertexFormat::Unorm8x4),
            _ => None,
        }
    }

    /// Matching wgpu index format
    pub fn index_format(&self) -> Option<wgpu::IndexFormat> {
        match (self.component, self.components) {
            (ComponentType::Uint16, 1) => Some(wgpu::IndexFormat::Uint16),
            _ => None,
        }
    }
}

/// Fixed-length render-facing copy of a logical array
#[derive(Debug, Clone)]
pub struct MirrorBuffer<T: Pod> {
    data: Box<[T]>,
    format: StreamFormat,
    refills: u64,
}

impl<T: Pod> MirrorBuffer<T> {
    /// Allocate a zeroed mirror holding `len` scalars
    pub fn zeroed(len: usize, format: StreamFormat) -> Self {
        debug_assert_eq!(std::mem::size_of::<T>(), format.component.size());
        Self {
            data: vec![T::zeroed(); len].into_boxed_slice(),
            format,
            refills: 0,
        }
    }

    /// Overwrite the mirror with `src`.
    ///
    /// # Panics
    /// If `src` is not exactly as long as the mirror.
    pub fn refill(&mut self, src: &[T]) {
        self.data.copy_from_slice(src);
        self.refills += 1;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Raw bytes in native order, ready for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&*self.data)
    }

    /// Number of scalars
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of elements (scalars / components)
    pub fn element_count(&self) -> usize {
        self.data.len() / self.format.components as usize
    }

    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(&*self.data)
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// How many times the mirror has been refilled
    pub fn refill_count(&self) -> u64 {
        self.refills
    }

    /// Address of the backing storage, stable for the mirror's lifetime
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }
}
