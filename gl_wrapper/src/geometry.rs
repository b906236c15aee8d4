use gl::types::GLuint;
use thiserror::Error;

use crate::device::GlDevice;

pub struct GeometryBuilder<'a> {
    attributes: Vec<VertexAttribute>,
    data: &'a [f32],
    indices: &'a [u32],
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(data: &'a [f32], indices: &'a [u32]) -> Self {
        Self {
            data,
            indices,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attr: VertexAttribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn build<'d, D: GlDevice>(self, device: &'d D) -> Result<Geometry<'d, D>, GBError> {
        let total_len: usize = self.attributes.iter().map(|a| a.size()).sum();

        if total_len == 0 {
            return Err(GBError::NoAttributes);
        }

        if self.data.len() % total_len != 0 {
            return Err(GBError::InvalidDataLength);
        }

        let vertices = self.data.len() / total_len;

        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertices) {
            return Err(GBError::IndexOutOfRange { index, vertices });
        }

        // Dropping a partially allocated geometry frees whatever did get created
        let geometry = Geometry {
            device,
            vao: device.create_vertex_array(),
            vbo: device.create_buffer(),
            ebo: device.create_buffer(),
            indices: self.indices.len(),
        };

        if geometry.vao == 0 || geometry.vbo == 0 || geometry.ebo == 0 {
            return Err(GBError::Allocation);
        }

        device.bind_vertex_array(geometry.vao);
        device.upload_vertices(geometry.vbo, self.data);
        device.upload_indices(geometry.ebo, self.indices);

        let stride = (total_len * std::mem::size_of::<f32>()) as i32;
        let mut offset = 0;

        for (i, attr) in self.attributes.iter().enumerate() {
            device.vertex_attribute(
                i as u32,
                attr.size() as i32,
                stride,
                offset * std::mem::size_of::<f32>(),
            );
            offset += attr.size();
        }

        device.bind_vertex_array(0);

        Ok(geometry)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GBError {
    #[error("Geometry needs at least one vertex attribute")]
    NoAttributes,
    #[error("Invalid data length for given attributes")]
    InvalidDataLength,
    #[error("Index {index} references a missing vertex, geometry has {vertices}")]
    IndexOutOfRange { index: u32, vertices: usize },
    #[error("Could not allocate vertex array or buffers on the device")]
    Allocation,
}

#[derive(Debug, Copy, Clone)]
pub enum VertexAttribute {
    Vec3,
}

impl VertexAttribute {
    pub fn size(&self) -> usize {
        match self {
            VertexAttribute::Vec3 => 3,
        }
    }
}

/// Vertex array with its own vertex and element buffers.
pub struct Geometry<'d, D: GlDevice> {
    device: &'d D,
    vao: GLuint,
    vbo: GLuint,
    ebo: GLuint,
    indices: usize,
}

impl<'d, D: GlDevice> Geometry<'d, D> {
    pub fn vao(&self) -> GLuint {
        self.vao
    }
    pub fn vbo(&self) -> GLuint {
        self.vbo
    }
    pub fn ebo(&self) -> GLuint {
        self.ebo
    }
    pub fn indices(&self) -> usize {
        self.indices
    }
}

impl<'d, D: GlDevice> Drop for Geometry<'d, D> {
    fn drop(&mut self) {
        if self.ebo != 0 {
            self.device.delete_buffer(self.ebo);
        }
        if self.vbo != 0 {
            self.device.delete_buffer(self.vbo);
        }
        if self.vao != 0 {
            self.device.delete_vertex_array(self.vao);
        }
    }
}
