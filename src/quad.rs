use cgmath::Point3;

use gl_wrapper::device::GlDevice;
use gl_wrapper::geometry::{GBError, Geometry, GeometryBuilder, VertexAttribute};
use gl_wrapper::program::Program;
use gl_wrapper::renderer::GlRenderer;

/// Two triangles sharing the lower-right to upper-left diagonal.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadCorners {
    pub upper_right: Point3<f32>,
    pub lower_right: Point3<f32>,
    pub lower_left: Point3<f32>,
    pub upper_left: Point3<f32>,
}

impl QuadCorners {
    pub fn vertices(&self) -> [f32; 12] {
        let [a, b, c, d] = [
            self.upper_right,
            self.lower_right,
            self.lower_left,
            self.upper_left,
        ];

        #[rustfmt::skip]
        let vertices = [
            a.x, a.y, a.z,
            b.x, b.y, b.z,
            c.x, c.y, c.z,
            d.x, d.y, d.z,
        ];

        vertices
    }
}

pub const CENTER_QUAD: QuadCorners = QuadCorners {
    upper_right: Point3 { x: 0.5, y: 0.5, z: 0.0 },
    lower_right: Point3 { x: 0.5, y: -0.5, z: 0.0 },
    lower_left: Point3 { x: -0.5, y: -0.5, z: 0.0 },
    upper_left: Point3 { x: -0.5, y: 0.5, z: 0.0 },
};

pub const CORNER_QUAD: QuadCorners = QuadCorners {
    upper_right: Point3 { x: 1.0, y: 1.0, z: 0.0 },
    lower_right: Point3 { x: 1.0, y: 0.5, z: 0.0 },
    lower_left: Point3 { x: 0.5, y: 0.5, z: 0.0 },
    upper_left: Point3 { x: 0.5, y: 1.0, z: 0.0 },
};

/// A rectangle living on the device. Its buffers are released when it is dropped.
pub struct Quad<'d, D: GlDevice> {
    geometry: Geometry<'d, D>,
}

impl<'d, D: GlDevice> Quad<'d, D> {
    pub fn new(device: &'d D, corners: QuadCorners) -> Result<Self, GBError> {
        let geometry = GeometryBuilder::new(&corners.vertices(), &QUAD_INDICES)
            .with_attribute(VertexAttribute::Vec3)
            .build(device)?;

        Ok(Self { geometry })
    }

    pub fn draw(&self, renderer: &mut GlRenderer<'_, D>, program: &Program<'_, D>) {
        renderer.draw(&self.geometry, program);
    }

    #[cfg(test)]
    pub fn geometry(&self) -> &Geometry<'d, D> {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{build_programs, ShaderPolicy, ShaderSources};
    use gl_wrapper::recording::{Call, RecordingDevice};

    #[test]
    fn center_quad_vertices() {
        let device = RecordingDevice::new();
        let quad = Quad::new(&device, CENTER_QUAD).unwrap();

        #[rustfmt::skip]
        let expected = vec![
            0.5, 0.5, 0.0,
            0.5, -0.5, 0.0,
            -0.5, -0.5, 0.0,
            -0.5, 0.5, 0.0,
        ];

        assert_eq!(device.vertices_of(quad.geometry().vbo()), Some(expected));
    }

    #[test]
    fn indices_do_not_depend_on_corners() {
        let device = RecordingDevice::new();
        let skewed = QuadCorners {
            upper_right: Point3::new(3.0, -7.0, 1.5),
            lower_right: Point3::new(0.0, 0.0, 0.0),
            lower_left: Point3::new(-1.0, 2.0, -0.25),
            upper_left: Point3::new(9.0, 9.0, 9.0),
        };

        for corners in [CENTER_QUAD, CORNER_QUAD, skewed] {
            let quad = Quad::new(&device, corners).unwrap();
            assert_eq!(
                device.indices_of(quad.geometry().ebo()),
                Some(vec![0, 1, 3, 1, 2, 3])
            );
            assert_eq!(quad.geometry().indices(), 6);
        }
    }

    #[test]
    fn vertices_follow_corner_order() {
        let corners = QuadCorners {
            upper_right: Point3::new(1.0, 2.0, 3.0),
            lower_right: Point3::new(4.0, 5.0, 6.0),
            lower_left: Point3::new(7.0, 8.0, 9.0),
            upper_left: Point3::new(10.0, 11.0, 12.0),
        };

        assert_eq!(
            corners.vertices(),
            [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]
        );
    }

    #[test]
    fn layout_is_tightly_packed_vec3() {
        let device = RecordingDevice::new();
        let _quad = Quad::new(&device, CORNER_QUAD).unwrap();

        let attributes: Vec<_> = device
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::VertexAttribute { .. }))
            .collect();

        assert_eq!(
            attributes,
            vec![Call::VertexAttribute {
                index: 0,
                components: 3,
                stride: 12,
                offset: 0
            }]
        );
    }

    #[test]
    fn draw_issues_one_indexed_call() {
        let device = RecordingDevice::new();
        let programs =
            build_programs(&device, &ShaderSources::default(), ShaderPolicy::Strict).unwrap();
        let quad = Quad::new(&device, CENTER_QUAD).unwrap();
        let mut renderer = GlRenderer::new(&device);

        device.clear_calls();
        quad.draw(&mut renderer, &programs.orange);

        assert_eq!(
            device.calls(),
            vec![
                Call::UseProgram(programs.orange.get_id()),
                Call::BindVertexArray(quad.geometry().vao()),
                Call::DrawElements(6),
            ]
        );
    }

    #[test]
    fn drop_releases_buffers_once() {
        let device = RecordingDevice::new();
        let quad = Quad::new(&device, CENTER_QUAD).unwrap();
        let (vao, vbo, ebo) = (
            quad.geometry().vao(),
            quad.geometry().vbo(),
            quad.geometry().ebo(),
        );

        drop(quad);

        for id in [vao, vbo, ebo] {
            assert!(!device.is_alive(id));
        }
        let deletes = device
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::DeleteBuffer(_) | Call::DeleteVertexArray(_)))
            .count();
        assert_eq!(deletes, 3);
    }

    #[test]
    fn allocation_failure_is_reported() {
        let device = RecordingDevice::new();
        device.fail_allocations(true);

        assert_eq!(
            Quad::new(&device, CENTER_QUAD).err(),
            Some(GBError::Allocation)
        );
    }
}
