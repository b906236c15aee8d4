use gl::types::GLuint;
use log::trace;

use crate::device::GlDevice;
use crate::geometry::Geometry;
use crate::program::Program;

pub struct GlRenderer<'d, D: GlDevice> {
    device: &'d D,
    current_program: GLuint,
}

impl<'d, D: GlDevice> GlRenderer<'d, D> {
    pub fn new(device: &'d D) -> Self {
        Self {
            device,
            current_program: 0,
        }
    }

    /// Indexed draw of the whole geometry. Programs that failed to link are never bound, the draw
    /// is skipped instead.
    pub fn draw(&mut self, geometry: &Geometry<'_, D>, program: &Program<'_, D>) {
        if !program.is_linked() {
            trace!("Skipping draw with unlinked program {}", program.get_id());
            return;
        }

        let p_id = program.get_id();
        if self.current_program != p_id {
            self.device.use_program(p_id);
            self.current_program = p_id;
        }

        self.device.bind_vertex_array(geometry.vao());
        self.device.draw_elements(geometry.indices() as i32);
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.device.viewport(0, 0, width as i32, height as i32);
    }

    pub fn clear_color(&self, r: f32, g: f32, b: f32) {
        self.device.clear_color(r, g, b, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ShaderStage;
    use crate::geometry::{GeometryBuilder, VertexAttribute};
    use crate::program::Shader;
    use crate::recording::{Call, RecordingDevice};

    const VERT: &str = "void main()\n{\n    gl_Position = vec4(0.0);\n}\n";
    const FRAG: &str = "void main()\n{\n    FragColor = vec4(1.0);\n}\n";

    #[test]
    fn binds_program_once() {
        let device = RecordingDevice::new();
        let vert = Shader::compile(&device, ShaderStage::Vertex, VERT);
        let frag = Shader::compile(&device, ShaderStage::Fragment, FRAG);
        let program = Program::link(&device, &vert, &frag);
        let geometry = GeometryBuilder::new(&[0.0; 9], &[0, 1, 2])
            .with_attribute(VertexAttribute::Vec3)
            .build(&device)
            .unwrap();

        let mut renderer = GlRenderer::new(&device);
        device.clear_calls();

        renderer.draw(&geometry, &program);
        renderer.draw(&geometry, &program);

        assert_eq!(
            device.calls(),
            vec![
                Call::UseProgram(program.get_id()),
                Call::BindVertexArray(geometry.vao()),
                Call::DrawElements(3),
                Call::BindVertexArray(geometry.vao()),
                Call::DrawElements(3),
            ]
        );
    }

    #[test]
    fn unlinked_program_is_never_bound() {
        let device = RecordingDevice::new();
        let vert = Shader::compile(&device, ShaderStage::Vertex, VERT);
        let frag = Shader::compile(&device, ShaderStage::Fragment, "FragColor = vec4(1.0)");
        let program = Program::link(&device, &vert, &frag);
        let geometry = GeometryBuilder::new(&[0.0; 9], &[0, 1, 2])
            .with_attribute(VertexAttribute::Vec3)
            .build(&device)
            .unwrap();

        let mut renderer = GlRenderer::new(&device);
        device.clear_calls();
        renderer.draw(&geometry, &program);

        assert!(device.calls().is_empty());
    }

    #[test]
    fn viewport_follows_size() {
        let device = RecordingDevice::new();
        let renderer = GlRenderer::new(&device);

        for (w, h) in [(800, 800), (1, 1), (1920, 1080), (333, 4097)] {
            renderer.resize(w, h);
            assert_eq!(
                device.calls().last(),
                Some(&Call::Viewport(0, 0, w as i32, h as i32))
            );
        }
    }

    #[test]
    fn clear_is_opaque() {
        let device = RecordingDevice::new();
        GlRenderer::new(&device).clear_color(0.2, 0.3, 0.3);
        assert_eq!(device.calls(), vec![Call::Clear([0.2, 0.3, 0.3, 1.0])]);
    }
}
