//! In-memory [`GlDevice`] that records every call instead of talking to a driver.
//!
//! Objects get increasing non-zero names. Deleting a name that is not alive panics, which is how
//! tests catch double frees. Shader "compilation" is a toy syntax check: every statement line has
//! to end with `;`. Lines ending in `)` without an assignment count as function signatures.

use gl::types::{GLint, GLsizei, GLuint};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::device::{truncate_log, GlDevice, ShaderStage};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateVertexArray(GLuint),
    DeleteVertexArray(GLuint),
    BindVertexArray(GLuint),
    CreateBuffer(GLuint),
    DeleteBuffer(GLuint),
    UploadVertices(GLuint, Vec<f32>),
    UploadIndices(GLuint, Vec<u32>),
    VertexAttribute {
        index: GLuint,
        components: GLint,
        stride: GLsizei,
        offset: usize,
    },
    CreateShader(GLuint, ShaderStage),
    CompileShader(GLuint),
    DeleteShader(GLuint),
    CreateProgram(GLuint),
    LinkProgram(GLuint, Vec<GLuint>),
    UseProgram(GLuint),
    DeleteProgram(GLuint),
    DrawElements(GLsizei),
    Viewport(GLint, GLint, GLsizei, GLsizei),
    Clear([f32; 4]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    VertexArray,
    Buffer,
    Shader,
    Program,
}

#[derive(Debug)]
struct ShaderState {
    stage: ShaderStage,
    compiled: bool,
    log: String,
}

#[derive(Default)]
pub struct RecordingDevice {
    calls: RefCell<Vec<Call>>,
    next_id: Cell<GLuint>,
    live: RefCell<HashMap<GLuint, Kind>>,
    shaders: RefCell<HashMap<GLuint, ShaderState>>,
    program_logs: RefCell<HashMap<GLuint, String>>,
    fail_allocations: Cell<bool>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following buffer and vertex array allocation return `0`.
    pub fn fail_allocations(&self, fail: bool) {
        self.fail_allocations.set(fail);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn live_objects(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_alive(&self, id: GLuint) -> bool {
        self.live.borrow().contains_key(&id)
    }

    /// Contents last uploaded into vertex buffer `id`.
    pub fn vertices_of(&self, id: GLuint) -> Option<Vec<f32>> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::UploadVertices(b, data) if *b == id => Some(data.clone()),
            _ => None,
        })
    }

    /// Contents last uploaded into element buffer `id`.
    pub fn indices_of(&self, id: GLuint) -> Option<Vec<u32>> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            Call::UploadIndices(b, data) if *b == id => Some(data.clone()),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self, kind: Kind) -> GLuint {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.live.borrow_mut().insert(id, kind);
        id
    }

    fn release(&self, id: GLuint, kind: Kind) {
        if id == 0 {
            return;
        }
        match self.live.borrow_mut().remove(&id) {
            Some(k) if k == kind => {}
            Some(k) => panic!("deleted {id} as {kind:?}, but it is a {k:?}"),
            None => panic!("{kind:?} {id} deleted twice or never created"),
        }
    }
}

/// Returns the first line that should end with `;` but does not.
fn syntax_error(source: &str) -> Option<(usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .find(|(_, l)| {
            !(l.is_empty()
                || l.starts_with('#')
                || l.starts_with("//")
                || *l == "{"
                || *l == "}"
                || (l.ends_with(')') && !l.contains('='))
                || l.ends_with(';'))
        })
}

impl GlDevice for RecordingDevice {
    fn create_vertex_array(&self) -> GLuint {
        let id = if self.fail_allocations.get() {
            0
        } else {
            self.allocate(Kind::VertexArray)
        };
        self.record(Call::CreateVertexArray(id));
        id
    }

    fn delete_vertex_array(&self, id: GLuint) {
        self.release(id, Kind::VertexArray);
        self.record(Call::DeleteVertexArray(id));
    }

    fn bind_vertex_array(&self, id: GLuint) {
        self.record(Call::BindVertexArray(id));
    }

    fn create_buffer(&self) -> GLuint {
        let id = if self.fail_allocations.get() {
            0
        } else {
            self.allocate(Kind::Buffer)
        };
        self.record(Call::CreateBuffer(id));
        id
    }

    fn delete_buffer(&self, id: GLuint) {
        self.release(id, Kind::Buffer);
        self.record(Call::DeleteBuffer(id));
    }

    fn upload_vertices(&self, id: GLuint, data: &[f32]) {
        self.record(Call::UploadVertices(id, data.to_vec()));
    }

    fn upload_indices(&self, id: GLuint, data: &[u32]) {
        self.record(Call::UploadIndices(id, data.to_vec()));
    }

    fn vertex_attribute(&self, index: GLuint, components: GLint, stride: GLsizei, offset: usize) {
        self.record(Call::VertexAttribute {
            index,
            components,
            stride,
            offset,
        });
    }

    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        let id = self.allocate(Kind::Shader);
        self.shaders.borrow_mut().insert(
            id,
            ShaderState {
                stage,
                compiled: false,
                log: String::new(),
            },
        );
        self.record(Call::CreateShader(id, stage));
        id
    }

    fn compile_shader(&self, id: GLuint, source: &str) -> bool {
        self.record(Call::CompileShader(id));

        let mut shaders = self.shaders.borrow_mut();
        let Some(state) = shaders.get_mut(&id) else {
            return false;
        };

        match syntax_error(source) {
            None => {
                state.compiled = true;
                state.log.clear();
            }
            Some((line, text)) => {
                state.compiled = false;
                state.log = format!("0:{line}(1): error: syntax error, expected ';' after `{text}`");
            }
        }

        state.compiled
    }

    fn shader_info_log(&self, id: GLuint) -> String {
        let log = self
            .shaders
            .borrow()
            .get(&id)
            .map(|s| s.log.clone())
            .unwrap_or_default();
        truncate_log(log)
    }

    fn delete_shader(&self, id: GLuint) {
        self.release(id, Kind::Shader);
        self.shaders.borrow_mut().remove(&id);
        self.record(Call::DeleteShader(id));
    }

    fn create_program(&self) -> GLuint {
        let id = self.allocate(Kind::Program);
        self.record(Call::CreateProgram(id));
        id
    }

    fn link_program(&self, id: GLuint, shaders: &[GLuint]) -> bool {
        self.record(Call::LinkProgram(id, shaders.to_vec()));

        let states = self.shaders.borrow();
        let mut log = String::new();
        let mut stages = Vec::new();

        for shader in shaders {
            match states.get(shader) {
                Some(s) if s.compiled => stages.push(s.stage),
                Some(s) => {
                    log = format!("error: linking with uncompiled {} shader {shader}", s.stage);
                    break;
                }
                None => {
                    log = format!("error: shader {shader} does not exist");
                    break;
                }
            }
        }

        if log.is_empty()
            && !(stages.contains(&ShaderStage::Vertex) && stages.contains(&ShaderStage::Fragment))
        {
            log = "error: program needs a vertex and a fragment stage".to_string();
        }

        let linked = log.is_empty();
        self.program_logs.borrow_mut().insert(id, log);
        linked
    }

    fn program_info_log(&self, id: GLuint) -> String {
        let log = self
            .program_logs
            .borrow()
            .get(&id)
            .cloned()
            .unwrap_or_default();
        truncate_log(log)
    }

    fn use_program(&self, id: GLuint) {
        self.record(Call::UseProgram(id));
    }

    fn delete_program(&self, id: GLuint) {
        self.release(id, Kind::Program);
        self.program_logs.borrow_mut().remove(&id);
        self.record(Call::DeleteProgram(id));
    }

    fn draw_elements(&self, count: GLsizei) {
        self.record(Call::DrawElements(count));
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(Call::Clear([r, g, b, a]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_check() {
        let good = "#version 460 core\nout vec4 c;\nvoid main()\n{\n    c = vec4(1.0);\n}\n";
        assert_eq!(syntax_error(good), None);

        let bad = good.replace("vec4(1.0);", "vec4(1.0)");
        assert_eq!(syntax_error(&bad), Some((5, "c = vec4(1.0)")));

        let bad = good.replace("out vec4 c;", "out vec4 c");
        assert_eq!(syntax_error(&bad), Some((2, "out vec4 c")));
    }

    #[test]
    #[should_panic(expected = "deleted twice")]
    fn double_delete_panics() {
        let device = RecordingDevice::new();
        let id = device.create_buffer();
        device.delete_buffer(id);
        device.delete_buffer(id);
    }

    #[test]
    fn failed_allocations_return_zero() {
        let device = RecordingDevice::new();
        device.fail_allocations(true);
        assert_eq!(device.create_buffer(), 0);
        assert_eq!(device.create_vertex_array(), 0);
        assert_eq!(device.live_objects(), 0);
    }
}
