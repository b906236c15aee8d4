use gl::types::{GLchar, GLint, GLsizei, GLuint};
use std::ffi::c_void;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use thiserror::Error;

/// Maximum length of a shader or program info log, in bytes.
pub const INFO_LOG_CAPACITY: usize = 512;

/// The OpenGL calls the wrappers in this crate are built from.
///
/// Every method maps onto one or a few fixed GL calls. Handles are plain GL names and `0` means the
/// driver could not allocate the object.
pub trait GlDevice {
    fn create_vertex_array(&self) -> GLuint;
    fn delete_vertex_array(&self, id: GLuint);
    fn bind_vertex_array(&self, id: GLuint);

    fn create_buffer(&self) -> GLuint;
    fn delete_buffer(&self, id: GLuint);
    /// Binds `id` as `ARRAY_BUFFER` and fills it with static data.
    fn upload_vertices(&self, id: GLuint, data: &[f32]);
    /// Binds `id` as `ELEMENT_ARRAY_BUFFER` and fills it with static data.
    ///
    /// The element binding is stored in the currently bound vertex array.
    fn upload_indices(&self, id: GLuint, data: &[u32]);
    /// Describes float attribute `index` of the bound vertex array and enables it.
    fn vertex_attribute(&self, index: GLuint, components: GLint, stride: GLsizei, offset: usize);

    fn create_shader(&self, stage: ShaderStage) -> GLuint;
    /// Uploads the source and compiles it, returns the compile status.
    fn compile_shader(&self, id: GLuint, source: &str) -> bool;
    fn shader_info_log(&self, id: GLuint) -> String;
    fn delete_shader(&self, id: GLuint);

    fn create_program(&self) -> GLuint;
    /// Attaches `shaders` and links, returns the link status.
    fn link_program(&self, id: GLuint, shaders: &[GLuint]) -> bool;
    fn program_info_log(&self, id: GLuint) -> String;
    fn use_program(&self, id: GLuint);
    fn delete_program(&self, id: GLuint);

    /// Indexed triangle draw of `count` `u32` indices from the bound element buffer.
    fn draw_elements(&self, count: GLsizei);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(&self) -> gl::types::GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "VERTEX"),
            ShaderStage::Fragment => write!(f, "FRAGMENT"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to load OpenGL function pointer for gl{0}")]
    MissingFunction(&'static str),
}

/// Cuts an info log down to [`INFO_LOG_CAPACITY`] bytes without splitting a character.
pub fn truncate_log(mut log: String) -> String {
    if log.len() > INFO_LOG_CAPACITY {
        let mut end = INFO_LOG_CAPACITY;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}

/// [`GlDevice`] backed by the `gl` crate's global function pointers.
///
/// Only obtainable through [`NativeGl::load_with`], so holding one means the pointers are loaded.
/// GL contexts are bound to one thread, so this is neither `Send` nor `Sync`.
pub struct NativeGl {
    _thread_bound: PhantomData<*const ()>,
}

macro_rules! check_loaded {
    ($($name:ident),* $(,)?) => {
        $(
            if !gl::$name::is_loaded() {
                return Err(DeviceError::MissingFunction(stringify!($name)));
            }
        )*
    };
}

impl NativeGl {
    /// Loads every function pointer through `loader` and fails on the first one the platform did
    /// not provide.
    pub fn load_with<F>(loader: F) -> Result<Self, DeviceError>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        check_loaded!(
            GenVertexArrays,
            DeleteVertexArrays,
            BindVertexArray,
            GenBuffers,
            DeleteBuffers,
            BindBuffer,
            BufferData,
            VertexAttribPointer,
            EnableVertexAttribArray,
            CreateShader,
            ShaderSource,
            CompileShader,
            GetShaderiv,
            GetShaderInfoLog,
            DeleteShader,
            CreateProgram,
            AttachShader,
            LinkProgram,
            GetProgramiv,
            GetProgramInfoLog,
            UseProgram,
            DeleteProgram,
            DrawElements,
            Viewport,
            ClearColor,
            Clear,
        );

        Ok(Self {
            _thread_bound: PhantomData,
        })
    }
}

impl GlDevice for NativeGl {
    fn create_vertex_array(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenVertexArrays(1, (&mut id) as *mut u32) };
        id
    }

    fn delete_vertex_array(&self, id: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, (&id) as *const u32) }
    }

    fn bind_vertex_array(&self, id: GLuint) {
        unsafe { gl::BindVertexArray(id) }
    }

    fn create_buffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::GenBuffers(1, (&mut id) as *mut u32) };
        id
    }

    fn delete_buffer(&self, id: GLuint) {
        unsafe { gl::DeleteBuffers(1, (&id) as *const u32) }
    }

    fn upload_vertices(&self, id: GLuint, data: &[f32]) {
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, id);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(data) as isize,
                data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
        }
    }

    fn upload_indices(&self, id: GLuint, data: &[u32]) {
        unsafe {
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, id);
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                std::mem::size_of_val(data) as isize,
                data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
        }
    }

    fn vertex_attribute(&self, index: GLuint, components: GLint, stride: GLsizei, offset: usize) {
        unsafe {
            gl::VertexAttribPointer(
                index,
                components,
                gl::FLOAT,
                gl::FALSE,
                stride,
                offset as *const c_void,
            );
            gl::EnableVertexAttribArray(index);
        }
    }

    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn compile_shader(&self, id: GLuint, source: &str) -> bool {
        let mut success: GLint = 0;
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;

        unsafe {
            gl::ShaderSource(id, 1, (&ptr) as *const *const GLchar, (&len) as *const GLint);
            gl::CompileShader(id);
            gl::GetShaderiv(id, gl::COMPILE_STATUS, (&mut success) as *mut GLint);
        }

        success == gl::TRUE as GLint
    }

    fn shader_info_log(&self, id: GLuint) -> String {
        let mut buf = [0_u8; INFO_LOG_CAPACITY];
        let mut written: GLsizei = 0;

        unsafe {
            gl::GetShaderInfoLog(
                id,
                INFO_LOG_CAPACITY as GLsizei,
                (&mut written) as *mut GLsizei,
                buf.as_mut_ptr() as *mut GLchar,
            );
        }

        String::from_utf8_lossy(&buf[..written.max(0) as usize]).into_owned()
    }

    fn delete_shader(&self, id: GLuint) {
        unsafe { gl::DeleteShader(id) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn link_program(&self, id: GLuint, shaders: &[GLuint]) -> bool {
        let mut success: GLint = 0;

        unsafe {
            for shader in shaders {
                gl::AttachShader(id, *shader);
            }
            gl::LinkProgram(id);
            gl::GetProgramiv(id, gl::LINK_STATUS, (&mut success) as *mut GLint);
        }

        success == gl::TRUE as GLint
    }

    fn program_info_log(&self, id: GLuint) -> String {
        let mut buf = [0_u8; INFO_LOG_CAPACITY];
        let mut written: GLsizei = 0;

        unsafe {
            gl::GetProgramInfoLog(
                id,
                INFO_LOG_CAPACITY as GLsizei,
                (&mut written) as *mut GLsizei,
                buf.as_mut_ptr() as *mut GLchar,
            );
        }

        String::from_utf8_lossy(&buf[..written.max(0) as usize]).into_owned()
    }

    fn use_program(&self, id: GLuint) {
        unsafe { gl::UseProgram(id) }
    }

    fn delete_program(&self, id: GLuint) {
        unsafe { gl::DeleteProgram(id) }
    }

    fn draw_elements(&self, count: GLsizei) {
        unsafe {
            gl::DrawElements(gl::TRIANGLES, count, gl::UNSIGNED_INT, std::ptr::null());
        }
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { gl::Viewport(x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe {
            gl::ClearColor(r, g, b, a);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }
}
