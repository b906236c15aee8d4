use gl::types::GLuint;
use thiserror::Error;

use crate::device::{GlDevice, ShaderStage};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("ERROR::SHADER::{stage}::COMPILATION_FAILED\n{log}")]
    Compilation { stage: ShaderStage, log: String },
    #[error("ERROR::SHADER::LINKING_FAILED\n{0}")]
    Linking(String),
}

/// A compiled shader stage.
///
/// The handle is kept even when compilation failed, it is up to the caller to [`Shader::check`]
/// the outcome before linking with it.
pub struct Shader<'d, D: GlDevice> {
    device: &'d D,
    id: GLuint,
    stage: ShaderStage,
    log: Option<String>,
}

impl<'d, D: GlDevice> Shader<'d, D> {
    pub fn compile(device: &'d D, stage: ShaderStage, source: &str) -> Self {
        let id = device.create_shader(stage);

        let log = if device.compile_shader(id, source) {
            None
        } else {
            Some(device.shader_info_log(id))
        };

        Self {
            device,
            id,
            stage,
            log,
        }
    }

    pub fn get_id(&self) -> GLuint {
        self.id
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn is_compiled(&self) -> bool {
        self.log.is_none()
    }

    pub fn check(&self) -> Result<(), ShaderError> {
        match &self.log {
            None => Ok(()),
            Some(log) => Err(ShaderError::Compilation {
                stage: self.stage,
                log: log.clone(),
            }),
        }
    }
}

impl<'d, D: GlDevice> Drop for Shader<'d, D> {
    fn drop(&mut self) {
        self.device.delete_shader(self.id)
    }
}

/// A linked program. Outlives the [`Shader`]s it was linked from.
pub struct Program<'d, D: GlDevice> {
    device: &'d D,
    id: GLuint,
    log: Option<String>,
}

impl<'d, D: GlDevice> Program<'d, D> {
    /// Links a vertex and a fragment stage. Like [`Shader::compile`], the handle is returned
    /// whatever the outcome.
    pub fn link(device: &'d D, vertex: &Shader<'_, D>, fragment: &Shader<'_, D>) -> Self {
        debug_assert_eq!(vertex.stage(), ShaderStage::Vertex);
        debug_assert_eq!(fragment.stage(), ShaderStage::Fragment);

        let id = device.create_program();

        let log = if device.link_program(id, &[vertex.get_id(), fragment.get_id()]) {
            None
        } else {
            Some(device.program_info_log(id))
        };

        Self { device, id, log }
    }

    pub fn get_id(&self) -> GLuint {
        self.id
    }

    pub fn is_linked(&self) -> bool {
        self.log.is_none()
    }

    pub fn check(&self) -> Result<(), ShaderError> {
        match &self.log {
            None => Ok(()),
            Some(log) => Err(ShaderError::Linking(log.clone())),
        }
    }
}

impl<'d, D: GlDevice> Drop for Program<'d, D> {
    fn drop(&mut self) {
        self.device.delete_program(self.id)
    }
}
