use log::{error, info};

use gl_wrapper::device::{GlDevice, ShaderStage};
use gl_wrapper::program::{Program, Shader, ShaderError};

pub const VERTEX_SHADER: &str = include_str!("gl_shaders/position.glsl");
pub const ORANGE_FRAGMENT_SHADER: &str = include_str!("gl_shaders/orange.glsl");
pub const PURPLE_FRAGMENT_SHADER: &str = include_str!("gl_shaders/purple.glsl");

/// What to do when a stage fails to compile or a program fails to link.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ShaderPolicy {
    /// Log the diagnostic and keep going, the affected program draws nothing.
    #[default]
    Lenient,
    /// Stop at the first failure.
    Strict,
}

impl ShaderPolicy {
    fn handle(&self, err: ShaderError) -> Result<(), ShaderError> {
        error!("{err}");
        match self {
            ShaderPolicy::Lenient => Ok(()),
            ShaderPolicy::Strict => Err(err),
        }
    }
}

pub struct Programs<'d, D: GlDevice> {
    pub orange: Program<'d, D>,
    pub purple: Program<'d, D>,
}

pub struct ShaderSources<'s> {
    pub vertex: &'s str,
    pub orange: &'s str,
    pub purple: &'s str,
}

impl Default for ShaderSources<'_> {
    fn default() -> Self {
        Self {
            vertex: VERTEX_SHADER,
            orange: ORANGE_FRAGMENT_SHADER,
            purple: PURPLE_FRAGMENT_SHADER,
        }
    }
}

/// Compiles the shared vertex stage and both fragment stages and links the two programs.
///
/// The stages are released on return, the programs keep working without them.
pub fn build_programs<'d, D: GlDevice>(
    device: &'d D,
    sources: &ShaderSources<'_>,
    policy: ShaderPolicy,
) -> Result<Programs<'d, D>, ShaderError> {
    let vertex = compile(device, ShaderStage::Vertex, sources.vertex, policy)?;
    let orange_frag = compile(device, ShaderStage::Fragment, sources.orange, policy)?;
    let purple_frag = compile(device, ShaderStage::Fragment, sources.purple, policy)?;

    let orange = link(device, "orange", &vertex, &orange_frag, policy)?;
    let purple = link(device, "purple", &vertex, &purple_frag, policy)?;

    info!(
        "Shader programs ready (orange: {}, purple: {})",
        orange.get_id(),
        purple.get_id()
    );

    Ok(Programs { orange, purple })
}

fn compile<'d, D: GlDevice>(
    device: &'d D,
    stage: ShaderStage,
    source: &str,
    policy: ShaderPolicy,
) -> Result<Shader<'d, D>, ShaderError> {
    let shader = Shader::compile(device, stage, source);

    if let Err(e) = shader.check() {
        policy.handle(e)?;
    }

    Ok(shader)
}

fn link<'d, D: GlDevice>(
    device: &'d D,
    name: &str,
    vertex: &Shader<'d, D>,
    fragment: &Shader<'d, D>,
    policy: ShaderPolicy,
) -> Result<Program<'d, D>, ShaderError> {
    let program = Program::link(device, vertex, fragment);

    if let Err(e) = program.check() {
        error!("Could not link the {name} program");
        policy.handle(e)?;
    }

    Ok(program)
}
