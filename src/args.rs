use clap::Parser;

use crate::shaders::ShaderPolicy;

/// Draws two colored rectangles with OpenGL 4.6
#[derive(Debug, Parser)]
#[command(version)]
pub struct ArgsSikrusher {
    /// Exit when a shader fails to compile or link instead of drawing without it
    #[arg(long, default_value_t = false)]
    pub strict_shaders: bool,
    /// Log filter in env_logger syntax (e.g. "debug", "sikrusher=trace"), overrides RUST_LOG
    #[arg(long)]
    pub log: Option<String>,
}

impl ArgsSikrusher {
    pub fn shader_policy(&self) -> ShaderPolicy {
        if self.strict_shaders {
            ShaderPolicy::Strict
        } else {
            ShaderPolicy::Lenient
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_valid() {
        ArgsSikrusher::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = ArgsSikrusher::try_parse_from(["sikrusher"]).unwrap();
        assert!(!args.strict_shaders);
        assert_eq!(args.log, None);
        assert_eq!(args.shader_policy(), ShaderPolicy::Lenient);
    }

    #[test]
    fn strict() {
        let args =
            ArgsSikrusher::try_parse_from(["sikrusher", "--strict-shaders", "--log", "debug"])
                .unwrap();
        assert_eq!(args.shader_policy(), ShaderPolicy::Strict);
        assert_eq!(args.log.as_deref(), Some("debug"));
    }
}
