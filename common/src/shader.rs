//! Shader compilation seam.
//!
//! Pipeline setup only needs compiled bytecode; where it comes from is up to
//! the [`ShaderCompiler`] handed to the renderer.

use std::path::{Path, PathBuf};

use crate::error::{Result, ShaderStage};

/// One HLSL entry point to compile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub path: PathBuf,
    pub entry_point: String,
    pub target: String,
}

impl ShaderSource {
    /// Shader model 5.0 vertex shader.
    pub fn vertex(path: impl Into<PathBuf>, entry_point: impl Into<String>) -> Self {
        Self {
            stage: ShaderStage::Vertex,
            path: path.into(),
            entry_point: entry_point.into(),
            target: "vs_5_0".to_string(),
        }
    }

    /// Shader model 5.0 pixel shader.
    pub fn pixel(path: impl Into<PathBuf>, entry_point: impl Into<String>) -> Self {
        Self {
            stage: ShaderStage::Pixel,
            path: path.into(),
            entry_point: entry_point.into(),
            target: "ps_5_0".to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub trait ShaderCompiler {
    /// Returns the bytecode for `source`, or the compiler's diagnostics.
    fn compile(&self, source: &ShaderSource) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_shader_model_5_profiles() {
        let vs = ShaderSource::vertex("vs.hlsl", "vs");
        let ps = ShaderSource::pixel("ps.hlsl", "ps");

        assert_eq!(vs.stage, ShaderStage::Vertex);
        assert_eq!(vs.target, "vs_5_0");
        assert_eq!(ps.stage, ShaderStage::Pixel);
        assert_eq!(ps.target, "ps_5_0");
        assert_eq!(ps.path(), Path::new("ps.hlsl"));
    }
}
