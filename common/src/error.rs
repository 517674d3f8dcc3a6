use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Exit code returned when the window class cannot be registered.
pub const EXIT_WINDOW_CLASS: i32 = -1;
/// Exit code returned when the window cannot be created.
pub const EXIT_WINDOW_CREATION: i32 = -2;
/// Exit code returned when any graphics initialisation step fails.
pub const EXIT_GRAPHICS: i32 = -3;

/// Programmable pipeline stage a shader is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    pub fn short_name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VS",
            ShaderStage::Pixel => "PS",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Pixel => f.write_str("pixel"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error registering window class")]
    WindowClass,

    #[error("Error creating window")]
    WindowCreation,

    /// A device call made while setting up `step` returned a failing HRESULT.
    #[error("Failed to {step}: {source}")]
    Graphics {
        step: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The compiler rejected the source; `diagnostics` is its literal output.
    #[error("{diagnostics}")]
    ShaderCompilation {
        stage: ShaderStage,
        diagnostics: String,
    },

    #[error("Error loading {stage} shader {}: {source}", .path.display())]
    ShaderLoad {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error creating texture buffer from {}: {source}", .path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Direct3D 11 rendering requires Windows")]
    UnsupportedPlatform,
}

impl Error {
    /// Adapter for `map_err` that tags a device failure with the step it broke.
    pub fn graphics<E>(step: &'static str) -> impl FnOnce(E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |source| Error::Graphics {
            step,
            source: Box::new(source),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::WindowClass => EXIT_WINDOW_CLASS,
            Error::WindowCreation => EXIT_WINDOW_CREATION,
            _ => EXIT_GRAPHICS,
        }
    }

    /// Title of the modal dialog reporting this error.
    pub fn caption(&self) -> String {
        match self {
            Error::ShaderCompilation { stage, .. } => format!("ERROR ({})", stage.short_name()),
            _ => "ERROR".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_startup_phase() {
        assert_eq!(Error::WindowClass.exit_code(), -1);
        assert_eq!(Error::WindowCreation.exit_code(), -2);
        assert_eq!(Error::UnsupportedPlatform.exit_code(), -3);

        let shader = Error::ShaderCompilation {
            stage: ShaderStage::Pixel,
            diagnostics: "ps.hlsl(3,1): error X3000: syntax error".to_string(),
        };
        assert_eq!(shader.exit_code(), EXIT_GRAPHICS);
    }

    #[test]
    fn shader_compilation_surfaces_compiler_text_verbatim() {
        let diagnostics = "vs.hlsl(12,5): error X3004: undeclared identifier 'wvp'\n";
        let error = Error::ShaderCompilation {
            stage: ShaderStage::Vertex,
            diagnostics: diagnostics.to_string(),
        };

        assert_eq!(error.to_string(), diagnostics);
        assert_eq!(error.caption(), "ERROR (VS)");
    }

    #[test]
    fn graphics_errors_name_the_failing_step() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "E_OUTOFMEMORY");
        let error = Error::graphics("create depth/stencil buffer")(io);

        assert_eq!(error.exit_code(), EXIT_GRAPHICS);
        assert_eq!(
            error.to_string(),
            "Failed to create depth/stencil buffer: E_OUTOFMEMORY"
        );
    }

    #[test]
    fn non_shader_errors_use_generic_caption() {
        let error = Error::ShaderLoad {
            stage: ShaderStage::Pixel,
            path: PathBuf::from("ps.hlsl"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };

        assert_eq!(error.caption(), "ERROR");
        assert!(error.to_string().contains("ps.hlsl"));
        assert!(error.to_string().starts_with("Error loading pixel shader"));
    }
}
