//! Demo configuration.
//!
//! Every value the demo would otherwise hardcode lives here. The defaults
//! reproduce the stock scene; override fields with struct update syntax.

use std::path::PathBuf;

use common::shader::ShaderSource;

#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Window title
    pub title: String,
    /// Initial window size in pixels (width, height)
    pub window_size: (i32, i32),
    pub vertex_shader: ShaderSource,
    pub pixel_shader: ShaderSource,
    /// Image sampled by both cubes
    pub texture_path: PathBuf,
    /// Background clear color [R, G, B, A] (0.0-1.0 range)
    pub clear_color: [f32; 4],
    /// Rotation applied per update, in radians
    pub rotation_step: f32,
    /// Rotation before the first update, in radians
    pub initial_rotation: f32,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Hello DX11".to_string(),
            window_size: (1440, 1080),
            vertex_shader: ShaderSource::vertex("vs.hlsl", "vs"),
            pixel_shader: ShaderSource::pixel("ps.hlsl", "ps"),
            texture_path: PathBuf::from("image.png"),
            clear_color: [1.0, 0.0, 1.0, 1.0],
            rotation_step: 0.0005,
            initial_rotation: 0.01,
            fullscreen: false,
            vsync: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::ShaderStage;

    #[test]
    fn defaults_describe_the_stock_demo() {
        let config = DemoConfig::default();

        assert_eq!(config.window_size, (1440, 1080));
        assert_eq!(config.vertex_shader.stage, ShaderStage::Vertex);
        assert_eq!(config.vertex_shader.entry_point, "vs");
        assert_eq!(config.pixel_shader.entry_point, "ps");
        assert_eq!(config.texture_path, PathBuf::from("image.png"));
        assert_eq!(config.clear_color, [1.0, 0.0, 1.0, 1.0]);
        assert!(!config.vsync);
        assert!(!config.fullscreen);
    }

    #[test]
    fn overriding_one_field_keeps_the_rest() {
        let config = DemoConfig {
            vsync: true,
            texture_path: PathBuf::from("assets/crate.png"),
            ..DemoConfig::default()
        };

        assert!(config.vsync);
        assert_eq!(config.texture_path, PathBuf::from("assets/crate.png"));
        assert_eq!(config.vertex_shader.target, "vs_5_0");
        assert_eq!(config.title, "Hello DX11");
    }
}
