#![windows_subsystem = "windows"]
#![cfg_attr(not(windows), allow(dead_code))]

mod config;
mod frame;
#[cfg(windows)]
mod renderer;
mod scene;
mod settings;

use common::{error::Result, util};

use crate::config::DemoConfig;

fn main() {
    util::init_logging();

    let code = match run(DemoConfig::default()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            util::show_error_box(&e.caption(), &e.to_string());
            e.exit_code()
        }
    };

    log::debug!("exiting with code {code}");
    std::process::exit(code);
}

/// Runs the demo until the window closes; returns the quit message's code.
#[cfg(windows)]
fn run(config: DemoConfig) -> Result<i32> {
    use common::{gfx::FxcCompiler, os::App};

    use crate::{renderer::Renderer, settings::Settings};

    let (mut app, window) = App::init(config.title.clone(), config.window_size)?;

    let settings = Settings::from_client_size(
        window.get_physical_size(),
        config.fullscreen,
        config.vsync,
    );

    let mut renderer = Renderer::new(&config);
    renderer.initialize(
        window.get_handle(),
        &settings,
        &config,
        &FxcCompiler::default(),
    )?;

    // Run main loop.
    while app.run() {
        renderer.update();
        if !renderer.render() {
            break;
        }
    }

    renderer.terminate();
    drop(window);

    Ok(app.exit_code())
}

#[cfg(not(windows))]
fn run(_config: DemoConfig) -> Result<i32> {
    Err(common::Error::UnsupportedPlatform)
}
