mod app;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lattice_engine::device::GpuInit;
use lattice_engine::logging::{LoggingConfig, init_logging};
use lattice_engine::window::{Runtime, RuntimeConfig};
use lattice_engine::RendererConfig;

use app::CubesApp;

/// Read when no path is given on the command line, if present.
const DEFAULT_CONFIG_PATH: &str = "lattice.toml";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;
    log::info!(
        "{} instances, fov {}°, {}x msaa",
        config.instance_count,
        config.fov_y_degrees,
        config.sample_count
    );

    Runtime::run(
        RuntimeConfig {
            title: "lattice: instanced cubes".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        CubesApp::new(config),
    )
}

fn load_config(explicit: Option<PathBuf>) -> Result<RendererConfig> {
    if let Some(path) = explicit {
        return RendererConfig::load(&path).with_context(|| format!("loading {}", path.display()));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        log::info!("using {}", default_path.display());
        return RendererConfig::load(default_path)
            .with_context(|| format!("loading {}", default_path.display()));
    }

    Ok(RendererConfig::default())
}
