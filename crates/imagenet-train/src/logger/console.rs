use burn::train::ApplicationLoggerInstaller;
use tracing_core::Level;
use tracing_subscriber::filter::{EnvFilter, filter_fn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, registry};

use crate::error::TrainError;

/// Directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Installs a human-readable stderr logger for the `log` facade.
///
/// The level comes from `RUST_LOG`, falling back to the directive given at construction.
pub struct ConsoleLoggerInstaller {
    default_directive: String,
}

impl ConsoleLoggerInstaller {
    pub fn new(default_directive: impl Into<String>) -> Self {
        Self {
            default_directive: default_directive.into(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_directive))
    }
}

impl Default for ConsoleLoggerInstaller {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_DIRECTIVE)
    }
}

/// GPU runtimes report every pipeline and buffer at `info`; only their warnings get through.
fn is_noisy_gpu_runtime(module_path: Option<&str>, level: &Level) -> bool {
    let from_gpu_runtime =
        module_path.is_some_and(|path| path.starts_with("wgpu") || path.starts_with("cubecl"));
    from_gpu_runtime && *level >= Level::INFO
}

impl ApplicationLoggerInstaller for ConsoleLoggerInstaller {
    fn install(&self) -> Result<(), String> {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(self.env_filter())
            .with_filter(filter_fn(|m| !is_noisy_gpu_runtime(m.module_path(), m.level())));

        if registry().with(layer).try_init().is_err() {
            return Err("Failed to install the console logger.".to_string());
        }

        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            log::error!("PANIC => {info}");
            hook(info);
        }));

        Ok(())
    }
}

/// Installs the default [`ConsoleLoggerInstaller`].
pub fn install_console_logger() -> Result<(), TrainError> {
    ConsoleLoggerInstaller::default()
        .install()
        .map_err(TrainError::Logger)
}
