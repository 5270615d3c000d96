mod cli;

use imagenet_train::backend::{self, TrainingBackend};
use imagenet_train::logger::install_console_logger;
use imagenet_train::training;

#[cfg(not(any(feature = "wgpu", feature = "cuda")))]
compile_error!("enable the `wgpu` or `cuda` feature to select an accelerator backend");

fn main() -> anyhow::Result<()> {
    let args = cli::parse_train_args();

    let device = backend::select_accelerator()?;

    install_console_logger()?;

    let config = args.training_config();
    log::debug!("Training configuration: {config}");

    training::run::<TrainingBackend>(&config, &args.dataset_root(), device)?;

    println!("Done!");
    Ok(())
}
