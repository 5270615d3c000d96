//! Single-accelerator ResNet training on an ImageNet-style image folder.
//!
//! The crate wires burn's dataloaders, autodiff and optimizers into one linear run:
//! index `train/` and `val/`, split `train/` into train and validation, time the
//! dataloader on its own, then train and validate for a number of epochs.
//! See [`training::run`].

pub mod backend;
pub mod config;
pub mod data;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod model;
pub mod progress;
pub mod throughput;
pub mod training;

pub use burn;

pub use crate::config::TrainingConfig;
pub use crate::error::TrainError;
