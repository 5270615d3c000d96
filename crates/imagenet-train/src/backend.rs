use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};

use burn::prelude::*;
use burn::tensor::ElementConversion;

use crate::error::{Result, TrainError};

#[cfg(feature = "cuda")]
pub type AcceleratorBackend = burn::backend::Cuda;
#[cfg(all(feature = "wgpu", not(feature = "cuda")))]
pub type AcceleratorBackend = burn::backend::Wgpu;

#[cfg(any(feature = "cuda", feature = "wgpu"))]
pub type TrainingBackend = burn::backend::Autodiff<AcceleratorBackend>;

/// Devices tried in order by [`select_accelerator`].
///
/// The wgpu default device may resolve to a software adapter such as llvmpipe,
/// so only discrete and integrated GPUs are candidates.
#[cfg(all(feature = "wgpu", not(feature = "cuda")))]
pub fn candidate_devices() -> Vec<Device<AcceleratorBackend>> {
    use burn::backend::wgpu::WgpuDevice;

    vec![WgpuDevice::DiscreteGpu(0), WgpuDevice::IntegratedGpu(0)]
}

#[cfg(feature = "cuda")]
pub fn candidate_devices() -> Vec<Device<AcceleratorBackend>> {
    vec![Default::default()]
}

/// First candidate device that passes [`ensure_accelerator`].
///
/// Backends panic while probing a missing adapter. The default panic hook is
/// silenced for the duration so those panics only surface as the returned error.
#[cfg(any(feature = "cuda", feature = "wgpu"))]
pub fn select_accelerator() -> Result<Device<AcceleratorBackend>> {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));

    let mut failures = Vec::new();
    let mut selected = None;
    for device in candidate_devices() {
        match ensure_accelerator::<AcceleratorBackend>(&device) {
            Ok(()) => {
                selected = Some(device);
                break;
            }
            Err(err) => failures.push(err.to_string()),
        }
    }

    panic::set_hook(hook);

    selected.ok_or_else(|| TrainError::NoAccelerator(failures.join("; ")))
}

/// Fails unless `device` can run a computation and read the result back.
pub fn ensure_accelerator<B: Backend>(device: &B::Device) -> Result<()> {
    check_probe(device, || {
        Tensor::<B, 1>::ones([4], device)
            .sum()
            .into_scalar()
            .elem::<f32>()
    })
}

/// Runs `probe`, which must sum four ones on `device`.
///
/// A panic inside the probe becomes [`TrainError::NoAccelerator`].
fn check_probe<D: Debug>(device: &D, probe: impl FnOnce() -> f32) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(probe)) {
        Ok(sum) if sum == 4.0 => {
            log::debug!("Accelerator {device:?} is available");
            Ok(())
        }
        Ok(sum) => Err(TrainError::NoAccelerator(format!(
            "{device:?} computed {sum} instead of 4 for a sum of four ones"
        ))),
        Err(_) => Err(TrainError::NoAccelerator(format!(
            "{device:?} could not be initialized"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn working_device_passes_the_check() {
        let device = Default::default();

        assert!(ensure_accelerator::<NdArray>(&device).is_ok());
    }

    #[test]
    fn panicking_device_is_reported_missing() {
        let result = check_probe(&"DiscreteGpu(0)", || panic!("no adapter found"));

        match result {
            Err(TrainError::NoAccelerator(reason)) => {
                assert!(reason.contains("DiscreteGpu(0)"));
                assert!(reason.contains("could not be initialized"));
            }
            other => panic!("expected a missing accelerator, got {other:?}"),
        }
    }

    #[test]
    fn wrong_result_is_reported_missing() {
        let result = check_probe(&"IntegratedGpu(0)", || 0.0);

        assert!(matches!(result, Err(TrainError::NoAccelerator(reason)) if reason.contains("computed 0")));
    }
}
