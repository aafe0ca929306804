use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProvider, ExecutionProviderDispatch,
};

use crate::detection::domain::device::{Device, DeviceSelection};
use crate::detection::domain::errors::ModelLoadError;

/// Resolve the requested device selection to a concrete device.
///
/// An explicit device is taken as-is; whether it actually works surfaces
/// when its execution provider is registered. `Auto` prefers CUDA when the
/// runtime reports it, then the platform accelerator, then the CPU.
pub fn resolve_device(selection: DeviceSelection) -> Device {
    match selection {
        DeviceSelection::Explicit(device) => device,
        DeviceSelection::Auto => detect_device(),
    }
}

fn detect_device() -> Device {
    if CUDAExecutionProvider::default()
        .is_available()
        .unwrap_or(false)
    {
        return Device::Cuda(0);
    }
    #[cfg(target_os = "macos")]
    {
        Device::CoreMl
    }
    #[cfg(target_os = "windows")]
    {
        Device::DirectMl(0)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        log::warn!("No accelerator available, falling back to CPU");
        Device::Cpu
    }
}

/// Execution providers binding a session to `device`.
///
/// Accelerator providers fail registration instead of silently falling
/// back, so a model is never reported as running on a device it is not.
pub fn execution_providers(
    device: Device,
) -> Result<Vec<ExecutionProviderDispatch>, ModelLoadError> {
    match device {
        Device::Cpu => Ok(vec![CPUExecutionProvider::default().build()]),
        Device::Cuda(id) => Ok(vec![CUDAExecutionProvider::default()
            .with_device_id(id)
            .build()
            .error_on_failure()]),
        #[cfg(target_os = "macos")]
        Device::CoreMl => Ok(vec![
            ort::execution_providers::CoreMLExecutionProvider::default()
                .build()
                .error_on_failure(),
        ]),
        #[cfg(target_os = "windows")]
        Device::DirectMl(id) => Ok(vec![
            ort::execution_providers::DirectMLExecutionProvider::default()
                .with_device_id(id)
                .build()
                .error_on_failure(),
        ]),
        other => Err(ModelLoadError::DeviceUnavailable(format!(
            "{other} is not supported on this platform"
        ))),
    }
}
