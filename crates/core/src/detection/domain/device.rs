use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Compute target a loaded model is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(i32),
    CoreMl,
    DirectMl(i32),
}

/// Requested device: probe for an accelerator, or use the one given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceSelection {
    #[default]
    Auto,
    Explicit(Device),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unrecognized device '{0}' (expected auto, cpu, cuda, cuda:N, coreml, directml or directml:N)")]
pub struct DeviceParseError(pub String);

impl Device {
    pub fn is_accelerator(&self) -> bool {
        !matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(id) => write!(f, "cuda:{id}"),
            Device::CoreMl => write!(f, "coreml"),
            Device::DirectMl(id) => write!(f, "directml:{id}"),
        }
    }
}

impl FromStr for Device {
    type Err = DeviceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let (kind, index) = match normalized.split_once(':') {
            Some((kind, index)) => {
                let id = index
                    .parse::<i32>()
                    .ok()
                    .filter(|id| *id >= 0)
                    .ok_or_else(|| DeviceParseError(s.to_string()))?;
                (kind, Some(id))
            }
            None => (normalized.as_str(), None),
        };

        match (kind, index) {
            ("cpu", None) => Ok(Device::Cpu),
            ("cuda", id) => Ok(Device::Cuda(id.unwrap_or(0))),
            ("coreml", None) => Ok(Device::CoreMl),
            ("directml", id) => Ok(Device::DirectMl(id.unwrap_or(0))),
            _ => Err(DeviceParseError(s.to_string())),
        }
    }
}

impl FromStr for DeviceSelection {
    type Err = DeviceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(DeviceSelection::Auto)
        } else {
            s.parse().map(DeviceSelection::Explicit)
        }
    }
}

impl fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelection::Auto => write!(f, "auto"),
            DeviceSelection::Explicit(device) => fmt::Display::fmt(device, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cpu", Device::Cpu)]
    #[case("CPU", Device::Cpu)]
    #[case("cuda", Device::Cuda(0))]
    #[case("cuda:1", Device::Cuda(1))]
    #[case(" coreml ", Device::CoreMl)]
    #[case("directml", Device::DirectMl(0))]
    #[case("directml:2", Device::DirectMl(2))]
    fn test_parse_device(#[case] input: &str, #[case] expected: Device) {
        assert_eq!(input.parse::<Device>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("gpu")]
    #[case("cuda:")]
    #[case("cuda:-1")]
    #[case("cpu:0")]
    #[case("mps")]
    fn test_parse_device_rejects(#[case] input: &str) {
        assert!(input.parse::<Device>().is_err());
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!("auto".parse::<DeviceSelection>(), Ok(DeviceSelection::Auto));
        assert_eq!("AUTO".parse::<DeviceSelection>(), Ok(DeviceSelection::Auto));
        assert_eq!(
            "cuda:0".parse::<DeviceSelection>(),
            Ok(DeviceSelection::Explicit(Device::Cuda(0)))
        );
    }

    #[test]
    fn test_display_round_trips() {
        for device in [Device::Cpu, Device::Cuda(3), Device::CoreMl, Device::DirectMl(1)] {
            assert_eq!(device.to_string().parse::<Device>().unwrap(), device);
        }
    }

    #[test]
    fn test_is_accelerator() {
        assert!(!Device::Cpu.is_accelerator());
        assert!(Device::Cuda(0).is_accelerator());
    }
}
