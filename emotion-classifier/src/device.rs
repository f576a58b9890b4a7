use candle_core::{utils, Device};
use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// The compute device a model should be loaded on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceOption {
    /// Use CUDA device `0` if available, then Metal, and the CPU otherwise.
    #[default]
    Auto,
    Cpu,
    Metal,
    Cuda(usize),
}

impl DeviceOption {
    /// Get the [`candle_core::Device`] corresponding to the selected device option.
    ///
    /// # Errors
    ///
    /// Returns an error if an accelerator was explicitly requested but it is not available.
    pub fn device(&self) -> Result<Device> {
        match self {
            DeviceOption::Auto => {
                if utils::cuda_is_available() {
                    Ok(Device::new_cuda(0)?)
                } else if utils::metal_is_available() {
                    Ok(Device::new_metal(0)?)
                } else {
                    Ok(Device::Cpu)
                }
            }
            DeviceOption::Cpu => Ok(Device::Cpu),
            DeviceOption::Metal if utils::metal_is_available() => Ok(Device::new_metal(0)?),
            DeviceOption::Cuda(device_id) if utils::cuda_is_available() => {
                Ok(Device::new_cuda(*device_id)?)
            }
            _ => Err(Error::DeviceNotAvailable(self.to_string())),
        }
    }
}

impl fmt::Display for DeviceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceOption::Auto => write!(f, "auto"),
            DeviceOption::Cpu => write!(f, "cpu"),
            DeviceOption::Metal => write!(f, "metal"),
            DeviceOption::Cuda(device_id) => write!(f, "cuda:{}", device_id),
        }
    }
}

impl FromStr for DeviceOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(DeviceOption::Auto),
            "cpu" => Ok(DeviceOption::Cpu),
            "metal" => Ok(DeviceOption::Metal),
            s if s.starts_with("cuda:") => {
                let id = s["cuda:".len()..]
                    .parse::<usize>()
                    .map_err(|_| Error::msg(format!("Invalid CUDA device id: {}", s)))?;
                Ok(DeviceOption::Cuda(id))
            }
            _ => Err(Error::msg(format!("Invalid device option: {}", s))),
        }
    }
}
