use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;

/// Environment variable that overrides device detection.
pub const DEVICE_ENV: &str = "VOICEGEN_DEVICE";

/// Compute device the synthesizer should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    Mps,
    Cpu,
}

impl Device {
    /// Pick the best available device.
    ///
    /// Order: `VOICEGEN_DEVICE` if set and valid, CUDA when `nvidia-smi -L`
    /// succeeds, MPS on Apple Silicon, otherwise CPU.
    pub fn probe() -> Self {
        if let Ok(value) = std::env::var(DEVICE_ENV) {
            match value.parse() {
                Ok(device) => {
                    log::debug!("Device forced by {DEVICE_ENV}: {device}");
                    return device;
                }
                Err(e) => log::warn!("Ignoring {DEVICE_ENV}: {e}"),
            }
        }

        if cuda_available() {
            Device::Cuda
        } else if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
            Device::Mps
        } else {
            Device::Cpu
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Mps => "mps",
            Device::Cpu => "cpu",
        }
    }

    /// Half precision is only worth it on accelerators.
    pub fn use_half(&self) -> bool {
        !matches!(self, Device::Cpu)
    }

    pub fn autoregressive_batch_size(&self) -> u32 {
        match self {
            Device::Cpu => 1,
            Device::Cuda | Device::Mps => 4,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" | "gpu" => Ok(Device::Cuda),
            "mps" | "metal" => Ok(Device::Mps),
            "cpu" => Ok(Device::Cpu),
            other => Err(format!("unknown device '{other}' (expected cuda, mps or cpu)")),
        }
    }
}

fn cuda_available() -> bool {
    Command::new("nvidia-smi")
        .arg("-L")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::Device;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("cuda".parse::<Device>(), Ok(Device::Cuda));
        assert_eq!(" Metal ".parse::<Device>(), Ok(Device::Mps));
        assert_eq!("CPU".parse::<Device>(), Ok(Device::Cpu));
        assert!("tpu".parse::<Device>().is_err());
    }

    #[test]
    fn cpu_runs_full_precision_single_batch() {
        assert!(!Device::Cpu.use_half());
        assert_eq!(Device::Cpu.autoregressive_batch_size(), 1);
        assert!(Device::Cuda.use_half());
        assert_eq!(Device::Mps.autoregressive_batch_size(), 4);
    }

    #[test]
    fn display_round_trips() {
        for device in [Device::Cuda, Device::Mps, Device::Cpu] {
            assert_eq!(device.to_string().parse::<Device>(), Ok(device));
        }
    }
}
