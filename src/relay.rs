//! Switch gating the charging line.

use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::prelude::*;

/// Binary actuator. All operations are idempotent.
pub trait Relay: Sync {
    /// Close the relay and energize the charging line.
    fn enable(&self) -> Result;

    /// Open the relay and let the device sleep.
    fn disable(&self) -> Result;

    fn is_enabled(&self) -> Result<bool>;
}

/// GPIO pin exported through sysfs, for example `/sys/class/gpio/gpio17/value`.
///
/// The pin is expected to be exported and configured as an output beforehand.
pub struct SysfsRelay {
    value_path: PathBuf,
}

impl SysfsRelay {
    pub const fn new(value_path: PathBuf) -> Self {
        Self { value_path }
    }

    #[instrument(skip_all, fields(path = %self.value_path.display(), value = value))]
    fn write(&self, value: &str) -> Result {
        debug!("writing…");
        fs::write(&self.value_path, value)
            .with_context(|| format!("failed to write `{}`", self.value_path.display()))
    }
}

impl Relay for SysfsRelay {
    fn enable(&self) -> Result {
        self.write("1")
    }

    fn disable(&self) -> Result {
        self.write("0")
    }

    fn is_enabled(&self) -> Result<bool> {
        let value = fs::read_to_string(&self.value_path)
            .with_context(|| format!("failed to read `{}`", self.value_path.display()))?;
        match value.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => bail!("unexpected GPIO value `{other}`"),
        }
    }
}

/// Stand-in for hosts without a relay: only remembers and logs the state.
#[derive(Default)]
pub struct DryRunRelay {
    is_enabled: AtomicBool,
}

impl Relay for DryRunRelay {
    fn enable(&self) -> Result {
        info!("dry run: enabling the relay");
        self.is_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn disable(&self) -> Result {
        info!("dry run: disabling the relay");
        self.is_enabled.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_enabled(&self) -> Result<bool> {
        Ok(self.is_enabled.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn test_sysfs_relay_ok() -> Result {
        let value_path = env::temp_dir().join(format!("dormouse-gpio-{}", fastrand::u64(..)));
        fs::write(&value_path, "0\n")?;
        let relay = SysfsRelay::new(value_path.clone());

        assert!(!relay.is_enabled()?);
        relay.enable()?;
        relay.enable()?;
        assert_eq!(fs::read_to_string(&value_path)?, "1");
        assert!(relay.is_enabled()?);
        relay.disable()?;
        assert!(!relay.is_enabled()?);

        fs::write(&value_path, "high")?;
        assert!(relay.is_enabled().is_err());

        fs::remove_file(&value_path)?;
        Ok(())
    }

    #[test]
    fn test_sysfs_relay_missing_file() {
        let relay = SysfsRelay::new(PathBuf::from("/nonexistent/gpio17/value"));
        assert!(relay.is_enabled().is_err());
        assert!(relay.enable().is_err());
    }

    #[test]
    fn test_dry_run_relay_ok() -> Result {
        let relay = DryRunRelay::default();
        assert!(!relay.is_enabled()?);
        relay.enable()?;
        assert!(relay.is_enabled()?);
        relay.disable()?;
        relay.disable()?;
        assert!(!relay.is_enabled()?);
        Ok(())
    }
}
