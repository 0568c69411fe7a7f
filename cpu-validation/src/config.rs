use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lockstep65_core::cpu::FLAG_COMPARE_MASK;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generator::{ABSOLUTE_PAGE, DEFAULT_MAX_ATTEMPTS};

/// Tunables for a differential run. Every field has a default, so a config file only
/// needs the values it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Where each generated instruction is written and executed.
    pub test_address: u16,
    /// High byte of generated absolute operands.
    pub absolute_page: u8,
    /// Memory cleared during priming: `reset_blocks` blocks of `reset_block_size` bytes
    /// starting at $0000.
    pub reset_blocks: u16,
    pub reset_block_size: u16,
    pub max_attempts: u32,
    /// Log throughput every this many instructions; 0 disables.
    pub progress_interval: u64,
    pub flag_mask: u8,
    pub response_timeout_ms: Option<u64>,
    pub fifo_base: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            test_address: 0x2000,
            absolute_page: ABSOLUTE_PAGE,
            reset_blocks: 64,
            reset_block_size: 1024,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            progress_interval: 10_000,
            flag_mask: FLAG_COMPARE_MASK,
            response_timeout_ms: None,
            fifo_base: PathBuf::from("/tmp/debug"),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reset_block_size == 0 {
            return Err(ConfigError::Invalid("reset_block_size must be non-zero".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be non-zero".into()));
        }
        if self.reset_blocks as u32 * self.reset_block_size as u32 > 0x10000 {
            return Err(ConfigError::Invalid(
                "reset region extends past $ffff".into(),
            ));
        }

        // Stores land anywhere from page..page+$1FE (low byte plus index).
        let store_lo = (self.absolute_page as u32) << 8;
        let store_hi = store_lo + 0x1FE;
        let code_lo = self.test_address as u32;
        let code_hi = code_lo + 2;
        if code_lo <= store_hi && store_lo <= code_hi {
            return Err(ConfigError::Invalid(format!(
                "test address ${:04x} overlaps the absolute store region ${store_lo:04x}-${store_hi:04x}",
                self.test_address
            )));
        }
        if code_hi > 0xFFFF {
            return Err(ConfigError::Invalid(
                "test address leaves no room for a three-byte instruction".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(config.test_address, 0x2000);
        assert_eq!(config.flag_mask, 0xC3);
        assert_eq!(config.reset_blocks as u32 * config.reset_block_size as u32, 0x10000);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = RunConfig::from_toml_str(
            "test_address = 0x4000\nresponse_timeout_ms = 250\nfifo_base = \"/tmp/dut\"\n",
        )
        .unwrap();
        assert_eq!(config.test_address, 0x4000);
        assert_eq!(config.response_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.fifo_base, PathBuf::from("/tmp/dut"));
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(RunConfig::from_toml_str("reset_block_size = 0").is_err());
        assert!(RunConfig::from_toml_str("max_attempts = 0").is_err());
        assert!(RunConfig::from_toml_str("test_address = 0x3080").is_err());
        assert!(RunConfig::from_toml_str("test_address = 0x2FFE").is_err());
        assert!(RunConfig::from_toml_str("bogus = 1").is_err());
    }
}
