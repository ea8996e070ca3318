//! NVS (Non-Volatile Storage) configuration adapter.
//!
//! Implements [`ConfigPort`]: the system configuration is persisted as
//! a single postcard blob under the `brewtherm` namespace. `save`
//! validates before writing — a caller can never persist an
//! out-of-range configuration through this adapter.
//!
//! On ESP-IDF the blob lives in the NVS flash partition (atomic per
//! `nvs_commit`); on other targets an in-memory map backs host tests.

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::SystemConfig;
use crate::error::ConfigError;

const CONFIG_NAMESPACE: &str = "brewtherm";
const CONFIG_KEY: &str = "syscfg";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<std::collections::HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create the adapter and initialise NVS flash.
    ///
    /// On first boot or after an NVS version mismatch the partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::*;
            use log::warn;
            // SAFETY: nvs_flash_init / nvs_flash_erase run from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("nvs: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("nvs: ESP-IDF backend initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("nvs: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(std::collections::HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key() -> String {
        format!("{CONFIG_NAMESPACE}::{CONFIG_KEY}")
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(esp_idf_svc::sys::nvs_handle_t) -> Result<T, i32>,
    {
        use esp_idf_svc::sys::*;

        let ns = b"brewtherm\0";
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            if let Some(bytes) = self.store.borrow().get(&Self::composite_key()) {
                let config: SystemConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("nvs: loaded config from store");
                Ok(config)
            } else {
                info!("nvs: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::*;
            use log::warn;

            let result = Self::with_nvs_handle(false, |handle| {
                let key = b"syscfg\0";
                let mut size: usize = 0;

                // First call: get size.
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let config: SystemConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("nvs: loaded config ({} bytes)", bytes.len());
                    Ok(config)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("nvs: no stored config, using defaults");
                    Ok(SystemConfig::default())
                }
                Err(e) => {
                    warn!("nvs: read error {e}, using defaults");
                    Ok(SystemConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store.borrow_mut().insert(Self::composite_key(), bytes);
            info!("nvs: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            use esp_idf_svc::sys::*;
            use log::warn;

            let result = Self::with_nvs_handle(true, |handle| {
                let key = b"syscfg\0";
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("nvs: config saved ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("nvs: write error {e}");
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_save_returns_defaults() {
        let nvs = NvsAdapter::new().unwrap();
        let config = nvs.load().unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn save_load_roundtrip() {
        let nvs = NvsAdapter::new().unwrap();
        let mut config = SystemConfig {
            setpoint_c: 93.0,
            ..Default::default()
        };
        config.join_ssid.push_str("HomeNet").unwrap();

        nvs.save(&config).unwrap();
        let loaded = nvs.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn save_refuses_invalid_config() {
        let nvs = NvsAdapter::new().unwrap();
        let config = SystemConfig {
            setpoint_c: -5.0,
            ..Default::default()
        };
        assert!(matches!(
            nvs.save(&config),
            Err(ConfigError::ValidationFailed(_))
        ));
        // Nothing was written.
        assert_eq!(nvs.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn corrupted_blob_is_reported() {
        let nvs = NvsAdapter::new().unwrap();
        nvs.store
            .borrow_mut()
            .insert(NvsAdapter::composite_key(), vec![0xFF; 3]);
        assert!(matches!(nvs.load(), Err(ConfigError::Corrupted)));
    }
}
