//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] for the controller.
//!
//! - **`target_os = "espidf"`**: blobs in the default NVS partition, one
//!   ESP-IDF namespace per storage namespace.  `nvs_commit()` makes every
//!   write atomic.
//! - **all other targets**: an in-memory map keyed `"namespace::key"`.
//!
//! NVS limits namespace and key names to 15 bytes.

use log::info;

use crate::app::ports::{StorageError, StoragePort};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::warn;

/// Longest namespace or key name NVS accepts.
const MAX_NAME_LEN: usize = 15;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Initialise NVS flash.
    ///
    /// On a full partition or after a version mismatch the partition is
    /// erased and re-initialised; stored configuration is then lost and
    /// defaults are written on the next save.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
            Ok(Self {})
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsAdapter: simulation backend");
            Ok(Self {
                store: HashMap::new(),
            })
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of an NVS name.
    fn c_name(name: &str) -> Result<[u8; MAX_NAME_LEN + 1], StorageError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME_LEN || bytes.contains(&0) {
            return Err(StorageError::IoError);
        }
        let mut buf = [0u8; MAX_NAME_LEN + 1];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(buf)
    }

    /// Open an NVS namespace, run `f` with the handle, then close it.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace).map_err(|_| ESP_ERR_NVS_INVALID_NAME)?;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns.as_ptr().cast(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn map_err(ret: i32) -> StorageError {
        match ret {
            ESP_ERR_NVS_NOT_FOUND => StorageError::NotFound,
            ESP_ERR_NVS_NOT_ENOUGH_SPACE => StorageError::Full,
            ESP_ERR_NVS_INVALID_LENGTH => StorageError::BufferTooSmall,
            _ => StorageError::IoError,
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let key_c = Self::c_name(key)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = key_c;
            let data = self
                .store
                .get(&Self::composite_key(namespace, key))
                .ok_or(StorageError::NotFound)?;
            if data.len() > buf.len() {
                return Err(StorageError::BufferTooSmall);
            }
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(namespace, false, |handle| {
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(handle, key_c.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            })
            .map_err(Self::map_err)
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let key_c = Self::c_name(key)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = key_c;
            self.store.insert(Self::composite_key(namespace, key), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(handle, key_c.as_ptr().cast(), data.as_ptr().cast(), data.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(Self::map_err)
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let key_c = Self::c_name(key)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = key_c;
            self.store.remove(&Self::composite_key(namespace, key));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, key_c.as_ptr().cast()) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(Self::map_err)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store.contains_key(&Self::composite_key(namespace, key))
        }

        #[cfg(target_os = "espidf")]
        {
            let Ok(key_c) = Self::c_name(key) else {
                return false;
            };
            Self::with_nvs_handle(namespace, false, |handle| {
                let ret = unsafe {
                    nvs_find_key(handle, key_c.as_ptr().cast(), core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            })
            .unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_delete() {
        let mut nvs = NvsAdapter::new().unwrap();
        nvs.write("dewvent", "config.json", b"{}").unwrap();
        assert!(nvs.exists("dewvent", "config.json"));
        assert!(!nvs.exists("other", "config.json"));

        let mut buf = [0u8; 8];
        assert_eq!(nvs.read("dewvent", "config.json", &mut buf), Ok(2));
        assert_eq!(&buf[..2], b"{}");

        nvs.delete("dewvent", "config.json").unwrap();
        assert_eq!(nvs.read("dewvent", "config.json", &mut buf), Err(StorageError::NotFound));
        // Deleting a missing key is not an error.
        assert!(nvs.delete("dewvent", "config.json").is_ok());
    }

    #[test]
    fn small_buffer_is_reported() {
        let mut nvs = NvsAdapter::new().unwrap();
        nvs.write("dewvent", "k", b"0123456789").unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(nvs.read("dewvent", "k", &mut buf), Err(StorageError::BufferTooSmall));
    }

    #[test]
    fn overlong_key_names_are_rejected() {
        let mut nvs = NvsAdapter::new().unwrap();
        assert_eq!(
            nvs.write("dewvent", "a_key_that_is_far_too_long", b"x"),
            Err(StorageError::IoError)
        );
    }
}
