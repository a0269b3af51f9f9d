//! Raw volume access: opening `\\.\<letter>:` read-only, positioned
//! reads, device-control round-trips, and geometry queries.
//!
//! Grounded on the modern `windows`-crate FFI calling convention (typed
//! `HANDLE`, `DeviceIoControl`, `PCWSTR` string marshalling) used for volume
//! discovery elsewhere in this codebase, rather than the older `winapi`
//! style. The exact `FSCTL_*` numeric codes match the values used by NTFS
//! recovery tools for `FSCTL_ENUM_USN_DATA` / `FSCTL_GET_NTFS_FILE_RECORD`.

use crate::error::{EngineError, Result};
use crate::model::{DriveLetter, VolumeGeometry};

/// `FSCTL_ENUM_USN_DATA` — enumerate the USN journal by file reference order.
pub const FSCTL_ENUM_USN_DATA: u32 = 0x0009_00B3;
/// `FSCTL_GET_NTFS_FILE_RECORD` — fetch one raw, fixed-up MFT record.
pub const FSCTL_GET_NTFS_FILE_RECORD: u32 = 0x0009_0068;

/// Windows `ERROR_HANDLE_EOF`, surfaced through `DeviceIoControl` as the
/// normal termination signal for `FSCTL_ENUM_USN_DATA`, not an error.
pub const ERROR_HANDLE_EOF: i32 = 38;

/// Recommended enumeration buffer size ( resource model: ~1 MiB).
pub const USN_ENUM_BUFFER_SIZE: usize = 1024 * 1024;

#[cfg(windows)]
mod imp {
    use super::*;
    use std::os::windows::ffi::OsStrExt;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_HANDLE_EOF as WIN_EOF, HANDLE};
    use windows::Win32::Storage::FileSystem::{
        CreateFileW, ReadFile, SetFilePointerEx, FILE_BEGIN, FILE_FLAGS_AND_ATTRIBUTES,
        FILE_GENERIC_READ, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
    };
    use windows::Win32::System::IO::DeviceIoControl;

    fn wide(s: &str) -> Vec<u16> {
        std::ffi::OsStr::new(s)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    /// A handle to a raw volume device, open read-only and fully shared so
    /// the live filesystem is left undisturbed.
    pub struct Volume {
        handle: HANDLE,
        drive: DriveLetter,
    }

    // SAFETY: the handle is exclusively owned by this `Volume` and every
    // operation through it is a blocking syscall; no two threads ever hold
    // the same `Volume` concurrently.
    unsafe impl Send for Volume {}

    impl Volume {
        pub fn open(drive: DriveLetter) -> Result<Self> {
            let path = wide(&drive.device_path());
            let handle = unsafe {
                CreateFileW(
                    PCWSTR(path.as_ptr()),
                    FILE_GENERIC_READ.0,
                    FILE_SHARE_READ | FILE_SHARE_WRITE,
                    None,
                    OPEN_EXISTING,
                    FILE_FLAGS_AND_ATTRIBUTES(0),
                    None,
                )
            }
            .map_err(|_| EngineError::VolumeUnavailable(drive.to_string()))?;

            Ok(Self { handle, drive })
        }

        pub fn drive(&self) -> DriveLetter {
            self.drive
        }

        pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            unsafe {
                SetFilePointerEx(self.handle, offset as i64, None, FILE_BEGIN)
                    .map_err(EngineError::Windows)?;
            }
            let mut read: u32 = 0;
            unsafe { ReadFile(self.handle, Some(buf), Some(&mut read), None) }
                .map_err(EngineError::Windows)?;
            Ok(read as usize)
        }

        pub fn ioctl(&self, code: u32, input: &[u8], out_buf: &mut [u8]) -> Result<(usize, bool)> {
            let mut returned: u32 = 0;
            let ok = unsafe {
                DeviceIoControl(
                    self.handle,
                    code,
                    Some(input.as_ptr() as *const _),
                    input.len() as u32,
                    Some(out_buf.as_mut_ptr() as *mut _),
                    out_buf.len() as u32,
                    Some(&mut returned),
                    None,
                )
            };
            if ok.is_ok() {
                return Ok((returned as usize, false));
            }
            let err = unsafe { GetLastError() };
            if err == WIN_EOF {
                return Ok((returned as usize, true));
            }
            Err(EngineError::IoctlFailed {
                code,
                os_error: format!("{err:?}"),
            })
        }

        pub fn query_geometry(&self) -> Result<VolumeGeometry> {
            use windows::Win32::Storage::FileSystem::GetDiskFreeSpaceW;
            let root = wide(&self.drive.root_prefix());
            let mut sectors_per_cluster = 0u32;
            let mut bytes_per_sector = 0u32;
            let mut free_clusters = 0u32;
            let mut total_clusters = 0u32;
            unsafe {
                GetDiskFreeSpaceW(
                    PCWSTR(root.as_ptr()),
                    Some(&mut sectors_per_cluster),
                    Some(&mut bytes_per_sector),
                    Some(&mut free_clusters),
                    Some(&mut total_clusters),
                )
            }
            .map_err(EngineError::Windows)?;

            Ok(VolumeGeometry {
                bytes_per_sector,
                sectors_per_cluster,
            })
        }
    }

    impl Drop for Volume {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

#[cfg(not(windows))]
mod imp {
    use super::*;

    /// Non-Windows stand-in: raw volume access is only meaningful against a
    /// live NTFS volume device, which does not exist on other platforms.
    pub struct Volume {
        drive: DriveLetter,
    }

    impl Volume {
        pub fn open(drive: DriveLetter) -> Result<Self> {
            Err(EngineError::VolumeUnavailable(drive.to_string()))
        }

        pub fn drive(&self) -> DriveLetter {
            self.drive
        }

        pub fn read_at(&self, _offset: u64, _buf: &mut [u8]) -> Result<usize> {
            Err(EngineError::VolumeUnavailable(self.drive.to_string()))
        }

        pub fn ioctl(&self, _code: u32, _input: &[u8], _out: &mut [u8]) -> Result<(usize, bool)> {
            Err(EngineError::VolumeUnavailable(self.drive.to_string()))
        }

        pub fn query_geometry(&self) -> Result<VolumeGeometry> {
            Err(EngineError::VolumeUnavailable(self.drive.to_string()))
        }
    }
}

pub use imp::Volume;
