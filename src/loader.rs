//! Platform loader notifications.

#[cfg(windows)]
use std::ffi::c_void;

use log::trace;

/// Reason codes passed to `DllMain`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum LoaderNotification {
    ProcessDetach = 0,
    ProcessAttach = 1,
    ThreadAttach = 2,
    ThreadDetach = 3,
}

impl TryFrom<u32> for LoaderNotification {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::ProcessDetach),
            1 => Ok(Self::ProcessAttach),
            2 => Ok(Self::ThreadAttach),
            3 => Ok(Self::ThreadDetach),
            other => Err(other),
        }
    }
}

/// Handles a loader notification. Nothing is done for any reason and the
/// result is always success.
pub fn handle_loader_notification(reason: u32) -> bool {
    match LoaderNotification::try_from(reason) {
        Ok(notification) => trace!("loader notification: {notification:?}"),
        Err(code) => trace!("unknown loader notification {code}"),
    }
    true
}

#[cfg(windows)]
#[doc(hidden)]
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn DllMain(_module: *mut c_void, reason: u32, _reserved: *mut c_void) -> i32 {
    handle_loader_notification(reason) as i32
}
