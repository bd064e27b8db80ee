//! Load marker written into the host's process-wide property store.

use std::panic::AssertUnwindSafe;

use jni::sys::{JNI_VERSION_1_2, jint};
use log::{debug, trace};

use crate::error::BridgeError;

/// Property key the host reads back after loading the library.
pub const PROPERTY_KEY: &str = "ece381df-4e1c-4175-9ed5-e0fc3ce66adc";

/// Value stored under [`PROPERTY_KEY`] once the library is loaded.
#[cfg(not(feature = "arch-neutral"))]
pub const PROPERTY_VALUE: &str = "lib-loaded-amd64";

/// Value stored under [`PROPERTY_KEY`] once the library is loaded.
#[cfg(feature = "arch-neutral")]
pub const PROPERTY_VALUE: &str = "lib-loaded";

/// JNI version reported back to the loader.
pub const JNI_VERSION: jint = JNI_VERSION_1_2;

/// Write access to a host-owned string property store.
pub trait PropertyStore {
    /// Sets `key` to `value`, returning the previous value if there was one.
    fn set_property(&mut self, key: &str, value: &str) -> Result<Option<String>, BridgeError>;
}

impl<S: PropertyStore + ?Sized> PropertyStore for &mut S {
    fn set_property(&mut self, key: &str, value: &str) -> Result<Option<String>, BridgeError> {
        (**self).set_property(key, value)
    }
}

/// Outcome of a load hook invocation.
///
/// The loader only ever sees [`LoadReport::version`]; the signal outcome is
/// kept for logging and tests.
#[derive(Debug)]
pub struct LoadReport {
    signal: Result<Option<String>, BridgeError>,
}

impl LoadReport {
    /// Version constant returned to the loader, independent of the signal.
    pub fn version(&self) -> jint {
        JNI_VERSION
    }

    /// Whether the marker reached the property store.
    pub fn signalled(&self) -> bool {
        self.signal.is_ok()
    }

    /// Previous value on success, or why the store could not be written.
    pub fn signal(&self) -> &Result<Option<String>, BridgeError> {
        &self.signal
    }
}

/// Writes the load marker into `store` if it could be resolved.
pub fn announce_load<S: PropertyStore>(store: Result<S, BridgeError>) -> LoadReport {
    let signal = store.and_then(|mut store| {
        std::panic::catch_unwind(AssertUnwindSafe(|| {
            store.set_property(PROPERTY_KEY, PROPERTY_VALUE)
        }))
        .unwrap_or(Err(BridgeError::Panicked))
    });

    match &signal {
        Ok(previous) => trace!(
            "set {PROPERTY_KEY}={PROPERTY_VALUE} (previous: {})",
            previous.as_deref().unwrap_or("<none>")
        ),
        Err(err) => debug!("load marker not written: {err}"),
    }

    LoadReport { signal }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct MemoryProperties {
        values: HashMap<String, String>,
        writes: usize,
    }

    impl PropertyStore for MemoryProperties {
        fn set_property(&mut self, key: &str, value: &str) -> Result<Option<String>, BridgeError> {
            self.writes += 1;
            Ok(self.values.insert(key.to_string(), value.to_string()))
        }
    }

    fn open(
        store: &mut MemoryProperties,
        available: bool,
    ) -> Result<&mut MemoryProperties, BridgeError> {
        if available {
            Ok(store)
        } else {
            Err(BridgeError::ClassNotFound("java/lang/System"))
        }
    }

    struct PanickingStore;

    impl PropertyStore for PanickingStore {
        fn set_property(&mut self, _: &str, _: &str) -> Result<Option<String>, BridgeError> {
            panic!("host blew up");
        }
    }

    #[test]
    fn writes_marker_into_store() {
        let mut store = MemoryProperties::default();
        let report = announce_load(Ok(&mut store));

        assert!(report.signalled());
        assert_eq!(report.version(), JNI_VERSION_1_2);
        assert_eq!(store.values.get(PROPERTY_KEY).map(String::as_str), Some(PROPERTY_VALUE));
    }

    #[cfg(not(feature = "arch-neutral"))]
    #[test]
    fn default_marker_value() {
        assert_eq!(PROPERTY_VALUE, "lib-loaded-amd64");
    }

    #[test]
    fn failed_resolution_still_reports_version() {
        let mut store = MemoryProperties::default();
        store.values.insert("other".into(), "kept".into());

        let report = announce_load(open(&mut store, false));

        assert!(!report.signalled());
        assert!(matches!(report.signal(), Err(BridgeError::ClassNotFound(_))));
        assert_eq!(report.version(), JNI_VERSION);
        assert!(!store.values.contains_key(PROPERTY_KEY));
        assert_eq!(store.values.get("other").map(String::as_str), Some("kept"));
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn resolved_store_receives_single_write() {
        let mut store = MemoryProperties::default();
        let report = announce_load(open(&mut store, true));

        assert!(report.signalled());
        assert_eq!(store.writes, 1);
    }

    #[test]
    fn missing_method_is_swallowed() {
        let report = announce_load::<MemoryProperties>(Err(BridgeError::MethodNotFound {
            name: "setProperty",
            signature: "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
        }));
        assert!(matches!(report.signal(), Err(BridgeError::MethodNotFound { .. })));
        assert_eq!(report.version(), JNI_VERSION);
    }

    #[test]
    fn panic_in_store_is_contained() {
        let report = announce_load(Ok(PanickingStore));
        assert!(matches!(report.signal(), Err(BridgeError::Panicked)));
        assert_eq!(report.version(), JNI_VERSION);
    }

    #[test]
    fn reload_keeps_single_entry() {
        let mut store = MemoryProperties::default();
        announce_load(Ok(&mut store));
        let report = announce_load(Ok(&mut store));

        assert_eq!(report.signal().as_ref().ok(), Some(&Some(PROPERTY_VALUE.to_string())));
        assert_eq!(store.values.len(), 1);
        assert_eq!(store.values.get(PROPERTY_KEY).map(String::as_str), Some(PROPERTY_VALUE));
    }

    #[test]
    fn unrelated_keys_stay_absent() {
        let mut store = MemoryProperties::default();
        announce_load(Ok(&mut store));
        assert!(store.values.get("not-written-by-the-hook").is_none());
    }
}
