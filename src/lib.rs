//! Native library that marks its own loading inside a JVM.
//!
//! When the JVM loads the library, `JNI_OnLoad` writes a fixed key/value pair
//! into `java.lang.System` properties so the embedding host can check that the
//! load actually happened.

mod error;
mod jvm;
mod loader;
mod logging;
mod signal;

pub use error::BridgeError;
pub use jvm::SystemProperties;
pub use loader::{LoaderNotification, handle_loader_notification};
pub use signal::{
    JNI_VERSION, LoadReport, PROPERTY_KEY, PROPERTY_VALUE, PropertyStore, announce_load,
};
