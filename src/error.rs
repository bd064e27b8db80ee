use thiserror::Error;

/// Reasons the host property store could not be reached.
///
/// None of these ever leave the library; they only decide whether the load
/// marker was written.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("JNI environment unavailable")]
    EnvironmentUnavailable,
    #[error("class `{0}` not found")]
    ClassNotFound(&'static str),
    #[error("static method `{name}{signature}` not found")]
    MethodNotFound {
        name: &'static str,
        signature: &'static str,
    },
    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),
    #[error("panic while writing load marker")]
    Panicked,
}
