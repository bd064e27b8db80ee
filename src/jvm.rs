//! JNI side of the load hook.

use std::ffi::c_void;
use std::panic::AssertUnwindSafe;

use jni::objects::{AutoLocal, JClass, JStaticMethodID, JString, JValue};
use jni::signature::ReturnType;
use jni::sys::{self, jint};
use jni::{JNIEnv, JavaVM};
use log::{debug, warn};

use crate::error::BridgeError;
use crate::logging;
use crate::signal::{JNI_VERSION, LoadReport, PropertyStore, announce_load};

/// Static `(String, String) -> String` setter looked up by name.
struct SetterLookup {
    class: &'static str,
    method: &'static str,
    signature: &'static str,
}

const SYSTEM_SET_PROPERTY: SetterLookup = SetterLookup {
    class: "java/lang/System",
    method: "setProperty",
    signature: "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
};

/// `java.lang.System` properties reached through a JNI environment.
pub struct SystemProperties<'env, 'local> {
    env: &'env mut JNIEnv<'local>,
    class: AutoLocal<'local, JClass<'local>>,
    set_property: JStaticMethodID,
}

impl<'env, 'local> SystemProperties<'env, 'local> {
    /// Looks up `System` and its static `setProperty(String, String)`.
    pub fn resolve(env: &'env mut JNIEnv<'local>) -> Result<Self, BridgeError> {
        Self::resolve_with(env, &SYSTEM_SET_PROPERTY)
    }

    fn resolve_with(
        env: &'env mut JNIEnv<'local>,
        lookup: &SetterLookup,
    ) -> Result<Self, BridgeError> {
        let class = env
            .find_class(lookup.class)
            .map_err(|_| BridgeError::ClassNotFound(lookup.class))?;
        let class = env.auto_local(class);
        let set_property = env
            .get_static_method_id(&*class, lookup.method, lookup.signature)
            .map_err(|_| BridgeError::MethodNotFound {
                name: lookup.method,
                signature: lookup.signature,
            })?;
        Ok(Self {
            env,
            class,
            set_property,
        })
    }
}

impl PropertyStore for SystemProperties<'_, '_> {
    fn set_property(&mut self, key: &str, value: &str) -> Result<Option<String>, BridgeError> {
        let key = self.env.new_string(key)?;
        let key = self.env.auto_local(key);
        let value = self.env.new_string(value)?;
        let value = self.env.auto_local(value);

        // Safety: the method id was resolved against `self.class` with a
        // (String, String) -> String signature and both arguments are strings.
        let previous = unsafe {
            self.env.call_static_method_unchecked(
                &*self.class,
                self.set_property,
                ReturnType::Object,
                &[JValue::Object(&key).as_jni(), JValue::Object(&value).as_jni()],
            )
        }?
        .l()?;

        if previous.is_null() {
            return Ok(None);
        }
        let previous = self.env.auto_local(JString::from(previous));
        let previous: String = self.env.get_string(&previous)?.into();
        Ok(Some(previous))
    }
}

fn load(vm: *mut sys::JavaVM) -> LoadReport {
    // Safety: the loader hands us the process `JavaVM`; null is rejected by `from_raw`.
    let vm = match unsafe { JavaVM::from_raw(vm) } {
        Ok(vm) => vm,
        Err(_) => return announce_load::<SystemProperties>(Err(BridgeError::EnvironmentUnavailable)),
    };
    let mut env = match vm.get_env() {
        Ok(env) => env,
        Err(_) => return announce_load::<SystemProperties>(Err(BridgeError::EnvironmentUnavailable)),
    };

    let report = announce_load(SystemProperties::resolve(&mut env));
    clear_pending_exception(&mut env);
    report
}

// Failed lookups leave NoClassDefFoundError/NoSuchMethodError pending, which
// would otherwise be thrown out of System.loadLibrary.
fn clear_pending_exception(env: &mut JNIEnv) {
    if env.exception_check().unwrap_or(false) {
        debug!("clearing pending Java exception");
        let _ = env.exception_clear();
    }
}

/// Library load hook invoked by the JVM.
///
/// Always returns `JNI_VERSION_1_2`, whether or not the marker was written.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn JNI_OnLoad(vm: *mut sys::JavaVM, _reserved: *mut c_void) -> jint {
    logging::init_from_env();

    match std::panic::catch_unwind(AssertUnwindSafe(|| load(vm))) {
        Ok(report) => report.version(),
        Err(_) => {
            warn!("panic in JNI_OnLoad");
            JNI_VERSION
        }
    }
}
