//! Domain constants shared across the compiler.

/// Extension of interface definition files.
pub const HAL_EXTENSION: &str = "hal";

/// Name of the frozen-hash registry kept at the top of each package root.
pub const HASH_REGISTRY_FILE: &str = "current.txt";

/// Environment variable naming the source tree root when `-p` is not given.
pub const BUILD_TOP_ENV: &str = "ANDROID_BUILD_TOP";

/// Fully-qualified name of the root base interface.
pub const ROOT_INTERFACE: &str = "android.hidl.base@1.0::IBase";

/// Packages whose libraries ship with the transport runtime.
pub const TRANSPORT_PACKAGES: &[&str] = &["android.hidl.base", "android.hidl.manager"];

/// Package prefixes considered part of the system image.
pub const SYSTEM_PACKAGE_PREFIXES: &[&str] = &[
    "android.hidl",
    "android.system",
    "android.frameworks",
    "android.hardware",
];

/// Packages allowed to be loaded into system processes.
pub const SYSTEM_PROCESS_PACKAGES: &[&str] = &[
    "android.hardware.graphics.allocator@2.0",
    "android.hardware.graphics.common@1.0",
    "android.hardware.graphics.mapper@2.0",
    "android.hardware.renderscript@1.0",
    "android.hidl.memory@1.0",
];

/// Package roots registered unless overridden on the command line.
pub const DEFAULT_PACKAGE_ROOTS: &[(&str, &str)] = &[
    ("android.hardware", "hardware/interfaces"),
    ("android.hidl", "system/libhidl/transport"),
    ("android.frameworks", "frameworks/hardware/interfaces"),
    ("android.system", "system/hardware/interfaces"),
];
