//! Error types for SceneForge
//!
//! Every failure raised while compiling shaders, compiling scenes or recording
//! frames is fatal for the operation that raised it. There is no retry path:
//! GPU resource compilation is deterministic given valid input.

use std::fmt;

/// Result type for SceneForge operations
pub type Result<T> = std::result::Result<T, Error>;

/// SceneForge errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Uniform field type with no known float layout
    InvalidUniformType(String),

    /// Descriptor kind the write-set generator cannot bind
    UnsupportedDescriptorType(String),

    /// Native resource creation or allocation failed
    ResourceCreationFailure(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource reference (index, handle, attribute name, etc.)
    InvalidResource(String),

    /// Operation not allowed in the current lifecycle state
    InvalidState(String),

    /// Malformed shader reflection mapping
    InvalidReflection(String),

    /// Filesystem error while loading assets
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidUniformType(msg) => write!(f, "Invalid uniform type: {}", msg),
            Error::UnsupportedDescriptorType(msg) => write!(f, "Unsupported descriptor type: {}", msg),
            Error::ResourceCreationFailure(msg) => write!(f, "Resource creation failure: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::InvalidReflection(msg) => write!(f, "Invalid reflection: {}", msg),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidReflection(e.to_string())
    }
}

// ===== ERROR MACROS =====

/// Log an ERROR with file:line and build an [`Error::ResourceCreationFailure`]
///
/// An explicit variant can be given as the first argument.
///
/// # Example
///
/// ```no_run
/// # use scene_forge::engine_err;
/// let err = engine_err!("sceneforge::vulkan", "Failed to create buffer: {}", 42);
/// let err = engine_err!(InvalidState, "sceneforge::host", "Scene {} is not compiled", "main");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::sceneforge::Error::$variant(message)
    }};
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::sceneforge::Error::ResourceCreationFailure(message)
    }};
}

/// Log an ERROR and return early with the built error
///
/// # Example
///
/// ```no_run
/// # use scene_forge::engine_bail;
/// # fn f() -> scene_forge::sceneforge::Result<()> {
/// engine_bail!(InvalidResource, "sceneforge::compiler", "Unknown mesh {}", 3);
/// # }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)*) => {
        return Err($crate::engine_err!($($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
