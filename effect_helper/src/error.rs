//! Error types for the effect runtime
//!
//! Every fallible runtime operation returns [`Result`]. Failures are local to
//! the call that caused them: nothing is retried and no partial state is
//! registered.

use std::fmt;

/// Result type for effect runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Effect runtime errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A shader module with this logical name already exists
    DuplicateShader(String),

    /// A pass with this name already exists
    DuplicatePass(String),

    /// A pass referenced a shader module that was never added
    UnknownShader(String),

    /// A slot or name that no shader module declared
    UnknownBinding(String),

    /// Two shader modules disagree about a shared slot or variable
    BindingMismatch(String),

    /// Two distinct names hashed to the same key
    NameCollision {
        existing: String,
        incoming: String,
    },

    /// Shader compilation failed (carries the compiler diagnostic text)
    CompilationFailed(String),

    /// Bytecode reflection failed
    ReflectionFailed(String),

    /// File system error (missing source, unreadable binary, cache directory)
    Io(String),

    /// Precondition violated by the caller (e.g. dispatch without compute)
    InvalidOperation(String),

    /// Device-specific error
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateShader(name) => write!(f, "Duplicate shader: {}", name),
            Error::DuplicatePass(name) => write!(f, "Duplicate pass: {}", name),
            Error::UnknownShader(name) => write!(f, "Unknown shader: {}", name),
            Error::UnknownBinding(msg) => write!(f, "Unknown binding: {}", msg),
            Error::BindingMismatch(msg) => write!(f, "Binding mismatch: {}", msg),
            Error::NameCollision { existing, incoming } => write!(
                f,
                "Name collision: '{}' hashes to the same key as '{}'",
                incoming, existing
            ),
            Error::CompilationFailed(msg) => write!(f, "Compilation failed: {}", msg),
            Error::ReflectionFailed(msg) => write!(f, "Reflection failed: {}", msg),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an [`Error::BackendError`] with the same text
///
/// # Example
///
/// ```ignore
/// let err = effect_err!("effect::spirv", "SPIR-V reflection failed: {:?}", e);
/// ```
#[macro_export]
macro_rules! effect_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::effect_error!($source, "{}", message);
        $crate::effect::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an [`Error::BackendError`]
///
/// # Example
///
/// ```ignore
/// effect_bail!("effect::spirv", "Unsupported descriptor type: {:?}", ty);
/// ```
#[macro_export]
macro_rules! effect_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::effect_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
