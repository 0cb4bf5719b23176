use std::fmt;
use std::path::PathBuf;

use crate::filter::FilterCode;

/// Native graphics-context stage at which a failure happened.
///
/// The first six variants are the attach stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextStage {
    AcquireDisplay,
    InitializeDisplay,
    ChooseConfig,
    CreateContext,
    CreateSurface,
    MakeCurrent,
    /// Buffer swap after the context is attached.
    Present,
}

impl fmt::Display for ContextStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextStage::AcquireDisplay => "acquire display",
            ContextStage::InitializeDisplay => "initialize display",
            ContextStage::ChooseConfig => "choose config",
            ContextStage::CreateContext => "create context",
            ContextStage::CreateSurface => "create window surface",
            ContextStage::MakeCurrent => "make current",
            ContextStage::Present => "present",
        };
        f.write_str(name)
    }
}

/// Failure reported by the native context layer (EGL or equivalent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Raw platform error code, when the platform reported one.
    pub code: Option<i64>,
    pub message: String,
}

impl NativeError {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (native 0x{code:x})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Fatal to the render session: no filter can run without a context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("graphics context failed at `{stage}`: {native}")]
pub struct ContextError {
    pub stage: ContextStage,
    pub native: NativeError,
}

impl ContextError {
    pub fn new(stage: ContextStage, native: NativeError) -> Self {
        Self { stage, native }
    }

    pub fn code(&self) -> Option<i64> {
        self.native.code
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Fatal to constructing one filter variant; other variants stay usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader compile error: {log}")]
    CompileFailed { stage: ShaderStage, log: String },

    #[error("program link error: {log}")]
    LinkFailed { log: String },

    /// The driver refused to allocate a shader, program or buffer object.
    #[error("backend object creation failed: {0}")]
    Create(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("filter `{0}` is not supported by this registry")]
    UnsupportedFilter(FilterCode),
}

/// Caller contract violations on filter variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("settings for `{found}` attached to the `{expected}` filter")]
    SettingsMismatch {
        expected: FilterCode,
        found: FilterCode,
    },
}

/// The producer could not bind its latest image to the external texture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("image stream: {0}")]
pub struct StreamError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json parse error at {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Umbrella error for render-session operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A GPU call was attempted from a thread that does not hold the context.
    #[error("graphics context is not current on this thread")]
    NotCurrent,

    #[error("graphics context has been detached")]
    Detached,

    #[error("backend object creation failed: {0}")]
    GlCreate(String),

    #[error("render thread: {0}")]
    Thread(String),
}
