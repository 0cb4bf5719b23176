//! camfx core vocabulary.
//!
//! GL-free types shared by the runtime and its hosts: sizes, filter codes and settings,
//! configuration, and the error taxonomy.
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;

pub use config::RendererConfig;
pub use error::{
    ConfigError, ContextError, ContextStage, FilterError, LookupError, NativeError, RenderError,
    ShaderError, ShaderStage, StreamError,
};
pub use filter::{FilterCode, FilterSettings, TextureTarget, UnknownFilterCode};
pub use geometry::{select_output_size, AspectRatio, Size};
