//! camfx runtime (glow / OpenGL ES backend)
//
// This crate contains the rendering core only:
// - native context lifecycle behind `ContextBackend`
// - the external-texture frame path with latest-wins delivery
// - filter programs and their registry
// - the per-frame render session and its render thread
//
// Windowing and the native EGL binding live in host crates.
#![deny(missing_debug_implementations)]

pub mod context;
pub mod filter;
pub mod frame;
pub mod gl;
pub mod quad;
pub mod registry;
pub mod renderer;
pub mod shader;
pub mod sources;
pub mod texture;

pub use context::{ContextBackend, ContextRequest, DrawContext, GraphicsContext};
pub use filter::FilterVariant;
pub use frame::{
    CpuFrameStore, CpuFrameStream, CpuFrameWriter, FrameSignal, FrameSlot, FrameSource,
    ImageStream, RgbaFrame,
};
pub use gl::{GlApi, GlowApi, TEXTURE_EXTERNAL_OES};
pub use quad::FullscreenQuad;
pub use registry::FilterRegistry;
pub use renderer::{RenderSession, RenderStats, Renderer, TickOutcome, ViewportLatch};
pub use shader::{Locations, ShaderProgram};
pub use texture::ExternalTexture;

pub use camfx_core::{
    select_output_size, FilterCode, FilterSettings, RenderError, RendererConfig, Size,
    TextureTarget,
};
