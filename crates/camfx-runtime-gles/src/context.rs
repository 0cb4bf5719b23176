//! Native rendering-context lifecycle.
//!
//! The context is the only way to reach GPU calls: [`GraphicsContext::gl`] and
//! [`GraphicsContext::draw_context`] refuse to hand out the GL API unless the context is
//! attached and was made current on the calling thread.
use std::cell::Cell;
use std::fmt;
use std::thread::{self, ThreadId};

use camfx_core::{ContextError, ContextStage, NativeError, RenderError, Size};

use crate::gl::GlApi;

/// What `attach` asks the native layer for. The colour format is always RGBA8 with no
/// depth or stencil buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRequest {
    pub gles_major: u8,
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
}

impl ContextRequest {
    pub fn gles(major: u8) -> Self {
        Self {
            gles_major: major,
            ..Self::default()
        }
    }
}

impl Default for ContextRequest {
    fn default() -> Self {
        Self {
            gles_major: 2,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 0,
            stencil_bits: 0,
        }
    }
}

/// Native context layer, one method per stage.
///
/// `GraphicsContext` drives the stages in order and owns every handle they return; a
/// backend never has to track partial state itself.
pub trait ContextBackend {
    /// Opaque platform surface target.
    type Window: ?Sized;
    type Display;
    type Config;
    type Context;
    type Surface;
    type Gl: GlApi;

    fn acquire_display(&mut self, window: &Self::Window) -> Result<Self::Display, NativeError>;
    fn initialize_display(&mut self, display: &mut Self::Display) -> Result<(), NativeError>;
    fn choose_config(
        &mut self,
        display: &Self::Display,
        window: &Self::Window,
        request: &ContextRequest,
    ) -> Result<Self::Config, NativeError>;
    fn create_context(
        &mut self,
        display: &Self::Display,
        config: &Self::Config,
        request: &ContextRequest,
    ) -> Result<Self::Context, NativeError>;
    fn create_window_surface(
        &mut self,
        display: &Self::Display,
        config: &Self::Config,
        window: &Self::Window,
    ) -> Result<Self::Surface, NativeError>;
    /// Drawable size of the surface created for `window`, in pixels.
    fn surface_size(&self, window: &Self::Window) -> Size;
    fn make_current(
        &mut self,
        display: &Self::Display,
        context: &mut Self::Context,
        surface: &Self::Surface,
    ) -> Result<(), NativeError>;
    fn is_current(&self, context: &Self::Context) -> bool;

    /// Loads GL entry points. Called once, right after the first successful `make_current`.
    fn load_gl(&mut self, display: &Self::Display) -> Result<Self::Gl, NativeError>;

    fn swap_buffers(
        &mut self,
        display: &Self::Display,
        context: &Self::Context,
        surface: &Self::Surface,
    ) -> Result<(), NativeError>;

    fn release_current(&mut self, display: &Self::Display, context: &mut Self::Context);
    fn destroy_surface(&mut self, display: &Self::Display, surface: Self::Surface);
    fn destroy_context(&mut self, display: &Self::Display, context: Self::Context);
    fn terminate_display(&mut self, display: Self::Display);
}

struct Attached<B: ContextBackend> {
    display: B::Display,
    // Outlives the context and surface built from it.
    _config: B::Config,
    context: B::Context,
    surface: B::Surface,
    surface_size: Size,
    gl: B::Gl,
}

pub struct GraphicsContext<B: ContextBackend> {
    backend: B,
    attached: Option<Attached<B>>,
    current_on: Option<ThreadId>,
    /// Last viewport applied on this context.
    viewport: Cell<Option<Size>>,
}

fn stage_failed(stage: ContextStage, native: NativeError) -> ContextError {
    tracing::warn!(%stage, code = ?native.code, "graphics context attach failed: {}", native.message);
    ContextError::new(stage, native)
}

impl<B: ContextBackend> GraphicsContext<B> {
    /// Creates display, config, context and window surface for `window`, then makes the
    /// context current on the calling thread.
    ///
    /// A failure at any stage releases everything the earlier stages created.
    pub fn attach(
        mut backend: B,
        window: &B::Window,
        request: &ContextRequest,
    ) -> Result<Self, ContextError> {
        let mut display = backend
            .acquire_display(window)
            .map_err(|e| stage_failed(ContextStage::AcquireDisplay, e))?;
        tracing::debug!("display acquired");

        if let Err(e) = backend.initialize_display(&mut display) {
            backend.terminate_display(display);
            return Err(stage_failed(ContextStage::InitializeDisplay, e));
        }

        let config = match backend.choose_config(&display, window, request) {
            Ok(config) => config,
            Err(e) => {
                backend.terminate_display(display);
                return Err(stage_failed(ContextStage::ChooseConfig, e));
            }
        };

        let mut context = match backend.create_context(&display, &config, request) {
            Ok(context) => context,
            Err(e) => {
                backend.terminate_display(display);
                return Err(stage_failed(ContextStage::CreateContext, e));
            }
        };

        let surface = match backend.create_window_surface(&display, &config, window) {
            Ok(surface) => surface,
            Err(e) => {
                backend.destroy_context(&display, context);
                backend.terminate_display(display);
                return Err(stage_failed(ContextStage::CreateSurface, e));
            }
        };

        let surface_size = backend.surface_size(window);

        if let Err(e) = backend.make_current(&display, &mut context, &surface) {
            backend.destroy_surface(&display, surface);
            backend.destroy_context(&display, context);
            backend.terminate_display(display);
            return Err(stage_failed(ContextStage::MakeCurrent, e));
        }

        let gl = match backend.load_gl(&display) {
            Ok(gl) => gl,
            Err(e) => {
                backend.release_current(&display, &mut context);
                backend.destroy_surface(&display, surface);
                backend.destroy_context(&display, context);
                backend.terminate_display(display);
                return Err(stage_failed(ContextStage::MakeCurrent, e));
            }
        };
        tracing::info!(
            gles_major = request.gles_major,
            width = surface_size.width,
            height = surface_size.height,
            "graphics context attached"
        );

        Ok(Self {
            backend,
            attached: Some(Attached {
                display,
                _config: config,
                context,
                surface,
                surface_size,
                gl,
            }),
            current_on: Some(thread::current().id()),
            viewport: Cell::new(None),
        })
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Window surface size captured at attach. `None` once detached.
    pub fn surface_size(&self) -> Option<Size> {
        self.attached.as_ref().map(|a| a.surface_size)
    }

    /// True when this context is current on the calling thread.
    pub fn is_current(&self) -> bool {
        self.attached.is_some() && self.current_on == Some(thread::current().id())
    }

    /// Makes the context current on the calling thread. Cheap when it already is.
    pub fn make_current(&mut self) -> Result<(), RenderError> {
        let attached = self.attached.as_mut().ok_or(RenderError::Detached)?;
        let this_thread = thread::current().id();
        if self.current_on == Some(this_thread) && self.backend.is_current(&attached.context) {
            return Ok(());
        }

        self.backend
            .make_current(&attached.display, &mut attached.context, &attached.surface)
            .map_err(|e| ContextError::new(ContextStage::MakeCurrent, e))?;
        self.current_on = Some(this_thread);
        Ok(())
    }

    /// Releases currency so another thread may take the context.
    pub fn release_current(&mut self) {
        if !self.is_current() {
            return;
        }
        if let Some(attached) = self.attached.as_mut() {
            self.backend
                .release_current(&attached.display, &mut attached.context);
        }
        self.current_on = None;
    }

    /// GL API, only while the context is current on this thread.
    pub fn gl(&self) -> Result<&B::Gl, RenderError> {
        let attached = self.attached.as_ref().ok_or(RenderError::Detached)?;
        if self.current_on != Some(thread::current().id()) {
            return Err(RenderError::NotCurrent);
        }
        Ok(&attached.gl)
    }

    pub fn draw_context(&self) -> Result<DrawContext<'_, B::Gl>, RenderError> {
        Ok(DrawContext {
            gl: self.gl()?,
            viewport: &self.viewport,
        })
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&mut self) -> Result<(), RenderError> {
        self.gl()?;
        let attached = self.attached.as_ref().ok_or(RenderError::Detached)?;
        self.backend
            .swap_buffers(&attached.display, &attached.context, &attached.surface)
            .map_err(|e| ContextError::new(ContextStage::Present, e))?;
        Ok(())
    }

    /// Releases surface, context and display in reverse creation order.
    ///
    /// GPU objects created through this context must be freed before calling this.
    /// Calling it again is a no-op.
    pub fn detach(&mut self) {
        let Some(Attached {
            display,
            _config: _,
            mut context,
            surface,
            surface_size: _,
            gl,
        }) = self.attached.take()
        else {
            return;
        };
        drop(gl);

        self.backend.release_current(&display, &mut context);
        self.backend.destroy_surface(&display, surface);
        self.backend.destroy_context(&display, context);
        self.backend.terminate_display(display);

        self.current_on = None;
        self.viewport.set(None);
        tracing::info!("graphics context detached");
    }
}

impl<B: ContextBackend> Drop for GraphicsContext<B> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<B: ContextBackend> fmt::Debug for GraphicsContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("attached", &self.attached.is_some())
            .field("current_on", &self.current_on)
            .field("viewport", &self.viewport.get())
            .finish()
    }
}

/// Borrowed view used while drawing one frame.
#[derive(Debug)]
pub struct DrawContext<'a, G> {
    gl: &'a G,
    viewport: &'a Cell<Option<Size>>,
}

impl<'a, G: GlApi> DrawContext<'a, G> {
    pub fn gl(&self) -> &'a G {
        self.gl
    }

    pub fn viewport(&self) -> Option<Size> {
        self.viewport.get()
    }

    /// Applies `size` as the viewport unless it already is. Returns whether a GL call was made.
    pub fn set_viewport(&self, size: Size) -> bool {
        if self.viewport.get() == Some(size) {
            return false;
        }
        self.gl.viewport(0, 0, size.width as i32, size.height as i32);
        self.viewport.set(Some(size));
        true
    }
}
