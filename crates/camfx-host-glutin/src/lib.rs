//! Host glue: EGL through glutin.
//!
//! [`GlutinBackend`] implements the runtime's `ContextBackend` one stage at a time so the
//! runtime can roll back precisely when a stage fails. [`NativeWindow`] is the opaque window
//! target handed to `GraphicsContext::attach`.
use std::ffi::CString;
use std::num::NonZeroU32;

use glutin::config::{Api, ColorBufferType, Config, ConfigSurfaceTypes, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentContext, PossiblyCurrentContext, Version,
};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use raw_window_handle::{
    HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle,
};

use camfx_core::{NativeError, Size};
use camfx_runtime_gles::{ContextBackend, ContextRequest, GlowApi};

/// Raw platform handles plus the surface size in pixels.
#[derive(Debug, Clone, Copy)]
pub struct NativeWindow {
    window: RawWindowHandle,
    display: RawDisplayHandle,
    size: Size,
}

// SAFETY: the handles are plain identifiers. The host keeps the window alive, and only the
// render thread uses them, for as long as the renderer is attached.
unsafe impl Send for NativeWindow {}

impl NativeWindow {
    pub fn new(window: RawWindowHandle, display: RawDisplayHandle, size: Size) -> Self {
        Self {
            window,
            display,
            size,
        }
    }

    pub fn from_window<W>(window: &W, size: Size) -> Self
    where
        W: HasRawWindowHandle + HasRawDisplayHandle,
    {
        Self::new(window.raw_window_handle(), window.raw_display_handle(), size)
    }

    pub fn size(&self) -> Size {
        self.size
    }
}

/// Display handle before and after `eglInitialize`.
#[derive(Debug)]
pub struct GlutinDisplay {
    raw: RawDisplayHandle,
    display: Option<Display>,
}

impl GlutinDisplay {
    fn initialized(&self) -> Result<&Display, NativeError> {
        self.display
            .as_ref()
            .ok_or_else(|| NativeError::new(None, "display not initialized"))
    }
}

#[derive(Debug)]
pub enum GlutinContext {
    NotCurrent(NotCurrentContext),
    Current(PossiblyCurrentContext),
    /// Lost after a failed state transition.
    Lost,
}

#[derive(Debug, Default)]
pub struct GlutinBackend {
    _private: (),
}

impl GlutinBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn native(e: glutin::error::Error) -> NativeError {
    NativeError::new(e.raw_code(), e.to_string())
}

fn non_zero(v: u32, what: &str) -> Result<NonZeroU32, NativeError> {
    NonZeroU32::new(v).ok_or_else(|| NativeError::new(None, format!("window {what} is zero")))
}

impl ContextBackend for GlutinBackend {
    type Window = NativeWindow;
    type Display = GlutinDisplay;
    type Config = Config;
    type Context = GlutinContext;
    type Surface = Surface<WindowSurface>;
    type Gl = GlowApi;

    fn acquire_display(&mut self, window: &NativeWindow) -> Result<GlutinDisplay, NativeError> {
        match window.display {
            RawDisplayHandle::Xlib(_)
            | RawDisplayHandle::Xcb(_)
            | RawDisplayHandle::Wayland(_)
            | RawDisplayHandle::Gbm(_)
            | RawDisplayHandle::Android(_)
            | RawDisplayHandle::Windows(_) => Ok(GlutinDisplay {
                raw: window.display,
                display: None,
            }),
            other => Err(NativeError::new(
                None,
                format!("no EGL display for {other:?}"),
            )),
        }
    }

    fn initialize_display(&mut self, display: &mut GlutinDisplay) -> Result<(), NativeError> {
        // SAFETY: the raw handle comes from a live window owned by the host.
        let egl = unsafe { Display::new(display.raw, DisplayApiPreference::Egl) }.map_err(native)?;
        tracing::debug!("egl display initialized");
        display.display = Some(egl);
        Ok(())
    }

    fn choose_config(
        &mut self,
        display: &GlutinDisplay,
        window: &NativeWindow,
        request: &ContextRequest,
    ) -> Result<Config, NativeError> {
        let api = if request.gles_major >= 3 {
            Api::GLES3
        } else {
            Api::GLES2
        };
        let template = ConfigTemplateBuilder::new()
            .with_buffer_type(ColorBufferType::Rgb {
                r_size: request.red_bits,
                g_size: request.green_bits,
                b_size: request.blue_bits,
            })
            .with_alpha_size(request.alpha_bits)
            .with_depth_size(request.depth_bits)
            .with_stencil_size(request.stencil_bits)
            .with_api(api)
            .with_surface_type(ConfigSurfaceTypes::WINDOW)
            .compatible_with_native_window(window.window)
            .build();

        let egl = display.initialized()?;
        // SAFETY: the template's native window is the live host window.
        let mut configs = unsafe { egl.find_configs(template) }.map_err(native)?;
        configs.next().ok_or_else(|| {
            NativeError::new(None, "no config matches RGBA8 without depth or stencil")
        })
    }

    fn create_context(
        &mut self,
        display: &GlutinDisplay,
        config: &Config,
        request: &ContextRequest,
    ) -> Result<GlutinContext, NativeError> {
        let attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(request.gles_major, 0))))
            .build(None);
        let egl = display.initialized()?;
        // SAFETY: `config` was produced by this display.
        let context = unsafe { egl.create_context(config, &attrs) }.map_err(native)?;
        Ok(GlutinContext::NotCurrent(context))
    }

    fn create_window_surface(
        &mut self,
        display: &GlutinDisplay,
        config: &Config,
        window: &NativeWindow,
    ) -> Result<Surface<WindowSurface>, NativeError> {
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window.window,
            non_zero(window.size.width, "width")?,
            non_zero(window.size.height, "height")?,
        );
        let egl = display.initialized()?;
        // SAFETY: the window handle stays valid while the renderer is attached.
        unsafe { egl.create_window_surface(config, &attrs) }.map_err(native)
    }

    fn surface_size(&self, window: &NativeWindow) -> Size {
        window.size
    }

    fn make_current(
        &mut self,
        _display: &GlutinDisplay,
        context: &mut GlutinContext,
        surface: &Surface<WindowSurface>,
    ) -> Result<(), NativeError> {
        match std::mem::replace(context, GlutinContext::Lost) {
            GlutinContext::NotCurrent(not_current) => {
                let current = not_current.make_current(surface).map_err(native)?;
                *context = GlutinContext::Current(current);
                Ok(())
            }
            GlutinContext::Current(current) => {
                let result = current.make_current(surface).map_err(native);
                *context = GlutinContext::Current(current);
                result
            }
            GlutinContext::Lost => Err(NativeError::new(None, "context was lost")),
        }
    }

    fn is_current(&self, context: &GlutinContext) -> bool {
        matches!(context, GlutinContext::Current(c) if c.is_current())
    }

    fn load_gl(&mut self, display: &GlutinDisplay) -> Result<GlowApi, NativeError> {
        let egl = display.initialized()?;
        // SAFETY: called right after make_current on this thread.
        Ok(unsafe {
            GlowApi::from_loader_function(|name| match CString::new(name) {
                Ok(name) => egl.get_proc_address(&name),
                Err(_) => std::ptr::null(),
            })
        })
    }

    fn swap_buffers(
        &mut self,
        _display: &GlutinDisplay,
        context: &GlutinContext,
        surface: &Surface<WindowSurface>,
    ) -> Result<(), NativeError> {
        match context {
            GlutinContext::Current(current) => surface.swap_buffers(current).map_err(native),
            _ => Err(NativeError::new(None, "context is not current")),
        }
    }

    fn release_current(&mut self, _display: &GlutinDisplay, context: &mut GlutinContext) {
        if !matches!(context, GlutinContext::Current(_)) {
            return;
        }
        if let GlutinContext::Current(current) = std::mem::replace(context, GlutinContext::Lost) {
            match current.make_not_current() {
                Ok(not_current) => *context = GlutinContext::NotCurrent(not_current),
                Err(e) => tracing::warn!(error = %e, "make_not_current failed"),
            }
        }
    }

    fn destroy_surface(&mut self, _display: &GlutinDisplay, surface: Surface<WindowSurface>) {
        drop(surface);
    }

    fn destroy_context(&mut self, _display: &GlutinDisplay, context: GlutinContext) {
        drop(context);
    }

    fn terminate_display(&mut self, display: GlutinDisplay) {
        drop(display);
        tracing::debug!("egl display released");
    }
}
