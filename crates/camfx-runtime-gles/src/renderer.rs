//! Per-frame orchestration: a synchronous [`RenderSession`] plus the [`Renderer`] handle that
//! drives one on a dedicated render thread.
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::bounded;
use parking_lot::Mutex;

use camfx_core::{FilterCode, FilterSettings, LookupError, RenderError, RendererConfig, Size};

use crate::context::{ContextBackend, ContextRequest, GraphicsContext};
use crate::frame::{FrameSignal, FrameSlot, FrameSource, ImageStream};
use crate::gl::GlApi;
use crate::registry::FilterRegistry;

/// Render-target size. Taken from the window surface when the first frame arrives and kept
/// for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewportLatch {
    #[default]
    Unestablished,
    Established(Size),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was drawn and presented.
    Presented,
    /// No new frame was pending.
    Skipped,
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub presented: u64,
    pub skipped: u64,
    /// Producer signals accepted, including coalesced ones.
    pub signals: u64,
}

#[derive(Debug, Default)]
struct Counters {
    presented: AtomicU64,
    skipped: AtomicU64,
}

impl Counters {
    fn snapshot(&self, slot: &FrameSlot) -> RenderStats {
        RenderStats {
            presented: self.presented.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            signals: slot.signals(),
        }
    }
}

/// Context, frame source and filters for one attached window. Single-threaded.
pub struct RenderSession<B: ContextBackend, S> {
    context: GraphicsContext<B>,
    frames: FrameSource<B::Gl, S>,
    registry: FilterRegistry<B::Gl>,
    active: FilterCode,
    latch: ViewportLatch,
    clear_color: [f32; 4],
    counters: Arc<Counters>,
    detached: bool,
}

impl<B, S> RenderSession<B, S>
where
    B: ContextBackend,
    S: ImageStream<B::Gl>,
{
    /// Attaches a context to `window` on the calling thread, allocates the external texture
    /// and compiles the enabled filters.
    pub fn attach(
        backend: B,
        window: &B::Window,
        stream: S,
        config: &RendererConfig,
    ) -> Result<Self, RenderError> {
        config.validate()?;
        let context = GraphicsContext::attach(
            backend,
            window,
            &ContextRequest::gles(config.gles_major),
        )?;

        let mut frames = FrameSource::new(stream);
        let gl = context.gl()?;
        frames.create_external_texture(gl, config.texture_target)?;
        let mut registry = FilterRegistry::new(gl, &config.filters, config.texture_target);

        let active = match initial_filter(&mut registry, config.initial) {
            Ok(code) => code,
            Err(e) => {
                registry.destroy(gl);
                frames.destroy(gl);
                return Err(e);
            }
        };
        tracing::info!(filter = %active, "render session ready");

        Ok(Self {
            context,
            frames,
            registry,
            active,
            latch: ViewportLatch::Unestablished,
            clear_color: config.clear_color,
            counters: Arc::new(Counters::default()),
            detached: false,
        })
    }

    /// Makes `settings`' filter active from the next tick on.
    pub fn set_filter(&mut self, settings: FilterSettings) -> Result<(), RenderError> {
        let code = settings.code();
        self.registry.get_mut(code)?.attach(settings)?;
        if code != self.active {
            tracing::info!(from = %self.active, to = %code, "filter switched");
        }
        self.active = code;
        Ok(())
    }

    /// One render cycle. Draws only when a new frame was pending.
    pub fn tick(&mut self) -> Result<TickOutcome, RenderError> {
        if self.detached || self.frames.slot().is_closed() {
            return Ok(TickOutcome::Detached);
        }
        self.context.make_current()?;

        let gl = self.context.gl()?;
        if !self.frames.consume_latest(gl) {
            tracing::trace!("no pending frame; tick skipped");
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            return Ok(TickOutcome::Skipped);
        }

        let dc = self.context.draw_context()?;
        let size = match self.latch {
            ViewportLatch::Established(size) => size,
            ViewportLatch::Unestablished => {
                let surface = self.context.surface_size().ok_or(RenderError::Detached)?;
                dc.set_viewport(surface);
                self.latch = ViewportLatch::Established(surface);
                tracing::info!(
                    width = surface.width,
                    height = surface.height,
                    frame = ?self.frames.frame_size(),
                    "viewport established"
                );
                surface
            }
        };

        let [r, g, b, a] = self.clear_color;
        gl.clear_color(r, g, b, a);
        gl.clear(glow::COLOR_BUFFER_BIT);

        let variant = self.registry.get(self.active)?;
        let texture = self.frames.texture().ok_or(RenderError::Detached)?;
        variant.draw(&dc, texture, size);
        gl.flush();

        self.context.swap_buffers()?;
        self.counters.presented.fetch_add(1, Ordering::Relaxed);
        Ok(TickOutcome::Presented)
    }
}

impl<B: ContextBackend, S> RenderSession<B, S> {
    pub fn signal(&self) -> FrameSignal {
        self.frames.signal()
    }

    pub fn active_filter(&self) -> FilterCode {
        self.active
    }

    pub fn viewport(&self) -> ViewportLatch {
        self.latch
    }

    pub fn context(&self) -> &GraphicsContext<B> {
        &self.context
    }

    pub fn frames(&self) -> &FrameSource<B::Gl, S> {
        &self.frames
    }

    pub fn registry(&self) -> &FilterRegistry<B::Gl> {
        &self.registry
    }

    pub fn stats(&self) -> RenderStats {
        self.counters.snapshot(self.frames.slot())
    }

    /// Stops accepting frames, frees filters and the external texture, then the context.
    /// Calling it again is a no-op.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        self.frames.slot().close();

        let current = self.context.make_current().is_ok();
        match self.context.gl() {
            Ok(gl) if current => {
                self.registry.destroy(gl);
                self.frames.destroy(gl);
            }
            _ => tracing::warn!("context not current at detach; GPU objects released with it"),
        }
        self.context.detach();
    }
}

fn initial_filter<G: GlApi>(
    registry: &mut FilterRegistry<G>,
    settings: FilterSettings,
) -> Result<FilterCode, RenderError> {
    let code = settings.code();
    if registry.contains(code) {
        registry.get_mut(code)?.attach(settings)?;
        return Ok(code);
    }
    let fallback = registry
        .codes()
        .next()
        .ok_or(LookupError::UnsupportedFilter(code))?;
    tracing::warn!(%code, %fallback, "initial filter unavailable");
    Ok(fallback)
}

impl<B: ContextBackend, S> Drop for RenderSession<B, S> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<B: ContextBackend, S> fmt::Debug for RenderSession<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSession")
            .field("context", &self.context)
            .field("frames", &self.frames)
            .field("active", &self.active)
            .field("latch", &self.latch)
            .field("detached", &self.detached)
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Render thread
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Commands {
    filter: Mutex<Option<FilterSettings>>,
}

impl Commands {
    fn has_filter(&self) -> bool {
        self.filter.lock().is_some()
    }

    fn take_filter(&self) -> Option<FilterSettings> {
        self.filter.lock().take()
    }
}

/// Handle to a render session running on its own thread.
///
/// All GPU work, from context attach to teardown, happens on that thread. Producers talk to
/// it through [`Renderer::frame_signal`].
pub struct Renderer {
    slot: Arc<FrameSlot>,
    commands: Arc<Commands>,
    /// Codes whose variants compiled on the render thread.
    available: BTreeSet<FilterCode>,
    counters: Arc<Counters>,
    thread: Option<JoinHandle<()>>,
}

impl Renderer {
    /// Starts the render thread and attaches the context on it.
    ///
    /// `make_backend` runs on the render thread. Returns once attach has finished, with its
    /// error if it failed.
    pub fn spawn<B, S, F>(
        make_backend: F,
        window: B::Window,
        stream: S,
        config: RendererConfig,
    ) -> Result<Self, RenderError>
    where
        F: FnOnce() -> B + Send + 'static,
        B: ContextBackend + 'static,
        B::Window: Sized + Send + 'static,
        S: ImageStream<B::Gl> + Send + 'static,
    {
        let (ready_tx, ready_rx) = bounded(1);
        let commands = Arc::new(Commands::default());
        let thread_commands = Arc::clone(&commands);

        let thread = thread::Builder::new()
            .name("camfx-render".to_string())
            .spawn(move || {
                let session =
                    match RenderSession::attach(make_backend(), &window, stream, &config) {
                        Ok(session) => session,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                let shared = (
                    Arc::clone(session.frames.slot()),
                    Arc::clone(&session.counters),
                    session.registry.codes().collect::<BTreeSet<_>>(),
                );
                if ready_tx.send(Ok(shared)).is_err() {
                    return;
                }
                render_loop(session, &thread_commands);
            })
            .map_err(|e| RenderError::Thread(format!("spawn failed: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok((slot, counters, available))) => Ok(Self {
                slot,
                commands,
                available,
                counters,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(RenderError::Thread(
                    "render thread exited during attach".to_string(),
                ))
            }
        }
    }

    /// Producer handle. Signals are ignored once the renderer is detached.
    pub fn frame_signal(&self) -> FrameSignal {
        FrameSignal::new(Arc::clone(&self.slot))
    }

    pub fn on_frame_available(&self) -> bool {
        self.slot.on_frame_available()
    }

    /// Queues a filter switch; it applies before the next tick.
    ///
    /// Fails without queueing anything when the code is disabled or its shader did not build.
    pub fn set_filter(&self, settings: FilterSettings) -> Result<(), LookupError> {
        let code = settings.code();
        if !self.available.contains(&code) {
            return Err(LookupError::UnsupportedFilter(code));
        }
        *self.commands.filter.lock() = Some(settings);
        self.slot.ring();
        Ok(())
    }

    /// Codes accepted by [`Renderer::set_filter`].
    pub fn filters(&self) -> impl Iterator<Item = FilterCode> + '_ {
        self.available.iter().copied()
    }

    pub fn stats(&self) -> RenderStats {
        self.counters.snapshot(&self.slot)
    }

    pub fn is_detached(&self) -> bool {
        self.thread.is_none()
    }

    /// Closes the frame slot and waits for the render thread to finish its current tick and
    /// release every GPU resource. Calling it again is a no-op.
    pub fn detach(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.slot.close();
        if thread.join().is_err() {
            tracing::error!("render thread panicked");
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("filters", &self.available)
            .field("stats", &self.stats())
            .field("detached", &self.is_detached())
            .finish()
    }
}

fn render_loop<B, S>(mut session: RenderSession<B, S>, commands: &Commands)
where
    B: ContextBackend,
    S: ImageStream<B::Gl>,
{
    let slot = Arc::clone(session.frames.slot());
    loop {
        slot.wait_until(|| slot.is_closed() || slot.is_pending() || commands.has_filter());
        if slot.is_closed() {
            break;
        }

        if let Some(settings) = commands.take_filter() {
            if let Err(e) = session.set_filter(settings) {
                tracing::warn!(error = %e, "filter switch rejected");
            }
        }
        if !slot.is_pending() {
            continue;
        }

        match session.tick() {
            Ok(TickOutcome::Detached) => break,
            Ok(_) => {}
            Err(RenderError::Context(e)) => {
                tracing::error!(error = %e, "graphics context lost; stopping render thread");
                break;
            }
            Err(e) => tracing::warn!(error = %e, "render tick failed"),
        }
    }
    session.detach();
}
