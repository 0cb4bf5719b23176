//! Producer → render-thread frame delivery.
//!
//! The only state shared across threads is [`FrameSlot`]: a `pending` flag the producer sets
//! and the render thread clears, plus a `closed` flag set on teardown. A frame arriving while
//! the previous one is unconsumed simply leaves `pending` set, so intermediate frames are
//! dropped and there is never more than one redraw owed.
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use camfx_core::{RenderError, Size, StreamError, TextureTarget};

use crate::gl::GlApi;
use crate::texture::ExternalTexture;

#[derive(Debug, Default)]
pub struct FrameSlot {
    pending: AtomicBool,
    closed: AtomicBool,
    signals: AtomicU64,
    doorbell: Mutex<()>,
    wakeup: Condvar,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a frame as pending. Ignored once the slot is closed.
    pub fn on_frame_available(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.signals.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
        self.ring();
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of accepted producer signals so far.
    pub fn signals(&self) -> u64 {
        self.signals.load(Ordering::Relaxed)
    }

    /// Clears the pending flag, returning whether it was set.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Stops accepting signals and wakes any waiter.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.pending.store(false, Ordering::Release);
        self.ring();
    }

    /// Wakes the thread blocked in [`FrameSlot::wait_until`].
    pub fn ring(&self) {
        let _guard = self.doorbell.lock();
        self.wakeup.notify_all();
    }

    /// Blocks until `ready` returns true. `ready` is re-checked after every ring.
    pub fn wait_until(&self, mut ready: impl FnMut() -> bool) {
        let mut guard = self.doorbell.lock();
        while !ready() {
            self.wakeup.wait(&mut guard);
        }
    }
}

/// Producer-side handle. Cheap to clone and safe to call from any thread.
#[derive(Debug, Clone)]
pub struct FrameSignal {
    slot: Arc<FrameSlot>,
}

impl FrameSignal {
    pub fn new(slot: Arc<FrameSlot>) -> Self {
        Self { slot }
    }

    /// Call after each frame written into the external texture. Returns false once the
    /// renderer has been detached.
    pub fn on_frame_available(&self) -> bool {
        self.slot.on_frame_available()
    }

    pub fn is_closed(&self) -> bool {
        self.slot.is_closed()
    }
}

/// Binds the producer's most recent image to the external texture.
///
/// Called on the render thread with the context current, at most once per consumed signal.
/// `Ok(None)` means the image behind the signal was already bound by an earlier update.
pub trait ImageStream<G: GlApi> {
    fn update_tex_image(
        &mut self,
        gl: &G,
        texture: &ExternalTexture<G>,
    ) -> Result<Option<Size>, StreamError>;
}

/// Render-thread owner of the external texture and the consumer end of the slot.
pub struct FrameSource<G: GlApi, S> {
    slot: Arc<FrameSlot>,
    texture: Option<ExternalTexture<G>>,
    stream: S,
    frame_size: Option<Size>,
    consumed: u64,
}

impl<G: GlApi, S> FrameSource<G, S> {
    pub fn new(stream: S) -> Self {
        Self {
            slot: Arc::new(FrameSlot::new()),
            texture: None,
            stream,
            frame_size: None,
            consumed: 0,
        }
    }

    /// Allocates the one texture the producer writes. Repeated calls return the same id.
    pub fn create_external_texture(
        &mut self,
        gl: &G,
        target: TextureTarget,
    ) -> Result<G::Texture, RenderError> {
        if let Some(texture) = &self.texture {
            return Ok(texture.id());
        }
        let texture = ExternalTexture::new(gl, target)?;
        let id = texture.id();
        self.texture = Some(texture);
        Ok(id)
    }

    pub fn texture(&self) -> Option<&ExternalTexture<G>> {
        self.texture.as_ref()
    }

    pub fn signal(&self) -> FrameSignal {
        FrameSignal::new(Arc::clone(&self.slot))
    }

    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    pub fn on_frame_available(&self) -> bool {
        self.slot.on_frame_available()
    }

    /// Size reported by the last image update.
    pub fn frame_size(&self) -> Option<Size> {
        self.frame_size
    }

    /// Frames actually bound to the texture so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn destroy(&mut self, gl: &G) {
        if let Some(texture) = self.texture.take() {
            texture.destroy(gl);
        }
    }
}

impl<G: GlApi, S: ImageStream<G>> FrameSource<G, S> {
    /// If a frame is pending, binds the latest image and clears the flag.
    ///
    /// Returns false when nothing is pending; the caller skips drawing for this tick.
    pub fn consume_latest(&mut self, gl: &G) -> bool {
        if !self.slot.take_pending() {
            return false;
        }
        let Some(texture) = self.texture.as_ref() else {
            tracing::warn!("frame signalled before the external texture was created");
            return false;
        };
        match self.stream.update_tex_image(gl, texture) {
            Ok(Some(size)) => {
                self.frame_size = Some(size);
                self.consumed += 1;
                true
            }
            Ok(None) => {
                tracing::trace!("frame already bound by the previous update");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping frame");
                false
            }
        }
    }
}

impl<G: GlApi, S> fmt::Debug for FrameSource<G, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSource")
            .field("texture", &self.texture.as_ref().map(|t| t.id()))
            .field("frame_size", &self.frame_size)
            .field("consumed", &self.consumed)
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// CPU frames (hosts without a platform external-image producer)
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>, // RGBA8, tightly packed
}

type LatestFrame = Arc<Mutex<Option<RgbaFrame>>>;

/// Uploads the latest published [`RgbaFrame`] into a 2D texture.
#[derive(Debug)]
pub struct CpuFrameStream {
    latest: LatestFrame,
}

/// Producer end of a [`CpuFrameStream`].
#[derive(Debug, Clone)]
pub struct CpuFrameWriter {
    latest: LatestFrame,
    signal: FrameSignal,
}

/// Shared store handed from the stream to its writer once the renderer's signal exists.
#[derive(Debug, Clone)]
pub struct CpuFrameStore {
    latest: LatestFrame,
}

impl CpuFrameStream {
    pub fn new() -> (Self, CpuFrameStore) {
        let latest: LatestFrame = Arc::new(Mutex::new(None));
        (
            Self {
                latest: Arc::clone(&latest),
            },
            CpuFrameStore { latest },
        )
    }
}

impl CpuFrameWriter {
    pub fn new(store: CpuFrameStore, signal: FrameSignal) -> Self {
        Self {
            latest: store.latest,
            signal,
        }
    }

    /// Replaces any unconsumed frame and signals the renderer.
    pub fn publish(&self, frame: RgbaFrame) -> bool {
        *self.latest.lock() = Some(frame);
        self.signal.on_frame_available()
    }

    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }
}

impl<G: GlApi> ImageStream<G> for CpuFrameStream {
    fn update_tex_image(
        &mut self,
        gl: &G,
        texture: &ExternalTexture<G>,
    ) -> Result<Option<Size>, StreamError> {
        if texture.target() != TextureTarget::Texture2D {
            return Err(StreamError(
                "cpu frames need a 2d texture target".to_string(),
            ));
        }
        // A frame published between the flag swap and this take was uploaded one tick early.
        let Some(frame) = self.latest.lock().take() else {
            return Ok(None);
        };

        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.bytes.len() != expected {
            return Err(StreamError(format!(
                "frame is {} bytes, expected {expected} for {}x{}",
                frame.bytes.len(),
                frame.width,
                frame.height
            )));
        }

        texture.bind(gl, 0);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::RGBA as i32,
            frame.width as i32,
            frame.height as i32,
            0,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            Some(&frame.bytes),
        );
        gl.bind_texture(glow::TEXTURE_2D, None);

        Ok(Some(Size::new(frame.width, frame.height)))
    }
}
