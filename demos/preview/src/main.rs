//! Desktop preview: a synthetic camera feed rendered through the filter set.
//!
//! Keys: `1`-`4` pick passthrough / grayscale / negative / black-and-white, `i` toggles
//! inversion. An optional first argument is a renderer config JSON path.
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use camfx_core::{
    select_output_size, FilterCode, FilterSettings, RendererConfig, Size, TextureTarget,
};
use camfx_host_glutin::{GlutinBackend, NativeWindow};
use camfx_runtime_gles::{CpuFrameStream, CpuFrameWriter, Renderer, RgbaFrame};

/// Sizes the synthetic camera claims to support.
const CAMERA_SIZES: [Size; 3] = [
    Size::new(1920, 1080),
    Size::new(1280, 720),
    Size::new(640, 480),
];

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    if let Err(e) = run() {
        eprintln!("[camfx preview] error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config() -> anyhow::Result<RendererConfig> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => RendererConfig::from_json_path(&path)
            .with_context(|| format!("loading renderer config {path}"))?,
        None => RendererConfig::default(),
    };
    if config.texture_target != TextureTarget::Texture2D {
        tracing::info!("desktop frames are CPU uploads; using a 2d texture target");
        config.texture_target = TextureTarget::Texture2D;
    }
    Ok(config)
}

fn run() -> anyhow::Result<()> {
    let config = load_config()?;
    let event_loop = EventLoop::new();

    let screen = event_loop
        .primary_monitor()
        .map(|m| Size::new(m.size().width, m.size().height))
        .unwrap_or(Size::new(1280, 720));
    let frame_size = select_output_size(&CAMERA_SIZES, screen)
        .context("camera reports no output sizes")?;
    tracing::info!(?screen, ?frame_size, "output size selected");

    let window = WindowBuilder::new()
        .with_title("camfx preview")
        .with_inner_size(PhysicalSize::new(frame_size.width, frame_size.height))
        .with_resizable(false)
        .build(&event_loop)
        .context("creating window")?;
    let inner = window.inner_size();
    let native = NativeWindow::from_window(&window, Size::new(inner.width, inner.height));

    let (stream, store) = CpuFrameStream::new();
    let mut settings = config.initial;
    let mut renderer = Renderer::spawn(GlutinBackend::new, native, stream, config)
        .context("starting renderer")?;
    let writer = CpuFrameWriter::new(store, renderer.frame_signal());
    let producer = thread::Builder::new()
        .name("camfx-test-pattern".to_string())
        .spawn(move || produce_test_pattern(writer, frame_size))
        .context("starting producer")?;
    let mut producer = Some(producer);
    let mut last_report = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;
        // The renderer draws into this window until it is detached.
        let _keep_alive = &window;

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    renderer.detach();
                    if let Some(p) = producer.take() {
                        let _ = p.join();
                    }
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::ReceivedCharacter(c) => {
                    if let Some(next) = settings_for_key(c, settings) {
                        match renderer.set_filter(next) {
                            Ok(()) => settings = next,
                            Err(e) => tracing::warn!(error = %e, "filter not available"),
                        }
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared if last_report.elapsed() >= Duration::from_secs(5) => {
                last_report = Instant::now();
                tracing::info!(stats = ?renderer.stats(), "render stats");
            }
            _ => {}
        }
    });
}

fn settings_for_key(key: char, current: FilterSettings) -> Option<FilterSettings> {
    let next = match key {
        '1' => FilterCode::Passthrough.default_settings(),
        '2' => FilterCode::Grayscale.default_settings(),
        '3' => FilterCode::Negative.default_settings(),
        '4' => FilterCode::BlackAndWhite.default_settings(),
        'i' => match current {
            FilterSettings::BlackAndWhite { inverted } => FilterSettings::BlackAndWhite {
                inverted: !inverted,
            },
            _ => return None,
        },
        _ => return None,
    };
    Some(next)
}

/// Moving colour bars, published until the renderer closes the slot.
fn produce_test_pattern(writer: CpuFrameWriter, size: Size) {
    let (w, h) = (size.width as usize, size.height as usize);
    let mut frame_no: usize = 0;

    while !writer.is_closed() {
        let mut bytes = vec![0u8; w * h * 4];
        for (y, row) in bytes.chunks_exact_mut(w * 4).enumerate() {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let bar = ((x + frame_no * 4) * 8 / w.max(1)) % 8;
                let shade = (255 * y / h.max(1)) as u8;
                px[0] = if bar & 1 != 0 { 255 } else { shade };
                px[1] = if bar & 2 != 0 { 255 } else { shade / 2 };
                px[2] = if bar & 4 != 0 { 255 } else { 255 - shade };
                px[3] = 255;
            }
        }
        writer.publish(RgbaFrame {
            width: size.width,
            height: size.height,
            bytes,
        });
        frame_no += 1;
        thread::sleep(FRAME_INTERVAL);
    }
}
