//! Render-session contracts: the per-tick cycle, viewport latch and teardown.
use camfx_core::{
    ContextStage, FilterCode, FilterSettings, LookupError, RenderError, RendererConfig, Size,
};
use camfx_runtime_gles::{RenderSession, TickOutcome, ViewportLatch};

use crate::fakes::{
    FakeBackend, FakeProducer, FakeStream, FakeWindow, GlCall, NativeEvent, RecordingGl,
};

struct Harness {
    session: RenderSession<FakeBackend, FakeStream>,
    backend: FakeBackend,
    gl: RecordingGl,
    producer: FakeProducer,
}

fn harness_with(config: RendererConfig, gl: RecordingGl) -> Harness {
    let backend = FakeBackend::new(gl.clone());
    let (stream, producer, _bound) = FakeStream::new(Size::new(1080, 1920));
    let session = RenderSession::attach(backend.clone(), &FakeWindow::default(), stream, &config)
        .expect("attach session");
    Harness {
        session,
        backend,
        gl,
        producer,
    }
}

fn harness() -> Harness {
    harness_with(RendererConfig::default(), RecordingGl::new())
}

#[test]
fn tick_without_a_frame_is_skipped() {
    let mut h = harness();
    h.gl.clear_calls();

    assert_eq!(h.session.tick().expect("tick"), TickOutcome::Skipped);
    assert_eq!(h.gl.draws(), 0);
    assert!(!h.backend.events().contains(&NativeEvent::SwapBuffers));
    assert_eq!(h.session.stats().skipped, 1);
}

#[test]
fn tick_clears_draws_flushes_and_presents() {
    let mut h = harness();
    h.gl.clear_calls();

    h.producer.write_image(1);
    h.session.signal().on_frame_available();
    assert_eq!(h.session.tick().expect("tick"), TickOutcome::Presented);

    let calls = h.gl.calls();
    let pos = |want: fn(&GlCall) -> bool| calls.iter().position(want).expect("call issued");
    let clear = pos(|c| matches!(c, GlCall::Clear(_)));
    let draw = pos(|c| matches!(c, GlCall::DrawArrays { .. }));
    let flush = pos(|c| matches!(c, GlCall::Flush));
    assert!(clear < draw && draw < flush);
    assert!(calls.contains(&GlCall::ClearColor([0.0, 0.0, 0.0, 1.0])));
    assert_eq!(h.backend.events().last(), Some(&NativeEvent::SwapBuffers));
    assert_eq!(h.session.stats().presented, 1);
}

#[test]
fn first_frame_latches_viewport_exactly_once() {
    let mut h = harness();
    assert_eq!(h.session.viewport(), ViewportLatch::Unestablished);
    h.gl.clear_calls();

    for id in 1..=3 {
        h.producer.write_image(id);
        h.session.signal().on_frame_available();
        assert_eq!(h.session.tick().expect("tick"), TickOutcome::Presented);
    }

    assert_eq!(
        h.session.viewport(),
        ViewportLatch::Established(Size::new(1080, 1920))
    );
    assert_eq!(
        h.gl.viewports(),
        vec![GlCall::Viewport {
            x: 0,
            y: 0,
            width: 1080,
            height: 1920
        }]
    );
}

#[test]
fn viewport_follows_the_window_surface_not_the_frame() {
    let gl = RecordingGl::new();
    let backend = FakeBackend::new(gl.clone());
    let window = FakeWindow {
        size: Size::new(1080, 1920),
    };
    let (stream, producer, _bound) = FakeStream::new(Size::new(1920, 1080));
    let mut session =
        RenderSession::attach(backend, &window, stream, &RendererConfig::default())
            .expect("attach session");
    gl.clear_calls();

    producer.write_image(1);
    session.signal().on_frame_available();
    assert_eq!(session.tick().expect("tick"), TickOutcome::Presented);

    assert_eq!(session.frames().frame_size(), Some(Size::new(1920, 1080)));
    assert_eq!(
        session.viewport(),
        ViewportLatch::Established(Size::new(1080, 1920))
    );
    assert_eq!(
        gl.viewports(),
        vec![GlCall::Viewport {
            x: 0,
            y: 0,
            width: 1080,
            height: 1920
        }]
    );
}

#[test]
fn set_filter_applies_on_next_tick() {
    let mut h = harness();
    h.session
        .set_filter(FilterSettings::BlackAndWhite { inverted: true })
        .expect("set filter");
    assert_eq!(h.session.active_filter(), FilterCode::BlackAndWhite);

    h.session.signal().on_frame_available();
    h.session.tick().expect("tick");
    assert_eq!(h.gl.uniform_1i("inverted"), vec![1]);

    h.session
        .set_filter(FilterSettings::BlackAndWhite { inverted: false })
        .expect("set filter");
    h.session.signal().on_frame_available();
    h.session.tick().expect("tick");
    assert_eq!(h.gl.uniform_1i("inverted"), vec![1, 0]);
}

#[test]
fn set_filter_to_a_disabled_code_keeps_the_active_one() {
    let config = RendererConfig {
        filters: vec![FilterCode::Passthrough, FilterCode::Grayscale],
        ..RendererConfig::default()
    };
    let mut h = harness_with(config, RecordingGl::new());

    let err = h
        .session
        .set_filter(FilterSettings::Negative)
        .expect_err("negative is not enabled");
    assert!(matches!(
        err,
        RenderError::Lookup(LookupError::UnsupportedFilter(FilterCode::Negative))
    ));
    assert_eq!(h.session.active_filter(), FilterCode::Passthrough);
}

#[test]
fn initial_filter_falls_back_when_its_shader_fails() {
    let config = RendererConfig {
        initial: FilterSettings::BlackAndWhite { inverted: true },
        ..RendererConfig::default()
    };
    let h = harness_with(config, RecordingGl::failing_compile("uniform int inverted"));

    assert_eq!(h.session.active_filter(), FilterCode::Passthrough);
    assert!(!h.session.registry().contains(FilterCode::BlackAndWhite));
}

#[test]
fn attach_fails_when_no_filter_compiles() {
    let gl = RecordingGl::failing_compile("gl_FragColor");
    let backend = FakeBackend::new(gl.clone());
    let (stream, _producer, _bound) = FakeStream::new(Size::new(640, 480));

    let err = RenderSession::attach(
        backend.clone(),
        &FakeWindow::default(),
        stream,
        &RendererConfig::default(),
    )
    .expect_err("nothing to render with");
    assert!(matches!(err, RenderError::Lookup(_)), "unexpected: {err:?}");
    assert!(gl.live_objects().is_empty(), "leaked: {:?}", gl.live_objects());
    assert_eq!(backend.releases().last(), Some(&NativeEvent::TerminateDisplay));
}

#[test]
fn attach_failure_surfaces_the_context_stage() {
    let backend = FakeBackend::failing_at(RecordingGl::new(), ContextStage::ChooseConfig);
    let (stream, _producer, _bound) = FakeStream::new(Size::new(640, 480));

    let err = RenderSession::attach(
        backend,
        &FakeWindow::default(),
        stream,
        &RendererConfig::default(),
    )
    .expect_err("config refused");
    match err {
        RenderError::Context(e) => assert_eq!(e.stage, ContextStage::ChooseConfig),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn detach_frees_every_gpu_object_once() {
    let mut h = harness();
    h.session.signal().on_frame_available();
    h.session.tick().expect("tick");
    assert!(!h.gl.live_objects().is_empty());

    h.session.detach();
    h.session.detach();

    assert!(h.gl.live_objects().is_empty(), "leaked: {:?}", h.gl.live_objects());
    assert_eq!(
        h.backend.releases(),
        vec![
            NativeEvent::ReleaseCurrent,
            NativeEvent::DestroySurface,
            NativeEvent::DestroyContext,
            NativeEvent::TerminateDisplay,
        ]
    );
}

#[test]
fn signals_after_detach_touch_nothing() {
    let mut h = harness();
    let signal = h.session.signal();
    h.session.detach();
    h.gl.clear_calls();
    let events_before = h.backend.events().len();

    assert!(!signal.on_frame_available());
    assert_eq!(h.session.tick().expect("tick"), TickOutcome::Detached);

    assert!(h.gl.calls().is_empty());
    assert_eq!(h.backend.events().len(), events_before);
}
