//! Render-thread contracts: attach reporting, tick coalescing, queued filter switches and
//! blocking teardown.
use std::time::Duration;

use crossbeam_channel::unbounded;

use camfx_core::{
    ContextStage, FilterCode, FilterSettings, LookupError, RenderError, RendererConfig, Size,
};
use camfx_runtime_gles::Renderer;

use crate::fakes::{wait_for, FakeBackend, FakeStream, FakeWindow, NativeEvent, RecordingGl};

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn spawn_reports_attach_failure() {
    let gl = RecordingGl::new();
    let backend = FakeBackend::failing_at(gl, ContextStage::CreateSurface);
    let (stream, _producer, _bound) = FakeStream::new(Size::new(640, 480));

    let err = Renderer::spawn(
        move || backend,
        FakeWindow::default(),
        stream,
        RendererConfig::default(),
    )
    .expect_err("surface refused");
    match err {
        RenderError::Context(e) => assert_eq!(e.stage, ContextStage::CreateSurface),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn signals_during_a_tick_coalesce_into_one_follow_up() {
    let gl = RecordingGl::new();
    let backend = FakeBackend::new(gl.clone());
    let (entered_tx, entered_rx) = unbounded();
    let (release_tx, release_rx) = unbounded();
    let (stream, producer, bound) = FakeStream::new(Size::new(1080, 1920));
    let stream = stream.gated(entered_tx, release_rx);

    let mut renderer = Renderer::spawn(
        move || backend,
        FakeWindow::default(),
        stream,
        RendererConfig::default(),
    )
    .expect("spawn");
    let signal = renderer.frame_signal();

    producer.write_image(1);
    signal.on_frame_available();
    entered_rx.recv_timeout(WAIT).expect("first tick started");

    // The render thread is inside its first tick.
    for id in 2..=4 {
        producer.write_image(id);
        assert!(signal.on_frame_available());
    }
    release_tx.send(()).expect("release");

    entered_rx.recv_timeout(WAIT).expect("follow-up tick started");
    release_tx.send(()).expect("release");

    assert!(wait_for(|| renderer.stats().presented == 2));
    assert!(
        entered_rx.recv_timeout(Duration::from_millis(50)).is_err(),
        "no third tick"
    );

    renderer.detach();
    assert_eq!(*bound.lock(), vec![1, 4]);
    let stats = renderer.stats();
    assert_eq!(stats.signals, 4);
    assert_eq!(stats.presented, 2);
}

#[test]
fn queued_filter_switch_applies_before_the_next_tick() {
    let gl = RecordingGl::new();
    let backend = FakeBackend::new(gl.clone());
    let (stream, _producer, _bound) = FakeStream::new(Size::new(1080, 1920));

    let mut renderer = Renderer::spawn(
        move || backend,
        FakeWindow::default(),
        stream,
        RendererConfig::default(),
    )
    .expect("spawn");

    renderer
        .set_filter(FilterSettings::BlackAndWhite { inverted: true })
        .expect("black-and-white is enabled");
    renderer.on_frame_available();
    assert!(wait_for(|| renderer.stats().presented == 1));
    assert_eq!(gl.uniform_1i("inverted"), vec![1]);

    renderer.detach();
}

#[test]
fn unsupported_filter_is_reported_to_the_caller() {
    let gl = RecordingGl::new();
    let backend = FakeBackend::new(gl.clone());
    let (stream, _producer, _bound) = FakeStream::new(Size::new(640, 480));
    let config = RendererConfig {
        filters: vec![FilterCode::Passthrough],
        initial: FilterSettings::Passthrough,
        ..RendererConfig::default()
    };

    let mut renderer =
        Renderer::spawn(move || backend, FakeWindow::default(), stream, config).expect("spawn");
    assert_eq!(renderer.filters().collect::<Vec<_>>(), vec![FilterCode::Passthrough]);

    assert_eq!(
        renderer.set_filter(FilterSettings::Negative),
        Err(LookupError::UnsupportedFilter(FilterCode::Negative))
    );
    renderer.on_frame_available();
    assert!(wait_for(|| renderer.stats().presented == 1));
    assert!(renderer.set_filter(FilterSettings::Passthrough).is_ok());

    renderer.detach();
}

#[test]
fn failed_shader_is_reported_as_unsupported() {
    let gl = RecordingGl::failing_compile("uniform int inverted");
    let backend = FakeBackend::new(gl.clone());
    let (stream, _producer, _bound) = FakeStream::new(Size::new(640, 480));

    let renderer = Renderer::spawn(
        move || backend,
        FakeWindow::default(),
        stream,
        RendererConfig::default(),
    )
    .expect("spawn");
    assert_eq!(
        renderer.set_filter(FilterSettings::BlackAndWhite { inverted: false }),
        Err(LookupError::UnsupportedFilter(FilterCode::BlackAndWhite))
    );
    assert!(renderer.set_filter(FilterSettings::Grayscale).is_ok());
}

#[test]
fn detach_joins_and_releases_everything() {
    let gl = RecordingGl::new();
    let backend = FakeBackend::new(gl.clone());
    let events = backend.clone();
    let (stream, _producer, _bound) = FakeStream::new(Size::new(1080, 1920));

    let mut renderer = Renderer::spawn(
        move || backend,
        FakeWindow::default(),
        stream,
        RendererConfig::default(),
    )
    .expect("spawn");
    let signal = renderer.frame_signal();
    signal.on_frame_available();
    assert!(wait_for(|| renderer.stats().presented == 1));

    renderer.detach();
    assert!(renderer.is_detached());
    assert!(gl.live_objects().is_empty(), "leaked: {:?}", gl.live_objects());
    assert_eq!(events.releases().last(), Some(&NativeEvent::TerminateDisplay));

    // Post-detach signals are ignored and reach no GPU call.
    gl.clear_calls();
    assert!(!signal.on_frame_available());
    assert!(!renderer.on_frame_available());
    renderer.detach();
    assert!(gl.calls().is_empty());
}

#[test]
fn dropping_the_handle_detaches() {
    let gl = RecordingGl::new();
    let backend = FakeBackend::new(gl.clone());
    let events = backend.clone();
    let (stream, _producer, _bound) = FakeStream::new(Size::new(640, 480));

    let renderer = Renderer::spawn(
        move || backend,
        FakeWindow::default(),
        stream,
        RendererConfig::default(),
    )
    .expect("spawn");
    let signal = renderer.frame_signal();
    drop(renderer);

    assert!(signal.is_closed());
    assert!(gl.live_objects().is_empty());
    assert_eq!(events.releases().last(), Some(&NativeEvent::TerminateDisplay));
}
