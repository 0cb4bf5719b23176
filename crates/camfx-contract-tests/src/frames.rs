//! Frame-delivery contracts: latest-wins slot, closed guard, CPU uploads.
use std::thread;

use camfx_core::{Size, TextureTarget};
use camfx_runtime_gles::{
    CpuFrameStream, CpuFrameWriter, FrameSlot, FrameSource, RgbaFrame,
};

use crate::fakes::{FakeStream, GlCall, RecordingGl};

#[test]
fn two_signals_before_a_tick_bind_only_the_newest_image() {
    let gl = RecordingGl::new();
    let (stream, producer, bound) = FakeStream::new(Size::new(1080, 1920));
    let mut source = FrameSource::new(stream);
    source
        .create_external_texture(&gl, TextureTarget::External)
        .expect("texture");
    let signal = source.signal();

    producer.write_image(1);
    assert!(signal.on_frame_available());
    producer.write_image(2);
    assert!(signal.on_frame_available());

    assert!(source.consume_latest(&gl));
    assert!(!source.consume_latest(&gl), "no frame is rendered twice");

    assert_eq!(*bound.lock(), vec![2]);
    assert_eq!(source.consumed(), 1);
    assert_eq!(source.frame_size(), Some(Size::new(1080, 1920)));
}

#[test]
fn nothing_pending_is_not_an_error() {
    let gl = RecordingGl::new();
    let (stream, _producer, bound) = FakeStream::new(Size::new(640, 480));
    let mut source = FrameSource::new(stream);
    source
        .create_external_texture(&gl, TextureTarget::External)
        .expect("texture");

    assert!(!source.consume_latest(&gl));
    assert!(bound.lock().is_empty());
}

#[test]
fn external_texture_is_created_once() {
    let gl = RecordingGl::new();
    let (stream, _producer, _bound) = FakeStream::new(Size::new(640, 480));
    let mut source = FrameSource::new(stream);

    let a = source
        .create_external_texture(&gl, TextureTarget::External)
        .expect("texture");
    let b = source
        .create_external_texture(&gl, TextureTarget::External)
        .expect("texture");
    assert_eq!(a, b);
    assert_eq!(gl.live_objects().len(), 1);

    source.destroy(&gl);
    source.destroy(&gl);
    assert!(gl.live_objects().is_empty());
}

#[test]
fn signals_from_many_threads_leave_one_pending_frame() {
    let slot = std::sync::Arc::new(FrameSlot::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let slot = slot.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    slot.on_frame_available();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("join");
    }

    assert_eq!(slot.signals(), 800);
    assert!(slot.take_pending());
    assert!(!slot.take_pending());
}

#[test]
fn closed_slot_ignores_signals() {
    let slot = FrameSlot::new();
    slot.on_frame_available();
    slot.close();

    assert!(!slot.is_pending(), "close drops the pending frame");
    assert!(!slot.on_frame_available());
    assert!(!slot.is_pending());
    assert_eq!(slot.signals(), 1);
}

#[test]
fn cpu_stream_uploads_only_the_latest_frame() {
    let gl = RecordingGl::new();
    let (stream, store) = CpuFrameStream::new();
    let mut source = FrameSource::new(stream);
    source
        .create_external_texture(&gl, TextureTarget::Texture2D)
        .expect("texture");
    let writer = CpuFrameWriter::new(store, source.signal());

    assert!(writer.publish(RgbaFrame {
        width: 2,
        height: 2,
        bytes: vec![0; 16],
    }));
    assert!(writer.publish(RgbaFrame {
        width: 4,
        height: 2,
        bytes: vec![255; 32],
    }));

    gl.clear_calls();
    assert!(source.consume_latest(&gl));
    let uploads: Vec<_> = gl
        .calls()
        .into_iter()
        .filter(|c| matches!(c, GlCall::TexImage2D { .. }))
        .collect();
    assert_eq!(
        uploads,
        vec![GlCall::TexImage2D {
            width: 4,
            height: 2
        }]
    );
    assert_eq!(source.frame_size(), Some(Size::new(4, 2)));
}

#[test]
fn cpu_stream_drops_malformed_frames() {
    let gl = RecordingGl::new();
    let (stream, store) = CpuFrameStream::new();
    let mut source = FrameSource::new(stream);
    source
        .create_external_texture(&gl, TextureTarget::Texture2D)
        .expect("texture");
    let writer = CpuFrameWriter::new(store, source.signal());

    writer.publish(RgbaFrame {
        width: 4,
        height: 4,
        bytes: vec![0; 3],
    });
    assert!(!source.consume_latest(&gl));
    assert_eq!(source.frame_size(), None);
}

#[test]
fn cpu_stream_refuses_external_targets() {
    let gl = RecordingGl::new();
    let (stream, store) = CpuFrameStream::new();
    let mut source = FrameSource::new(stream);
    source
        .create_external_texture(&gl, TextureTarget::External)
        .expect("texture");
    let writer = CpuFrameWriter::new(store, source.signal());

    writer.publish(RgbaFrame {
        width: 1,
        height: 1,
        bytes: vec![0; 4],
    });
    assert!(!source.consume_latest(&gl));
}

#[test]
fn cpu_signal_whose_frame_was_already_uploaded_is_a_quiet_skip() {
    let gl = RecordingGl::new();
    let (stream, store) = CpuFrameStream::new();
    let mut source = FrameSource::new(stream);
    source
        .create_external_texture(&gl, TextureTarget::Texture2D)
        .expect("texture");
    let signal = source.signal();
    let writer = CpuFrameWriter::new(store, signal.clone());

    writer.publish(RgbaFrame {
        width: 2,
        height: 2,
        bytes: vec![7; 16],
    });
    assert!(source.consume_latest(&gl));

    // The second frame's bytes were taken by the upload above; only its signal is left.
    assert!(signal.on_frame_available());
    gl.clear_calls();
    assert!(!source.consume_latest(&gl));
    assert!(!gl
        .calls()
        .iter()
        .any(|c| matches!(c, GlCall::TexImage2D { .. })));
    assert!(!source.slot().is_pending());
    assert_eq!(source.consumed(), 1);
    assert_eq!(source.frame_size(), Some(Size::new(2, 2)));
}
