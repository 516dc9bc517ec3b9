use std::sync::Arc;

use capture_codec::{
    BackendRegistry, CaptureFrame, CodecError, EncodeOutcome, EncoderSession, FrameOutcome,
    FramePipeline, PixelFormat, RawFrame, SessionState, SourceAttribute, StubBackend,
    SyntheticConfig, SyntheticSource, VideoCaptureAttribute, VideoCodecAttribute,
};

fn vga() -> VideoCodecAttribute {
    VideoCodecAttribute {
        width: 640,
        height: 480,
        frame_rate: 30,
        bitrate: 1_000_000,
    }
}

#[test]
fn vga_nv12_encodes_two_identical_frames() {
    let registry = BackendRegistry::with_builtin();
    let backend = registry.select(Some("stub")).expect("stub backend");
    let mut session = EncoderSession::new(backend);
    session
        .configure(&vga(), PixelFormat::Nv12)
        .expect("configure");
    assert_eq!(session.state(), SessionState::Configured);

    let frame = RawFrame::zeroed(PixelFormat::Nv12, 640, 480, 0).expect("frame");
    let mut packets = Vec::new();
    for _ in 0..2 {
        match session.encode_frame(Some(&frame.as_video())).expect("encode") {
            EncodeOutcome::Packet(packet) => packets.push(packet),
            EncodeOutcome::Pending => {}
        }
    }
    packets.extend(session.flush().expect("flush"));
    session.close();

    assert_eq!(packets.len(), 2);
    assert!(packets[0].keyframe);
    assert!(!packets[1].keyframe);
    // Same picture content, same digest after the NAL header.
    assert_eq!(packets[0].data[5..], packets[1].data[5..]);
    assert_eq!(session.stats().frames_submitted, 2);
    assert_eq!(session.state(), SessionState::Closed);
}

#[test]
fn lookahead_backend_reports_pending() {
    let mut session = EncoderSession::new(Arc::new(StubBackend::new().with_delay(3)));
    session.configure(&vga(), PixelFormat::Nv12).unwrap();
    let frame = RawFrame::zeroed(PixelFormat::Nv12, 640, 480, 0).unwrap();
    for _ in 0..2 {
        assert_eq!(
            session.encode_frame(Some(&frame.as_video())).unwrap(),
            EncodeOutcome::Pending
        );
    }
    assert_eq!(session.flush().unwrap().len(), 2);
}

#[test]
fn stride_padding_does_not_change_encoded_output() {
    let encode_first = |padding: usize| {
        let mut source = SyntheticSource::new(SyntheticConfig {
            format: PixelFormat::Nv12,
            width: 64,
            height: 32,
            padding,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let mut session = EncoderSession::new(Arc::new(StubBackend::new()));
        session
            .configure(
                &VideoCodecAttribute {
                    width: 64,
                    height: 32,
                    frame_rate: 15,
                    bitrate: 200_000,
                },
                PixelFormat::Nv12,
            )
            .unwrap();
        let frame = source.next_frame().unwrap();
        session
            .encode_frame(Some(&frame.as_video()))
            .unwrap()
            .into_packet()
            .unwrap()
    };
    assert_eq!(encode_first(0), encode_first(24));
}

#[test]
fn encode_outside_lifecycle_is_invalid_state() {
    let frame = RawFrame::zeroed(PixelFormat::I420, 32, 32, 0).unwrap();
    let mut session = EncoderSession::new(Arc::new(StubBackend::new()));
    assert!(matches!(
        session.encode_frame(Some(&frame.as_video())),
        Err(CodecError::InvalidState { .. })
    ));

    session
        .configure(
            &VideoCodecAttribute {
                width: 32,
                height: 32,
                frame_rate: 30,
                bitrate: 100_000,
            },
            PixelFormat::I420,
        )
        .unwrap();
    assert!(session.encode_frame(Some(&frame.as_video())).is_ok());
    session.close();
    assert!(matches!(
        session.encode_frame(Some(&frame.as_video())),
        Err(CodecError::InvalidState { .. })
    ));
}

#[test]
fn pipeline_survives_encoder_failures() {
    let mut pipeline = FramePipeline::new(Arc::new(StubBackend::new().failing_on([0, 2])));
    pipeline
        .set_source_attribute(SourceAttribute::Video(VideoCaptureAttribute {
            format: PixelFormat::Nv12,
            width: 32,
            height: 16,
            frame_rate: 10,
        }))
        .unwrap();
    pipeline
        .set_video_codec_attribute(VideoCodecAttribute {
            width: 32,
            height: 16,
            frame_rate: 10,
            bitrate: 100_000,
        })
        .unwrap();
    pipeline.start().unwrap();

    let mut source = SyntheticSource::new(SyntheticConfig {
        format: PixelFormat::Nv12,
        width: 32,
        height: 16,
        ..SyntheticConfig::default()
    })
    .unwrap();

    let mut failures = 0;
    let mut packets = 0;
    for _ in 0..5 {
        let raw = source.next_frame().unwrap();
        match pipeline.send_frame(Some(&CaptureFrame::Video(raw.as_video()))) {
            Ok(FrameOutcome::Video(EncodeOutcome::Packet(_))) => packets += 1,
            Ok(other) => panic!("unexpected outcome {:?}", other),
            Err(CodecError::EncoderFailure(_)) => failures += 1,
            Err(e) => panic!("unexpected error {}", e),
        }
    }
    pipeline.stop().unwrap();

    assert_eq!((packets, failures), (3, 2));
    assert_eq!(pipeline.session_stats().frames_dropped, 2);
    assert_eq!(pipeline.stats().video_frames, 5);
}
