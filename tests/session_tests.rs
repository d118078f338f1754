// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scan session

mod common;

use common::{NoTorchCamera, RecordingBrowser, RecordingClipboard, ScriptedDecoder, blank_frame};
use scanlink::backends::camera::{CameraBackend, ImageSequenceCamera, frame_channel};
use scanlink::errors::{CameraError, ScanError};
use scanlink::scanner::{
    GateState, LinkPolicy, Notice, ResultRouter, ScanEvent, ScanSession, Submission,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

fn session(
    decoder: ScriptedDecoder,
) -> (
    Arc<ScanSession>,
    UnboundedReceiver<ScanEvent>,
    Arc<RecordingBrowser>,
) {
    let browser = Arc::new(RecordingBrowser::default());
    let router = ResultRouter::new(LinkPolicy::HttpPrefix, browser.clone());
    let (session, events) = ScanSession::new(Arc::new(decoder), router);
    (session, events, browser)
}

async fn decode_one(session: &Arc<ScanSession>) {
    let Submission::Admitted(handle) = session.submit(blank_frame()) else {
        panic!("idle session should admit a frame");
    };
    handle.await.unwrap();
}

fn drain(events: &mut UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_every_value_in_a_frame_is_routed() {
    let decoder = ScriptedDecoder::new(vec![Ok(vec![
        Some("ABC123".into()),
        Some("https://example.com".into()),
        None,
    ])]);
    let (session, mut events, browser) = session(decoder);

    decode_one(&session).await;

    assert_eq!(
        drain(&mut events),
        vec![
            ScanEvent::IdentifierScanned("ABC123".into()),
            ScanEvent::LinkOpened("https://example.com".into()),
            ScanEvent::Notice(Notice::NoValue),
        ]
    );
    assert_eq!(browser.opened(), vec!["https://example.com"]);
    assert_eq!(session.identifiers().snapshot(), vec!["ABC123"]);
}

#[tokio::test]
async fn test_frame_without_codes_is_silent() {
    let (session, mut events, _) = session(ScriptedDecoder::new(Vec::new()));

    decode_one(&session).await;

    assert!(drain(&mut events).is_empty());
    assert_eq!(session.gate().state(), GateState::Idle);
}

#[tokio::test]
async fn test_decoder_failure_reports_scan_failed() {
    let decoder = ScriptedDecoder::new(vec![
        Err(ScanError::DecodeFailed("bad frame".into())),
        Ok(vec![Some("XYZ".into())]),
    ]);
    let (session, mut events, _) = session(decoder);

    decode_one(&session).await;
    decode_one(&session).await;

    // Scanning continues after a failure
    assert_eq!(
        drain(&mut events),
        vec![
            ScanEvent::Notice(Notice::ScanFailed),
            ScanEvent::IdentifierScanned("XYZ".into()),
        ]
    );
}

#[tokio::test]
async fn test_copy_identifiers() {
    let decoder = ScriptedDecoder::new(vec![
        Ok(vec![Some("B".into())]),
        Ok(vec![Some("A".into())]),
        Ok(vec![Some("B".into())]),
    ]);
    let (session, mut events, _) = session(decoder);
    let clipboard = RecordingClipboard::default();

    assert_eq!(session.copy_identifiers(&clipboard), Notice::NothingToCopy);
    assert!(clipboard.texts.lock().unwrap().is_empty());

    for _ in 0..3 {
        decode_one(&session).await;
    }
    drain(&mut events);

    assert_eq!(session.copy_identifiers(&clipboard), Notice::Copied(2));
    assert_eq!(*clipboard.texts.lock().unwrap(), vec!["A\nB"]);
    assert_eq!(drain(&mut events), vec![ScanEvent::Notice(Notice::Copied(2))]);

    // Copying does not clear the set
    assert_eq!(session.identifiers().len(), 2);
}

#[tokio::test]
async fn test_copy_failure() {
    let decoder = ScriptedDecoder::new(vec![Ok(vec![Some("A".into())])]);
    let (session, _events, _) = session(decoder);
    decode_one(&session).await;

    let clipboard = RecordingClipboard {
        broken: true,
        ..Default::default()
    };
    assert_eq!(session.copy_identifiers(&clipboard), Notice::CopyFailed);
}

#[tokio::test]
async fn test_torch_toggle() {
    let (session, mut events, _) = session(ScriptedDecoder::new(Vec::new()));
    let mut camera = ImageSequenceCamera::from_frames(vec![blank_frame()], 10);

    assert!(!session.torch_enabled());
    assert!(session.toggle_torch(&mut camera));
    assert!(camera.torch_enabled());
    assert!(!session.toggle_torch(&mut camera));
    assert!(!camera.torch_enabled());

    assert_eq!(
        drain(&mut events),
        vec![ScanEvent::TorchChanged(true), ScanEvent::TorchChanged(false)]
    );
}

#[tokio::test]
async fn test_torch_state_follows_toggle_when_hardware_fails() {
    let (session, mut events, _) = session(ScriptedDecoder::new(Vec::new()));
    let mut camera = NoTorchCamera;

    assert!(session.toggle_torch(&mut camera));
    assert!(session.torch_enabled());
    assert_eq!(
        drain(&mut events),
        vec![
            ScanEvent::Notice(Notice::TorchUnavailable),
            ScanEvent::TorchChanged(true),
        ]
    );
}

#[tokio::test]
async fn test_camera_errors() {
    let (session, mut events, _) = session(ScriptedDecoder::new(Vec::new()));

    session.report_camera_error(&CameraError::PermissionDenied("/dev/video0".into()));
    session.report_camera_error(&CameraError::NoCameraFound);

    assert_eq!(
        drain(&mut events),
        vec![
            ScanEvent::Notice(Notice::PermissionRequired),
            ScanEvent::Notice(Notice::ScanFailed),
        ]
    );
}

#[tokio::test]
async fn test_image_sequence_end_to_end() {
    let decoder = ScriptedDecoder::with_fallback(Vec::new(), Ok(vec![Some("ID-1".into())]));
    let (session, mut events, _) = session(decoder);

    let frames = vec![blank_frame(), blank_frame(), blank_frame()];
    let mut camera = ImageSequenceCamera::from_frames(frames, 50);
    let (sink, stream) = frame_channel();
    camera.start(sink).unwrap();

    let analyzer = session.spawn_analyzer(stream);
    tokio::time::timeout(Duration::from_secs(5), analyzer)
        .await
        .expect("analysis should end with the sequence")
        .unwrap();
    while session.gate().state() == GateState::Decoding {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    camera.stop();

    let received = drain(&mut events);
    assert!(!received.is_empty());
    assert!(
        received
            .iter()
            .all(|e| *e == ScanEvent::IdentifierScanned("ID-1".into()))
    );
    assert_eq!(session.identifiers().snapshot(), vec!["ID-1"]);
    // One event per decoded frame
    assert_eq!(session.gate().admitted_count() as usize, received.len());
}
