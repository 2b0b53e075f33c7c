// tests/session.rs

use anyhow::{anyhow, Result};
use std::thread;
use std::time::Duration;

use micfx::capture::{CaptureBackend, CaptureStream, InputTap, SyntheticCapture};
use micfx::recorder::RECORDING_MIME;
use micfx::{AppConfig, Session, SessionState};

struct NoMicrophone;

impl CaptureBackend for NoMicrophone {
    fn open(&self, _tap: InputTap) -> Result<Box<dyn CaptureStream>> {
        Err(anyhow!("permission denied"))
    }
}

fn config() -> AppConfig {
    AppConfig {
        output_dir: std::env::temp_dir().join(format!("micfx-session-{}", std::process::id())),
        ring_capacity: 48_000,
        ..Default::default()
    }
}

fn synthetic_session() -> Session {
    Session::new(Box::new(SyntheticCapture::default()), config())
}

fn wait_until_idle(session: &mut Session) {
    for _ in 0..400 {
        session.poll();
        if session.state() == SessionState::Idle {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("session never finished stopping");
}

#[test]
fn stop_without_start_is_a_noop() {
    let mut session = synthetic_session();
    session.stop();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.controls().start_enabled);
    assert!(!session.controls().stop_enabled);
    assert!(session.recording().is_none());
}

#[test]
fn start_then_stop_cancels_animation() {
    let mut session = synthetic_session();
    session.start().unwrap();
    assert!(session.animation_handle().is_some());

    session.stop();
    assert!(session.animation_handle().is_none());

    // A second stop changes nothing.
    session.stop();
    assert!(session.animation_handle().is_none());
    wait_until_idle(&mut session);
}

#[test]
fn record_produces_one_blob_and_reveals_save() {
    let mut session = synthetic_session();
    session.start().unwrap();

    let c = session.controls();
    assert!(!c.start_enabled && c.stop_enabled && !c.save_visible);

    thread::sleep(Duration::from_millis(200));
    assert!(session.frame());
    session.stop();

    assert!(session.controls().start_enabled);
    assert!(!session.controls().save_visible);

    wait_until_idle(&mut session);
    assert!(session.controls().save_visible);

    let rec = session.recording().expect("blob after stop");
    assert_eq!(rec.mime, RECORDING_MIME);
    assert_eq!(rec.file_name, "recording.wav");
    assert!(rec.bytes.len() > 44);
    assert!(rec.stats.duration_secs > 0.0);
    assert!((rec.duration().as_secs_f64() - rec.stats.duration_secs).abs() < 1e-6);

    let path = session.save().unwrap().expect("saved path");
    assert!(path.ends_with("recording.wav"));
    let _ = std::fs::remove_file(path);

    // Starting again hides the save control and drops the previous blob.
    session.start().unwrap();
    assert!(!session.controls().save_visible);
    assert!(session.recording().is_none());
    session.stop();
    wait_until_idle(&mut session);
}

#[test]
fn start_is_rejected_while_stopping() {
    let mut session = synthetic_session();
    session.start().unwrap();
    thread::sleep(Duration::from_millis(20));
    session.stop();

    // Only poll/finish_stop leave Stopping, so the state is pinned here.
    assert_eq!(session.state(), SessionState::Stopping);
    assert!(session.start().is_err());
    assert_eq!(session.state(), SessionState::Stopping);
    assert!(session.controls().start_enabled);

    wait_until_idle(&mut session);
    assert!(session.start().is_ok());
    session.stop();
    wait_until_idle(&mut session);
}

#[test]
fn capture_failure_leaves_session_idle() {
    let mut session = Session::new(Box::new(NoMicrophone), config());
    assert!(session.start().is_err());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.controls().start_enabled);
    assert!(!session.controls().stop_enabled);
    assert!(session.animation_handle().is_none());
    assert!(!session.frame());
}

#[test]
fn slider_input_before_start_is_applied_later() {
    let mut session = synthetic_session();
    session.set_pitch(0.5);
    session.set_distortion(None);
    assert_eq!(session.pitch(), 0.5);
    assert_eq!(session.distortion(), None);

    session.start().unwrap();
    session.set_pitch(1.5);
    assert_eq!(session.pitch(), 1.5);
    session.stop();
    wait_until_idle(&mut session);
}
