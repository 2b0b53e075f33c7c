// src/session.rs

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::capture::CaptureBackend;
use crate::config::AppConfig;
use crate::graph::SignalGraph;
use crate::recorder::{PendingRecording, Recorder, Recording};
use crate::visualizer::{AnimationLoop, Canvas, FrameHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    /// Stop was requested; the recording blob is still being finalized.
    Stopping,
}

/// What the UI should show for its start/stop/save controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub save_visible: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            start_enabled: true,
            stop_enabled: false,
            save_visible: false,
        }
    }
}

struct ActiveSession {
    graph: SignalGraph,
    recorder: Recorder,
    frame: FrameHandle,
}

enum Phase {
    Idle,
    Recording(ActiveSession),
    Stopping(PendingRecording),
}

/// The single recording session and its Idle -> Recording -> Stopping -> Idle
/// lifecycle. All transitions happen on the caller's (UI) thread.
pub struct Session {
    backend: Box<dyn CaptureBackend>,
    config: AppConfig,
    phase: Phase,
    controls: Controls,
    animation: AnimationLoop,
    canvas: Canvas,
    pitch: f32,
    distortion: Option<f32>,
    recording: Option<Recording>,
}

impl Session {
    pub fn new(backend: Box<dyn CaptureBackend>, config: AppConfig) -> Self {
        let canvas = Canvas::new(config.canvas_width, config.canvas_height);
        let pitch = config.pitch;
        let distortion = Some(config.distortion);
        Self {
            backend,
            config,
            phase: Phase::Idle,
            controls: Controls::default(),
            animation: AnimationLoop::new(),
            canvas,
            pitch,
            distortion,
            recording: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Recording(_) => SessionState::Recording,
            Phase::Stopping(_) => SessionState::Stopping,
        }
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn animation_handle(&self) -> Option<FrameHandle> {
        self.animation.active()
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distortion(&self) -> Option<f32> {
        self.distortion
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn record_time(&self) -> Duration {
        match &self.phase {
            Phase::Recording(active) => active.recorder.record_time(),
            _ => Duration::ZERO,
        }
    }

    /// Samples lost to a full recording buffer in the active session.
    pub fn dropped_samples(&self) -> u64 {
        match &self.phase {
            Phase::Recording(active) => active.recorder.dropped_samples(),
            _ => 0,
        }
    }

    /// Idle -> Recording. Rejected while a session is recording or still
    /// finalizing. A capture failure is logged and leaves everything as it was.
    pub fn start(&mut self) -> Result<()> {
        match self.phase {
            Phase::Idle => {}
            Phase::Recording(_) => bail!("a recording session is already active"),
            Phase::Stopping(_) => {
                log::warn!("Start ignored: previous session is still shutting down");
                bail!("previous session is still shutting down");
            }
        }

        let settings = self.config.graph_settings(self.pitch, self.distortion);
        let (graph, rec_consumer) = match SignalGraph::start(self.backend.as_ref(), &settings) {
            Ok(v) => v,
            Err(e) => {
                log::error!("Error accessing audio stream: {e:#}");
                return Err(e);
            }
        };

        let recorder = match Recorder::start(
            rec_consumer,
            graph.dropped_counter(),
            graph.format(),
            self.config.file_name.clone(),
        ) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Error starting recorder: {e:#}");
                return Err(e);
            }
        };

        let frame = self.animation.start();
        self.recording = None;
        self.controls = Controls {
            start_enabled: false,
            stop_enabled: true,
            save_visible: false,
        };
        self.phase = Phase::Recording(ActiveSession {
            graph,
            recorder,
            frame,
        });

        log::info!("Recording started");
        Ok(())
    }

    /// Recording -> Stopping. Without an active session this does nothing.
    pub fn stop(&mut self) {
        if !matches!(self.phase, Phase::Recording(_)) {
            return;
        }
        let Phase::Recording(mut active) = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return;
        };

        if let Err(e) = active.graph.close() {
            log::error!("Error closing audio graph: {e:#}");
        }
        self.animation.cancel(active.frame);
        let pending = active.recorder.stop();

        self.controls.start_enabled = true;
        self.controls.stop_enabled = false;
        self.phase = Phase::Stopping(pending);
        log::info!("Recording stopped, finalizing");
    }

    /// Stopping -> Idle once the blob is ready. Call once per UI tick.
    /// Returns true when a new recording became available.
    pub fn poll(&mut self) -> bool {
        let ready = matches!(&self.phase, Phase::Stopping(p) if p.is_ready());
        if ready {
            self.finish_stop()
        } else {
            false
        }
    }

    /// Block until a pending stop has produced its blob.
    pub fn finish_stop(&mut self) -> bool {
        let Phase::Stopping(pending) = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return false;
        };

        match pending.wait() {
            Ok(recording) => {
                log::info!(
                    "Recording ready: {} ({}, {} bytes, {:.2?}, peak {:.1} dBFS)",
                    recording.file_name,
                    recording.mime,
                    recording.bytes.len(),
                    recording.duration(),
                    recording.stats.peak_db
                );
                self.recording = Some(recording);
                self.controls.save_visible = true;
                true
            }
            Err(e) => {
                log::error!("Error finalizing recording: {e:#}");
                false
            }
        }
    }

    /// Draw one visualizer frame onto the canvas.
    pub fn frame(&mut self) -> bool {
        let analyser = match &self.phase {
            Phase::Recording(active) => Some(active.graph.analyser()),
            _ => None,
        };
        self.animation.tick(analyser.as_deref(), &mut self.canvas)
    }

    /// Pitch slider input.
    pub fn set_pitch(&mut self, value: f32) {
        self.pitch = value;
        if let Phase::Recording(active) = &self.phase {
            active.graph.controls().set_pitch(value);
        }
    }

    /// Distortion slider input; `None` means non-numeric.
    pub fn set_distortion(&mut self, amount: Option<f32>) {
        self.distortion = amount;
        if let Phase::Recording(active) = &self.phase {
            active.graph.controls().set_distortion(amount);
        }
    }

    /// Write the finished blob into the output directory.
    /// `Ok(None)` when there is nothing to save yet.
    pub fn save(&self) -> Result<Option<PathBuf>> {
        if !self.controls.save_visible {
            return Ok(None);
        }
        match &self.recording {
            Some(rec) => rec.save_to(&self.config.output_dir).map(Some),
            None => Ok(None),
        }
    }
}
