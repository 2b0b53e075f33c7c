// src/controller.rs

use std::fmt::Write as FmtWrite;
use std::io::{stdout, Write};

use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
    Command,
};

use crate::session::{Session, SessionState};
use crate::visualizer::terminal::{render_ansi, sample_cells};

/// A numeric slider nudged from the keyboard.
#[derive(Debug, Clone, Copy)]
pub struct Slider {
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    pub fn nudge(&mut self, steps: f32) -> f32 {
        self.value = (self.value + steps * self.step).clamp(self.min, self.max);
        self.value
    }
}

/// Keyboard front end over a [`Session`], drawing the spectrum and a status
/// line into the terminal.
pub struct RecorderController {
    pub session: Session,
    pitch: Slider,
    distortion: Slider,
    cols: usize,
    rows: usize,
    status: String,
    draw_buffer: String,
}

impl RecorderController {
    pub fn new(session: Session, cols: usize, rows: usize) -> Self {
        let pitch = Slider {
            value: session.pitch(),
            min: 0.0,
            max: 2.0,
            step: 0.1,
        };
        let distortion = Slider {
            value: session.distortion().unwrap_or(crate::curve::DEFAULT_AMOUNT),
            min: 0.0,
            max: 1000.0,
            step: 10.0,
        };
        Self {
            session,
            pitch,
            distortion,
            cols: cols.max(8),
            rows: rows.max(4),
            status: String::from("Press [R] to start"),
            draw_buffer: String::with_capacity(16 * 1024),
        }
    }

    pub fn should_quit(&self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        matches!(key, KeyCode::Char('q') | KeyCode::Char('Q'))
            || (key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if !self.session.controls().start_enabled {
                    return;
                }
                self.status = match self.session.start() {
                    Ok(()) => "Recording".into(),
                    Err(e) => format!("Could not start: {e}"),
                };
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                if self.session.controls().stop_enabled {
                    self.session.stop();
                    self.status = "Stopping".into();
                }
            }
            KeyCode::Char('w') | KeyCode::Char('W') => {
                self.status = match self.session.save() {
                    Ok(Some(path)) => format!("Saved {}", path.display()),
                    Ok(None) => "Nothing to save yet".into(),
                    Err(e) => {
                        log::error!("Error saving recording: {e:#}");
                        format!("Save failed: {e}")
                    }
                };
            }
            KeyCode::Up => {
                let v = self.pitch.nudge(1.0);
                self.session.set_pitch(v);
            }
            KeyCode::Down => {
                let v = self.pitch.nudge(-1.0);
                self.session.set_pitch(v);
            }
            KeyCode::Right => {
                let v = self.distortion.nudge(1.0);
                self.session.set_distortion(Some(v));
            }
            KeyCode::Left => {
                let v = self.distortion.nudge(-1.0);
                self.session.set_distortion(Some(v));
            }
            _ => {}
        }
    }

    /// Advance the session and redraw one frame.
    pub fn run_tick(&mut self) -> Result<(), anyhow::Error> {
        if self.session.poll() {
            self.status = "Recording ready: [W] to save".into();
        }
        self.session.frame();

        self.draw_buffer.clear();
        MoveTo(0, 0).write_ansi(&mut self.draw_buffer)?;

        let cells = sample_cells(self.session.canvas(), self.cols, self.rows);
        render_ansi(&cells, &mut self.draw_buffer)?;

        self.render_status_line()?;

        let mut stdout = stdout();
        execute!(stdout, BeginSynchronizedUpdate)?;
        stdout.write_all(self.draw_buffer.as_bytes())?;
        execute!(stdout, EndSynchronizedUpdate)?;
        stdout.flush()?;
        Ok(())
    }

    fn render_status_line(&mut self) -> std::fmt::Result {
        Clear(ClearType::UntilNewLine).write_ansi(&mut self.draw_buffer)?;

        let state = match self.session.state() {
            SessionState::Idle => "IDLE",
            SessionState::Recording => "REC",
            SessionState::Stopping => "STOPPING",
        };
        let rec = self.session.record_time().as_secs();
        write!(
            self.draw_buffer,
            "[{state}] {:02}:{:02} | pitch {:.1} | distortion {:.0} | {}",
            rec / 60,
            rec % 60,
            self.pitch.value,
            self.distortion.value,
            self.status
        )?;
        let dropped = self.session.dropped_samples();
        if dropped > 0 {
            write!(self.draw_buffer, " | dropped {dropped}")?;
        }

        let controls = self.session.controls();
        write!(self.draw_buffer, "\x1b[K\r\n")?;
        Clear(ClearType::UntilNewLine).write_ansi(&mut self.draw_buffer)?;
        write!(
            self.draw_buffer,
            "{}{}{}[Up/Down] pitch  [Left/Right] distortion  [Q] quit",
            if controls.start_enabled { "[R] start  " } else { "" },
            if controls.stop_enabled { "[S] stop  " } else { "" },
            if controls.save_visible { "[W] save  " } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_clamps_to_range() {
        let mut s = Slider {
            value: 1.9,
            min: 0.0,
            max: 2.0,
            step: 0.1,
        };
        assert_eq!(s.nudge(5.0), 2.0);
        assert!((s.nudge(-3.0) - 1.7).abs() < 1e-6);
        assert_eq!(s.nudge(-100.0), 0.0);
    }
}
