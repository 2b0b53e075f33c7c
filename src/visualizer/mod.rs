// src/visualizer/mod.rs

pub mod terminal;

use std::sync::Mutex;

use crate::analyzer::AnalyserNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A small RGB drawing surface. `None` pixels are cleared (transparent).
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Option<Rgb>>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            None
        }
    }

    pub fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.paint(x, y, w, h, None);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.paint(x, y, w, h, Some(color));
    }

    // Rectangles are clipped to the surface; edges round to the nearest pixel.
    fn paint(&mut self, x: f32, y: f32, w: f32, h: f32, value: Option<Rgb>) {
        let (x0, x1) = span(x, w, self.width);
        let (y0, y1) = span(y, h, self.height);
        for row in y0..y1 {
            let base = row * self.width;
            self.pixels[base + x0..base + x1].fill(value);
        }
    }
}

fn span(start: f32, len: f32, limit: usize) -> (usize, usize) {
    let (a, b) = if len < 0.0 { (start + len, start) } else { (start, start + len) };
    let lo = a.round().clamp(0.0, limit as f32) as usize;
    let hi = b.round().clamp(0.0, limit as f32) as usize;
    (lo, hi.max(lo))
}

/// Bar colour for a byte magnitude: reddens as the bin gets louder.
pub fn bar_color(magnitude: u8) -> Rgb {
    Rgb(magnitude.saturating_add(100), 50, 50)
}

/// Draw one bar per bin, left to right, anchored to the bottom edge.
/// Returns how many bars started inside the canvas.
pub fn draw_spectrum(canvas: &mut Canvas, data: &[u8]) -> usize {
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    canvas.clear_rect(0.0, 0.0, w, h);

    if data.is_empty() {
        return 0;
    }

    let bar_width = (w / data.len() as f32) * 2.5;
    let mut x = 0.0f32;
    let mut visible = 0;

    for &magnitude in data {
        let bar_height = magnitude as f32 / 2.0;
        canvas.fill_rect(x, h - bar_height, bar_width, bar_height, bar_color(magnitude));
        if x < w {
            visible += 1;
        }
        x += bar_width + 1.0;
    }
    visible
}

/// Identifies one started draw loop; cancelling needs the same handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// The per-frame draw loop. The host (UI loop) calls [`AnimationLoop::tick`]
/// once per frame; nothing happens unless a loop has been started.
pub struct AnimationLoop {
    next_id: u64,
    active: Option<FrameHandle>,
    data: Vec<u8>,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            active: None,
            data: Vec::new(),
        }
    }

    pub fn start(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.active = Some(handle);
        handle
    }

    /// Cancel the loop identified by `handle`. A stale handle does nothing.
    pub fn cancel(&mut self, handle: FrameHandle) {
        if self.active == Some(handle) {
            self.active = None;
        }
    }

    pub fn active(&self) -> Option<FrameHandle> {
        self.active
    }

    /// One animation frame. Skips when the loop is not running or there is no
    /// analyser; returns whether the canvas was redrawn.
    pub fn tick(&mut self, analyser: Option<&Mutex<AnalyserNode>>, canvas: &mut Canvas) -> bool {
        if self.active.is_none() {
            return false;
        }
        let Some(analyser) = analyser else {
            return false;
        };
        // A poisoned analyser just skips this frame.
        let Ok(mut node) = analyser.lock() else {
            return false;
        };

        let bins = node.frequency_bin_count();
        if self.data.len() != bins {
            self.data.resize(bins, 0);
        }
        node.get_byte_frequency_data(&mut self.data);
        drop(node);

        draw_spectrum(canvas, &self.data);
        true
    }
}

impl Default for AnimationLoop {
    fn default() -> Self {
        Self::new()
    }
}
