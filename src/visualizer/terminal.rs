// src/visualizer/terminal.rs

use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::Command;
use std::fmt::Write as FmtWrite;

use super::{Canvas, Rgb};

/// Downsample the canvas into `cols x rows` character cells. A cell takes the
/// reddest colour found in its block of pixels, or stays empty.
pub fn sample_cells(canvas: &Canvas, cols: usize, rows: usize) -> Vec<Vec<Option<Rgb>>> {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let mut cells = vec![vec![None; cols]; rows];

    for (row, line) in cells.iter_mut().enumerate() {
        let y0 = row * canvas.height() / rows;
        let y1 = ((row + 1) * canvas.height() / rows).max(y0 + 1);
        for (col, cell) in line.iter_mut().enumerate() {
            let x0 = col * canvas.width() / cols;
            let x1 = ((col + 1) * canvas.width() / cols).max(x0 + 1);

            let mut best: Option<Rgb> = None;
            for y in y0..y1 {
                for x in x0..x1 {
                    if let Some(px) = canvas.pixel(x, y) {
                        if best.is_none_or(|b| px.0 > b.0) {
                            best = Some(px);
                        }
                    }
                }
            }
            *cell = best;
        }
    }
    cells
}

/// Plain text rendering, one string per row.
pub fn render_ascii(cells: &[Vec<Option<Rgb>>]) -> Vec<String> {
    cells
        .iter()
        .map(|row| row.iter().map(|c| if c.is_some() { '█' } else { ' ' }).collect())
        .collect()
}

/// Coloured rendering with ANSI escapes, appended to `out`. Each row ends
/// with a colour reset and a newline.
pub fn render_ansi(cells: &[Vec<Option<Rgb>>], out: &mut String) -> std::fmt::Result {
    for row in cells {
        let mut current: Option<Rgb> = None;
        for cell in row {
            match cell {
                Some(rgb) => {
                    if current != Some(*rgb) {
                        SetForegroundColor(Color::Rgb {
                            r: rgb.0,
                            g: rgb.1,
                            b: rgb.2,
                        })
                        .write_ansi(out)?;
                        current = Some(*rgb);
                    }
                    out.push('█');
                }
                None => out.push(' '),
            }
        }
        ResetColor.write_ansi(out)?;
        write!(out, "\x1b[K\r\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsamples_bars_into_cells() {
        let mut canvas = Canvas::new(8, 4);
        canvas.fill_rect(0.0, 2.0, 2.0, 2.0, Rgb(200, 50, 50));
        let cells = sample_cells(&canvas, 4, 2);
        let lines = render_ascii(&cells);
        assert_eq!(lines, vec!["    ".to_string(), "█   ".to_string()]);
    }

    #[test]
    fn ansi_output_has_one_line_per_row() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb(255, 50, 50));
        let cells = sample_cells(&canvas, 4, 3);
        let mut out = String::new();
        render_ansi(&cells, &mut out).unwrap();
        assert_eq!(out.matches("\r\n").count(), 3);
        assert_eq!(out.matches('█').count(), 12);
    }
}
