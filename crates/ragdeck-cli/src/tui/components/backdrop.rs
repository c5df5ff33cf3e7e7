//! Animated header banner.
//!
//! A sine wave drawn with block glyphs, shifted one phase step per tick.

use ratatui::text::Line;

const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const PHASE_STEP: f64 = 0.25;
const WAVELENGTH: f64 = 12.0;

#[derive(Debug, Clone, Default)]
pub struct Backdrop {
    phase: f64,
    width: u16,
}

impl Backdrop {
    pub fn advance(&mut self) {
        self.phase = (self.phase + PHASE_STEP) % std::f64::consts::TAU;
    }

    /// Size follows the terminal width.
    pub fn resize(&mut self, width: u16) {
        self.width = width;
    }

    /// Banner rows; each row is offset so the wave appears to roll.
    pub fn lines(&self, height: u16) -> Vec<Line<'static>> {
        (0..height)
            .map(|row| {
                let row_phase = self.phase + row as f64 * 0.8;
                let text: String = (0..self.width)
                    .map(|col| {
                        let t = col as f64 / WAVELENGTH * std::f64::consts::TAU + row_phase;
                        let level = (t.sin() + 1.0) / 2.0 * (GLYPHS.len() - 1) as f64;
                        GLYPHS[(level.round() as usize).min(GLYPHS.len() - 1)]
                    })
                    .collect();
                Line::raw(text)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(backdrop: &Backdrop, height: u16) -> Vec<String> {
        backdrop
            .lines(height)
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_lines_match_size() {
        let mut backdrop = Backdrop::default();
        backdrop.resize(40);
        let rows = text(&backdrop, 2);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.chars().count() == 40));
    }

    #[test]
    fn test_resize_rederives_width() {
        let mut backdrop = Backdrop::default();
        backdrop.resize(10);
        backdrop.resize(3);
        assert_eq!(text(&backdrop, 1)[0].chars().count(), 3);
    }

    #[test]
    fn test_advance_moves_wave() {
        let mut backdrop = Backdrop::default();
        backdrop.resize(24);
        let before = text(&backdrop, 1);
        backdrop.advance();
        assert_ne!(before, text(&backdrop, 1));
    }

    #[test]
    fn test_zero_size_is_empty() {
        let backdrop = Backdrop::default();
        assert!(text(&backdrop, 0).is_empty());
        assert_eq!(text(&backdrop, 1), vec![String::new()]);
    }
}
