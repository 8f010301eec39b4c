//! Horizontal meter widget for ratatui

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

/// A labeled horizontal bar showing a value within a range
pub struct Meter<'a> {
    label: &'a str,
    value: f64,
    min: f64,
    max: f64,
    /// Optional marker drawn at a second value (e.g. the ramp target)
    marker: Option<f64>,
    style: Style,
    block: Option<Block<'a>>,
}

impl<'a> Meter<'a> {
    pub fn new(label: &'a str, value: f64, min: f64, max: f64) -> Self {
        Self {
            label,
            value,
            min,
            max,
            marker: None,
            style: Style::default(),
            block: None,
        }
    }

    pub fn marker(mut self, value: f64) -> Self {
        self.marker = Some(value);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Fraction of the bar a value fills
    fn ratio(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    fn render_meter(&self, area: Rect, buf: &mut Buffer) {
        if area.width < 4 || area.height == 0 {
            return;
        }

        let label = format!("{:>9} ", self.label);
        let label_width = label.len() as u16;
        buf.set_string(area.x, area.y, &label, self.style);

        if area.width <= label_width + 2 {
            return;
        }
        let bar_width = (area.width - label_width - 1) as usize;
        let filled = (self.ratio(self.value) * bar_width as f64).round() as usize;

        let mut bar: Vec<char> = (0..bar_width)
            .map(|i| if i < filled { '█' } else { '·' })
            .collect();

        if let Some(marker) = self.marker {
            let pos = (self.ratio(marker) * (bar_width.saturating_sub(1)) as f64).round() as usize;
            if pos < bar.len() {
                bar[pos] = '│';
            }
        }

        let bar_string: String = bar.into_iter().collect();
        buf.set_string(area.x + label_width, area.y, &bar_string, self.style);
    }
}

impl<'a> Widget for Meter<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let meter_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        self.render_meter(meter_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_clamps() {
        let meter = Meter::new("gain", 0.5, 0.0, 1.0);
        assert_eq!(meter.ratio(-1.0), 0.0);
        assert_eq!(meter.ratio(0.5), 0.5);
        assert_eq!(meter.ratio(2.0), 1.0);
    }

    #[test]
    fn test_ratio_degenerate_range() {
        let meter = Meter::new("gain", 0.5, 1.0, 1.0);
        assert_eq!(meter.ratio(0.5), 0.0);
    }

    #[test]
    fn test_render_into_buffer() {
        let meter = Meter::new("angle", 90.0, 0.0, 180.0);
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        meter.render(area, &mut buf);

        let row: String = (0..40)
            .map(|x| buf[(x, 0)].symbol().chars().next().unwrap())
            .collect();
        assert!(row.contains("angle"));
        assert!(row.contains('█'));
        assert!(row.contains('·'));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let meter = Meter::new("v", 1.0, 0.0, 1.0);
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        meter.render(area, &mut buf);
    }
}
