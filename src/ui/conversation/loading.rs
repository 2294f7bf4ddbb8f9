use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const DOT: &str = "●";
const FRAME_MILLIS: u128 = 300;

/// Pulsing three-dot placeholder shown while a reply is pending
#[derive(Debug, Clone, Copy)]
pub struct LoadingIndicator {
    accent: Color,
}

impl LoadingIndicator {
    pub fn new(accent: Color) -> Self {
        Self { accent }
    }

    /// Which dot is lit after `elapsed_millis`
    pub fn phase(elapsed_millis: u128) -> usize {
        ((elapsed_millis / FRAME_MILLIS) % 3) as usize
    }

    pub fn line(&self, elapsed_millis: u128) -> Line<'static> {
        let lit = Self::phase(elapsed_millis);
        let mut spans = vec![Span::raw("  ")];
        for i in 0..3 {
            let style = if i == lit {
                Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.accent).add_modifier(Modifier::DIM)
            };
            spans.push(Span::styled(DOT, style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }
}
