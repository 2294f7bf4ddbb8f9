use crate::theme::AccentColor;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

pub const TITLE: &str = "AI Assistant";

/// Title bar with the accent swatches
pub struct Header {
    accent: AccentColor,
}

impl Header {
    pub fn new(accent: AccentColor) -> Self {
        Self { accent }
    }

    fn title_line(&self) -> Line<'static> {
        Line::from(vec![
            Span::styled(" ✦ ", Style::default().fg(self.accent.color())),
            Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD)),
        ])
    }

    fn swatch_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for color in AccentColor::all() {
            let style = Style::default().fg(color.color());
            if color == self.accent {
                spans.push(Span::styled("(", Style::default().fg(Color::Gray)));
                spans.push(Span::styled("●", style.add_modifier(Modifier::BOLD)));
                spans.push(Span::styled(")", Style::default().fg(Color::Gray)));
            } else {
                spans.push(Span::styled(" ● ", style));
            }
        }
        spans.push(Span::raw(" "));
        Line::from(spans)
    }
}

impl Widget for Header {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = self.title_line();
        buf.set_line(area.x, area.y, &title, area.width);

        let swatches = self.swatch_line();
        let width = swatches.width() as u16;
        if width < area.width.saturating_sub(title.width() as u16) {
            buf.set_line(area.x + area.width - width, area.y, &swatches, width);
        }
    }
}
