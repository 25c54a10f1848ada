//! LED strip panel: colour swatch, brightness, mode, sync.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::led::{hex_to_rgb, LedController};

fn swatch(hex: &str) -> Color {
    hex_to_rgb(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::White)
}

pub fn draw_led(f: &mut ratatui::Frame<'_>, area: Rect, led: &LedController) {
    let power = if led.is_on { "ON" } else { "OFF" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("LED Control [{power}]"));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let color = swatch(&led.color);
    let info = Line::from(vec![
        Span::styled("■■■ ", Style::default().fg(color)),
        Span::raw(format!("{}  mode: {:?}", led.color, led.mode)),
        Span::raw(if led.game_sync { "  sync: game" } else { "" }),
    ]);
    f.render_widget(Paragraph::new(info), rows[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(if led.is_on { color } else { Color::DarkGray }))
        .percent(led.brightness_pct().min(100))
        .label(format!("brightness {}%", led.brightness_pct()));
    f.render_widget(gauge, rows[1]);
}
