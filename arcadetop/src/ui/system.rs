//! Device vitals from gameData and systemStatus.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::Dashboard;
use crate::ui::theme::{palette, BAD, OK};
use crate::ui::util::{memory, signal_quality, uptime};

pub fn draw_system(f: &mut ratatui::Frame<'_>, area: Rect, d: &Dashboard) {
    let p = palette(d.settings.dark_mode);
    let g = &d.game;
    let label = |s: &'static str| Span::styled(format!("{s:<10}"), Style::default().fg(p.muted));

    let wifi = if g.wifi_signal == 0 {
        "--".to_string()
    } else {
        format!("{} dBm ({})", g.wifi_signal, signal_quality(g.wifi_signal))
    };
    let (link, link_c) = if g.arduino_connected {
        ("connected", OK)
    } else {
        ("offline", BAD)
    };
    let lines = vec![
        Line::from(vec![label("WiFi"), Span::raw(wifi)]),
        Line::from(vec![label("Uptime"), Span::raw(uptime(g.uptime_ms))]),
        Line::from(vec![label("Memory"), Span::raw(memory(g.free_memory))]),
        Line::from(vec![label("Console"), Span::styled(link, Style::default().fg(link_c))]),
        Line::from(vec![
            label("Samples"),
            Span::raw(format!("{} / {}", d.history.len(), d.history.capacity())),
        ]),
    ];
    let para = Paragraph::new(lines)
        .style(Style::default().fg(p.fg))
        .block(Block::default().borders(Borders::ALL).title("System"));
    f.render_widget(para, area);
}
