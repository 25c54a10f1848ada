//! Top status line and bottom key/controls line.

use std::time::Instant;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::Dashboard;
use crate::connector::FeedMode;
use crate::ui::theme::{palette, BAD, OK};
use crate::ui::util::game_name;

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, d: &Dashboard) {
    let p = palette(d.settings.dark_mode);
    let (dot, link) = if d.connected {
        (Span::styled("● ", Style::default().fg(OK)), "Connected")
    } else {
        (Span::styled("● ", Style::default().fg(BAD)), "Disconnected")
    };
    let mode = match d.mode {
        FeedMode::Live => "live",
        FeedMode::PollingFallback => "polling",
    };
    let updated = d
        .last_update
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".into());

    let mut spans = vec![
        Span::styled(
            "arcadetop ",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        ),
        dot,
        Span::raw(format!("{link} ({mode}) | ")),
        Span::raw(format!("game: {} | ", game_name(&d.game.current_game))),
        Span::raw(format!("updated: {updated}")),
    ];
    if let Some(online) = d.device_online {
        let (txt, c) = if online { ("up", OK) } else { ("down", BAD) };
        spans.push(Span::raw(" | device: "));
        spans.push(Span::styled(txt, Style::default().fg(c)));
    }
    if let Some(diag) = &d.diagnostic {
        spans.push(Span::styled(format!(" | {diag}"), Style::default().fg(p.muted)));
    }
    spans.push(Span::styled("  (q to quit)", Style::default().fg(p.muted)));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn draw_footer(f: &mut ratatui::Frame<'_>, area: Rect, d: &Dashboard) {
    let p = palette(d.settings.dark_mode);
    let auto = if d.settings.auto_refresh { "on" } else { "off" };
    let line = Line::from(vec![
        Span::styled(
            format!("{:<14}", d.control_status(Instant::now())),
            Style::default().fg(p.accent),
        ),
        Span::styled(
            format!(
                "arrows/space play  m menu  f filter  r reconnect  l/+/-/o/c led  a auto:{auto} [{}ms]  x clear",
                d.settings.refresh_rate
            ),
            Style::default().fg(p.muted),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
