//! Score trend sparklines and the session distribution bars.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{BarChart, Block, Borders, Paragraph, Sparkline},
};

use crate::app::Dashboard;
use crate::history::HistoryBuffer;
use crate::ui::theme::{game_color, SNAKE, UFO};
use crate::ui::util::game_name;

/// Snapshots shown in the trend chart.
pub const CHART_POINTS: usize = 20;

pub fn draw_score_chart(f: &mut ratatui::Frame<'_>, area: Rect, history: &HistoryBuffer) {
    let title = match history.latest() {
        Some(s) => format!(
            "Scores (last {CHART_POINTS}, newest {})",
            s.captured_at().with_timezone(&Local).format("%H:%M:%S")
        ),
        None => format!("Scores (last {CHART_POINTS})"),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }
    if history.is_empty() {
        f.render_widget(
            Paragraph::new("waiting for game data...").style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    // Both series share one scale so their heights compare.
    let max = history
        .max_field(CHART_POINTS, &["ufoScore", "snakeScore"])
        .max(1.0) as u64;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(inner);

    for (key, title, color, row) in [
        ("ufoScore", "UFO", UFO, rows[0]),
        ("snakeScore", "Snake", SNAKE, rows[1]),
    ] {
        let data = history.series(CHART_POINTS, key);
        let spark = Sparkline::default()
            .block(Block::default().title(format!("{title} {}", data.last().copied().unwrap_or(0))))
            .data(&data)
            .max(max)
            .style(Style::default().fg(color));
        f.render_widget(spark, row);
    }
}

pub fn draw_sessions(f: &mut ratatui::Frame<'_>, area: Rect, d: &Dashboard) {
    let title = format!(
        "Sessions ({} runs, {} samples)",
        d.usage.sessions, d.session_samples
    );
    let block = Block::default().borders(Borders::ALL).title(title);
    let dist = d.usage.distribution();
    if dist.is_empty() {
        f.render_widget(
            Paragraph::new("no play time recorded")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let bars: Vec<(&str, u64)> = dist
        .iter()
        .map(|(g, pct)| (short_name(g), *pct))
        .collect();
    let color = dist
        .first()
        .map(|(g, _)| game_color(g))
        .unwrap_or(Color::Gray);
    let chart = BarChart::default()
        .block(block)
        .data(bars.as_slice())
        .bar_width(6)
        .bar_gap(1)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(Color::Black).bg(color));
    f.render_widget(chart, area);
}

fn short_name(game: &str) -> &'static str {
    match game {
        "ufo" => "UFO",
        "snake" => "Snake",
        "flappy" => "Flappy",
        "pong" => "Pong",
        "menu" => "Menu",
        other => game_name(other),
    }
}
