//! One card per game: score, secondary stats, and a progress gauge.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::types::GameData;
use crate::ui::theme::{FLAPPY, PLAYING, PONG, SNAKE, UFO};
use crate::ui::util::grouped;

struct Card {
    key: &'static str,
    title: &'static str,
    color: Color,
    score: i64,
    stats: String,
    progress: Option<(u16, String)>,
}

/// Kills toward the next level, out of ten.
pub fn ufo_progress(kills: i64) -> u16 {
    (kills.rem_euclid(10) * 10) as u16
}

/// Length toward the 15-segment full snake.
pub fn snake_progress(length: i64) -> u16 {
    ((length.max(0) as f64 / 15.0) * 100.0).min(100.0) as u16
}

fn cards(g: &GameData) -> [Card; 4] {
    [
        Card {
            key: "ufo",
            title: "UFO Attack",
            color: UFO,
            score: g.ufo_score,
            stats: format!("lvl {}  lives {}  kills {}", g.ufo_level, g.ufo_lives, g.ufo_kills),
            progress: Some((ufo_progress(g.ufo_kills), format!("{}/10", g.ufo_kills.rem_euclid(10)))),
        },
        Card {
            key: "snake",
            title: "Snake",
            color: SNAKE,
            score: g.snake_score,
            stats: format!("len {}  speed {}  food {}", g.snake_length, g.snake_speed, g.snake_food),
            progress: Some((snake_progress(g.snake_length), format!("{}/15", g.snake_length))),
        },
        Card {
            key: "flappy",
            title: "Flappy Bird",
            color: FLAPPY,
            score: g.flappy_score,
            stats: format!("best {}", grouped(g.flappy_high.max(0) as u64)),
            progress: None,
        },
        Card {
            key: "pong",
            title: "Pong",
            color: PONG,
            score: g.pong_score,
            stats: format!("best {}", grouped(g.pong_high.max(0) as u64)),
            progress: None,
        },
    ]
}

pub fn draw_games(f: &mut ratatui::Frame<'_>, area: Rect, g: &GameData) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (card, col) in cards(g).into_iter().zip(cols.iter().copied()) {
        let playing = g.current_game == card.key;
        let status = if playing {
            Span::styled(" ▶ Playing ", Style::default().fg(PLAYING).add_modifier(Modifier::BOLD))
        } else {
            Span::styled(" Idle ", Style::default().fg(Color::DarkGray))
        };
        let border = if playing {
            Style::default().fg(card.color)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(Line::from(vec![
                Span::styled(card.title, Style::default().fg(card.color)),
                status,
            ]));
        let inner = block.inner(col);
        f.render_widget(block, col);
        if inner.height == 0 {
            continue;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        let score = Paragraph::new(Line::from(Span::styled(
            grouped(card.score.max(0) as u64),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        f.render_widget(score, rows[0]);
        f.render_widget(
            Paragraph::new(card.stats).style(Style::default().fg(Color::Gray)),
            rows[1],
        );
        if let Some((pct, label)) = card.progress {
            if rows[2].height > 0 {
                let gauge = Gauge::default()
                    .gauge_style(Style::default().fg(card.color))
                    .percent(pct.min(100))
                    .label(label);
                f.render_widget(gauge, Rect { height: 1, ..rows[2] });
            }
        }
    }
}
