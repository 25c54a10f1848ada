//! High score table with rank medals and a game filter.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::stats::{best_score, leaderboard, ScoreFilter};
use crate::types::HighScore;
use crate::ui::util::{grouped, rank_icon, truncate_middle};

pub const TABLE_ROWS: usize = 10;

const COLS: [Constraint; 4] = [
    Constraint::Length(5),      // rank
    Constraint::Percentage(40), // player
    Constraint::Percentage(30), // game
    Constraint::Length(10),     // score
];

pub fn draw_high_scores(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    scores: &[HighScore],
    filter: ScoreFilter,
) {
    let block = Block::default().borders(Borders::ALL).title(format!(
        "High Scores [{}] best {}",
        filter.label(),
        grouped(best_score(scores))
    ));
    let rows = leaderboard(scores, filter, TABLE_ROWS);
    if rows.is_empty() {
        f.render_widget(
            Paragraph::new("no scores yet")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let name_w = (area.width as usize * 2 / 5).saturating_sub(2).max(4);
    let body = rows.iter().enumerate().map(|(i, s)| {
        let rank = i + 1;
        let emphasis = if rank == 1 {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(format!("{} {rank}", rank_icon(rank))),
            Cell::from(truncate_middle(&s.player, name_w)),
            Cell::from(s.game.clone()).style(Style::default().fg(Color::Gray)),
            Cell::from(format!("{:>10}", grouped(s.score))).style(Style::default().fg(Color::Yellow)),
        ])
        .style(emphasis)
    });
    let header = Row::new(vec!["#", "Player", "Game", "     Score"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(body, COLS.to_vec())
        .header(header)
        .column_spacing(1)
        .block(block);
    f.render_widget(table, area);
}
