//! Shared UI colours. Dark mode swaps the neutral tones only.

use ratatui::style::Color;

pub const UFO: Color = Color::Rgb(255, 107, 107);
pub const SNAKE: Color = Color::Rgb(76, 175, 80);
pub const FLAPPY: Color = Color::Rgb(255, 184, 108);
pub const PONG: Color = Color::Rgb(108, 99, 255);
pub const MENU: Color = Color::Rgb(33, 150, 243);

pub const PLAYING: Color = Color::Green;
pub const OK: Color = Color::Green;
pub const BAD: Color = Color::Red;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
}

pub fn palette(dark: bool) -> Palette {
    if dark {
        Palette {
            fg: Color::Gray,
            muted: Color::DarkGray,
            accent: Color::Cyan,
        }
    } else {
        Palette {
            fg: Color::White,
            muted: Color::Gray,
            accent: Color::LightCyan,
        }
    }
}

pub fn game_color(game: &str) -> Color {
    match game {
        "ufo" => UFO,
        "snake" => SNAKE,
        "flappy" => FLAPPY,
        "pong" => PONG,
        _ => MENU,
    }
}
