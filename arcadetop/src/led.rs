//! RGB LED state mirrored from the panel, and the frames that drive it.

use crate::types::{LedCommand, LedMode, Outbound};

pub const COLOR_PALETTE: [&str; 6] = [
    "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff", "#ffffff",
];

const BRIGHTNESS_STEP: u8 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct LedController {
    pub color: String,
    pub brightness: u8,
    pub mode: LedMode,
    pub is_on: bool,
    pub game_sync: bool,
}

impl Default for LedController {
    fn default() -> Self {
        Self {
            color: "#ff0000".into(),
            brightness: 255,
            mode: LedMode::Solid,
            is_on: false,
            game_sync: false,
        }
    }
}

/// Parse `#rrggbb` (the `#` is optional, hex digits in either case).
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.strip_prefix('#').unwrap_or(hex);
    if h.len() != 6 || !h.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&h[0..2], 16).ok()?;
    let g = u8::from_str_radix(&h[2..4], 16).ok()?;
    let b = u8::from_str_radix(&h[4..6], 16).ok()?;
    Some((r, g, b))
}

pub fn game_color(game: &str) -> &'static str {
    match game {
        "flappy" => "#FFB86C",
        "snake" => "#4CAF50",
        "pong" => "#6C63FF",
        "menu" => "#FF6584",
        "ufo" => "#FF6B6B",
        _ => "#FFFFFF",
    }
}

impl LedController {
    pub fn toggle_power(&mut self) -> Outbound {
        self.is_on = !self.is_on;
        self.frame()
    }

    pub fn brighter(&mut self) -> Outbound {
        self.brightness = self.brightness.saturating_add(BRIGHTNESS_STEP);
        self.frame()
    }

    pub fn dimmer(&mut self) -> Outbound {
        self.brightness = self.brightness.saturating_sub(BRIGHTNESS_STEP);
        self.frame()
    }

    pub fn set_mode(&mut self, mode: LedMode) -> Outbound {
        self.mode = mode;
        self.game_sync = mode == LedMode::Game;
        self.frame()
    }

    pub fn cycle_mode(&mut self) -> Outbound {
        let next = match self.mode {
            LedMode::Solid => LedMode::Blink,
            LedMode::Blink => LedMode::Fade,
            LedMode::Fade => LedMode::Rainbow,
            LedMode::Rainbow => LedMode::Game,
            LedMode::Game => LedMode::Solid,
        };
        self.set_mode(next)
    }

    pub fn cycle_color(&mut self) -> Outbound {
        let pos = COLOR_PALETTE
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&self.color));
        let next = pos.map_or(0, |i| (i + 1) % COLOR_PALETTE.len());
        self.color = COLOR_PALETTE[next].to_string();
        self.frame()
    }

    /// Follow the running game's colour. Returns a frame only when it changed.
    pub fn sync_to_game(&mut self, current_game: &str) -> Option<Outbound> {
        if !self.game_sync || !self.is_on {
            return None;
        }
        let c = game_color(current_game);
        if self.color.eq_ignore_ascii_case(c) {
            return None;
        }
        self.color = c.to_string();
        Some(self.frame())
    }

    pub fn brightness_pct(&self) -> u16 {
        ((self.brightness as f64 / 255.0) * 100.0).round() as u16
    }

    pub fn frame(&self) -> Outbound {
        let (r, g, b) = hex_to_rgb(&self.color).unwrap_or((0, 0, 0));
        Outbound::LedControl(LedCommand {
            r,
            g,
            b,
            brightness: self.brightness,
            mode: self.mode,
            is_on: self.is_on,
            game_sync: self.game_sync,
        })
    }
}
