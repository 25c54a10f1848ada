//! Small UI helpers: signal quality, uptime, memory, game names, truncation.

pub fn signal_quality(rssi: i64) -> &'static str {
    match rssi {
        0 => "Unknown",
        r if r > -50 => "Excellent",
        r if r > -60 => "Good",
        r if r > -70 => "Fair",
        _ => "Poor",
    }
}

pub fn uptime(ms: u64) -> String {
    if ms == 0 {
        return "0s".into();
    }
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    if days > 0 { return format!("{days}d {}h", hours % 24); }
    if hours > 0 { return format!("{hours}h {}m", minutes % 60); }
    if minutes > 0 { return format!("{minutes}m {}s", seconds % 60); }
    format!("{seconds}s")
}

pub fn memory(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".into();
    }
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 { return format!("{kb:.1} KB"); }
    format!("{:.1} MB", kb / 1024.0)
}

pub fn game_name(game: &str) -> &'static str {
    match game {
        "menu" => "Main Menu",
        "ufo" => "UFO Attack",
        "snake" => "Snake Game",
        "flappy" => "Flappy Bird",
        "pong" => "Pong",
        _ => "Unknown",
    }
}

pub fn rank_icon(rank: usize) -> &'static str {
    match rank {
        1 => "🥇",
        2 => "🥈",
        3 => "🥉",
        _ => "  ",
    }
}

/// 1234567 -> "1,234,567"
pub fn grouped(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max { return s.to_string(); }
    if max <= 3 { return "...".into(); }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(n - right).collect();
    format!("{head}...{tail}")
}
