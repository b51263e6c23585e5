//! Rendering helpers: elapsed-time ladder, size units, and East-Asian-wide
//! aware column truncation/padding so the table stays fixed-width even with
//! CJK file names.

use unicode_width::UnicodeWidthStr;

/// `MM:SS` under an hour, `H:MM:SS` under 72h, `N days` under 90d,
/// `N months` beyond that.
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let elapsed_ms = elapsed_ms.max(0);
    let total_secs = elapsed_ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;

    if total_secs < 3600 {
        format!("{minutes:02}:{seconds:02}")
    } else if total_secs < 259_200 {
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else if total_secs < 86_400 * 90 {
        let days = total_secs / 86_400;
        format!("{days} day{}", if days == 1 { "" } else { "s" })
    } else {
        let months = total_secs / (86_400 * 30);
        format!("{months} month{}", if months == 1 { "" } else { "s" })
    }
}

/// `B` under 1024, then `K`/`M`/`G`, one decimal place above `B`.
pub fn format_size(size_bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let size = size_bytes as f64;
    if size_bytes < 1024 {
        format!("{size_bytes}B")
    } else if size < MIB {
        format!("{:.1}K", size / KIB)
    } else if size < GIB {
        format!("{:.1}M", size / MIB)
    } else {
        format!("{:.1}G", size / GIB)
    }
}

/// Truncate `s` to fit `width` display columns (not byte or char count),
/// appending `…` when truncated, then pad with spaces to exactly `width`
/// columns. East-Asian wide characters count as 2 columns, matching
/// `unicode-width`'s notion of terminal cell width.
pub fn truncate_and_pad(s: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let display_width = UnicodeWidthStr::width(s);
    if display_width <= width {
        let mut out = s.to_string();
        out.push_str(&" ".repeat(width - display_width));
        return out;
    }

    let ellipsis_width = 1;
    let budget = width.saturating_sub(ellipsis_width);
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthStr::width(ch.encode_utf8(&mut [0u8; 4]) as &str);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += ellipsis_width;
    if used < width {
        out.push_str(&" ".repeat(width - used));
    }
    out
}
