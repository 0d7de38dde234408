//! Human-readable rendering for the `list`, `get` and `call` subcommands.
//!
//! Everything here returns strings; callers decide where to print. JSON output paths
//! never go through these helpers. `NO_COLOR` disables ANSI, `NO_EMOJI` drops glyphs,
//! `COLUMNS` (clamped 40..=220, default 100) bounds table width.

use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
    pub term_width: usize,
}

impl StyleOptions {
    pub fn detect() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(100);
        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
            term_width: width,
        }
    }

    /// No color, no emoji, fixed width.
    #[cfg(test)]
    pub fn plain(term_width: usize) -> Self {
        StyleOptions {
            use_color: false,
            use_emoji: false,
            term_width,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Warning,
    Error,
    Dim,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",
        Role::Secondary => "38;5;250",
        Role::Accent => "38;5;213",
        Role::Warning => "38;5;214",
        Role::Error => "38;5;196",
        Role::Dim => "2",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "success" => "✔",
        "error" => "✖",
        "warn" => "⚠",
        "info" => "ℹ",
        "tool" => "🛠",
        "list" => "📜",
        _ => "",
    }
}

/// Single-line title (plus optional dim subtitle) framed in a light box.
pub fn box_header(
    title: impl AsRef<str>,
    subtitle: Option<impl AsRef<str>>,
    style: &StyleOptions,
) -> String {
    let mut inner = color(Role::Primary, title.as_ref(), style);
    if let Some(sub) = subtitle {
        inner.push_str("  ");
        inner.push_str(&color(Role::Secondary, sub.as_ref(), style));
    }
    let max_inner = style.term_width.saturating_sub(4).max(16);
    let inner = if display_width(&inner) > max_inner {
        truncate_ellipsis(&strip_ansi(&inner), max_inner)
    } else {
        inner
    };
    let width = display_width(&inner) + 2;
    let rule = "─".repeat(width);
    format!(
        "┌{rule}┐\n│ {inner}{pad} │\n└{rule}┘",
        pad = " ".repeat(width - 2 - display_width(&inner))
    )
}

#[derive(Debug, Clone)]
pub struct TableOpts {
    /// 0 means the terminal width.
    pub max_width: usize,
    pub header_sep: bool,
    pub min_col_width: usize,
}

impl Default for TableOpts {
    fn default() -> Self {
        TableOpts {
            max_width: 0,
            header_sep: true,
            min_col_width: 4,
        }
    }
}

/// Column-aligned table. Over-wide tables shrink their widest columns first and
/// truncated cells end with an ellipsis.
pub fn table(
    headers: &[&str],
    rows: &[Vec<String>],
    opts: TableOpts,
    style: &StyleOptions,
) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let cols = headers.len();
    let limit = match opts.max_width {
        0 => style.term_width,
        w => w.min(style.term_width),
    };

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let gaps = (cols - 1) * 2;
    let mut total: usize = widths.iter().sum::<usize>() + gaps;
    while total > limit {
        let Some((idx, w)) = widths
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, w)| *w)
        else {
            break;
        };
        if w <= opts.min_col_width {
            break;
        }
        let shrink = (w - opts.min_col_width).min(total - limit);
        widths[idx] -= shrink;
        total -= shrink;
    }

    let render_row = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| fit(c, widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header = render_row(headers.iter().map(|h| h.to_string()).collect());
    lines.push(color(Role::Accent, header, style));
    if opts.header_sep {
        let sep = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(color(Role::Dim, sep, style));
    }
    for row in rows {
        let cells = (0..cols)
            .map(|c| row.get(c).cloned().unwrap_or_default())
            .collect();
        lines.push(render_row(cells));
    }
    lines.join("\n")
}

fn fit(s: &str, width: usize) -> String {
    let len = display_width(s);
    if len > width {
        return truncate_ellipsis(&strip_ansi(s), width);
    }
    format!("{s}{}", " ".repeat(width - len))
}

pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return "…".repeat(max_chars);
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

/// Drop `ESC [ ... <letter>` sequences.
fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

fn display_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_box_is_three_lines() {
        let b = box_header("Operations (25)", Some("support + clarify"), &StyleOptions::plain(80));
        let lines: Vec<&str> = b.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Operations (25)  support + clarify"));
        assert_eq!(
            lines[0].chars().count(),
            lines[1].chars().count(),
            "borders align"
        );
    }

    #[test]
    fn table_aligns_columns() {
        let t = table(
            &["NAME", "FAMILY"],
            &[
                vec!["grep".into(), "support".into()],
                vec!["detect_conflicts".into(), "clarify".into()],
            ],
            TableOpts::default(),
            &StyleOptions::plain(100),
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "NAME              FAMILY");
        assert_eq!(lines[2], "grep              support");
        assert_eq!(lines[3], "detect_conflicts  clarify");
    }

    #[test]
    fn table_shrinks_widest_column() {
        let long = "x".repeat(80);
        let t = table(
            &["A", "B"],
            &[vec!["short".into(), long]],
            TableOpts::default(),
            &StyleOptions::plain(40),
        );
        assert!(t.lines().all(|l| l.chars().count() <= 40));
        assert!(t.contains('…'));
    }

    #[test]
    fn truncate() {
        assert_eq!(truncate_ellipsis("abcdef", 4), "abc…");
        assert_eq!(truncate_ellipsis("abc", 4), "abc");
    }

    #[test]
    fn ansi_stripped_for_width() {
        let style = StyleOptions {
            use_color: true,
            use_emoji: false,
            term_width: 80,
        };
        let red = color(Role::Error, "RED", &style);
        assert_eq!(strip_ansi(&red), "RED");
        assert_eq!(display_width(&red), 3);
    }
}
