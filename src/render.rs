use std::fmt::Write;

use colored::{ColoredString, Colorize};
use unicode_truncate::UnicodeTruncateStr;

use crate::classify::{Band, Tone};
use crate::report::Report;

const LABEL_WIDTH: usize = 18;

/// Pads or cuts `input` to exactly `width` columns, marking cut text with an ellipsis.
/// Padding counts display columns, so wide characters keep the table aligned.
pub fn to_fixed_width(input: &str, width: usize) -> String {
    let (_, columns) = input.unicode_truncate(usize::MAX);
    if columns > width && width > 0 {
        let (truncated, used) = input.unicode_truncate(width - 1);
        return format!("{truncated}…{}", " ".repeat(width - 1 - used));
    }
    let (fitted, used) = input.unicode_truncate(width);
    format!("{fitted}{}", " ".repeat(width - used))
}

fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Plain => text.normal(),
        Tone::Teal => text.white().on_cyan(),
        Tone::Green => text.white().on_green(),
        Tone::Yellow => text.black().on_yellow(),
        Tone::Red => text.white().on_bright_red(),
        Tone::Crimson => text.white().on_red(),
        Tone::Maroon => text.white().on_truecolor(128, 0, 0),
        Tone::Gray => text.black().on_white(),
    }
}

fn cell(value: f64, band: Band) -> ColoredString {
    paint(&format!("{value:.3}"), band.tone())
}

/// Renders the report as the classic box drawn table, followed by the error list.
pub fn render_table(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "    ┌─────────┬───────┬───────┬───────┬────────────────────┐");
    let _ = writeln!(out, "    │ Server  │ Conn  │ TTFB  │ TTL   │ Location           │");
    let _ = writeln!(out, "┌───┼─────────┼───────┼───────┼───────┼────────────────────┤");

    for row in &report.rows {
        let icon = if row.succeeded {
            "✔".green()
        } else {
            "✘".red()
        };

        let _ = writeln!(
            out,
            "│ {} │ {} │ {} │ {} │ {} │ {} │",
            icon,
            to_fixed_width(&row.vantage_id, 7).as_str().dimmed(),
            cell(row.connect_time, row.bands.connect),
            cell(row.first_byte_time, row.bands.first_byte),
            cell(row.total_time, row.bands.total),
            to_fixed_width(&row.label, LABEL_WIDTH),
        );
    }

    let summary = &report.summary;
    let grade = paint(
        &format!(" Performance: {} ", to_fixed_width(summary.grade.as_str(), 3)),
        summary.grade.tone(),
    );

    let _ = writeln!(out, "└───┼─────────┼───────┼───────┼───────┼────────────────────┤");
    let _ = writeln!(
        out,
        "    │ Average │ {:.3} │ {:.3} │ {:.3} │ {} │",
        summary.avg_connect, summary.avg_first_byte, summary.avg_total, grade
    );
    let _ = writeln!(out, "    └─────────┴───────┴───────┴───────┴────────────────────┘");

    for failure in report.errors.iter() {
        let _ = writeln!(out, "{} {}", "•".bright_blue(), failure.cause);
    }

    out
}
