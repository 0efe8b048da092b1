use chrono::NaiveDateTime;

use crate::core::Diagnostic;

pub const REPORT_FILENAME: &str = "playback_check.txt";

/// Renders the playback check report for a whole run.
pub fn assemble(diagnostics: &[Diagnostic], generated_at: NaiveDateTime) -> String {
    let rule = "-".repeat(50);
    let mut lines: Vec<String> = vec![
        "[Playback Check Report]".to_string(),
        format!("Checked at: {}", generated_at.format("%Y/%m/%d %H:%M")),
        format!("\n{}", rule),
        "⚠️ Needs review (not playable, etc.)".to_string(),
        format!("{}\n", rule),
    ];

    if diagnostics.is_empty() {
        lines.push("(None found. All videos were confirmed successfully.)\n".to_string());
    } else {
        for d in diagnostics {
            lines.push(format!("[{}] {} {}", d.sheet, d.entry_number, d.entry_name));
            lines.push(format!("Status: {}", d.reason));
            lines.push(format!("URL : {}", d.url));
            lines.push(format!("Email: {}", d.email));
            lines.push(String::new());
        }
    }

    lines.push(format!("\n{}", rule));
    lines.push("✅ Check complete".to_string());
    lines.push(rule);
    lines.push("All other videos had their durations retrieved successfully.".to_string());

    lines.join("\n")
}

/// One `[dept] name: reason` line per diagnostic, for the console.
pub fn preview_lines(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .map(|d| format!("[{}] {}: {}", d.sheet, d.entry_name, d.reason))
        .collect()
}
