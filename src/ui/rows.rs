use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::app::{EmptyReason, PlanBody, RenderPlan, Row};
use crate::core::heuristic::{Density, Tier};
use crate::core::models::{Account, Classifier, Email, Record};

/// Text for one record at a given density. Detailed rows get several lines,
/// minimal rows exactly one.
pub trait RowText {
    fn row_lines(&self, density: Density) -> Vec<String>;
}

fn short_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

fn human_size(bytes: Option<u64>) -> String {
    match bytes {
        None => "-".into(),
        Some(b) if b < 1024 => format!("{b} B"),
        Some(b) if b < 1024 * 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        Some(b) => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
    }
}

impl RowText for Account {
    fn row_lines(&self, density: Density) -> Vec<String> {
        let unread = self.unread_count.unwrap_or(0);
        match density {
            Density::Minimal => vec![format!("{}  [{}]", self.email, self.status.key())],
            Density::Compact => vec![format!(
                "{}  {}  {}  {} unread",
                self.email,
                self.provider.label(),
                self.status.key(),
                unread
            )],
            Density::Detailed => {
                let mut lines = vec![
                    format!("{}  ({})", self.email, self.provider.label()),
                    format!(
                        "status: {}  sync: {} at {}",
                        self.status.key(),
                        self.sync_status().label(),
                        short_date(self.last_sync_at)
                    ),
                    format!(
                        "{} unread / {} total",
                        unread,
                        self.total_emails.unwrap_or(0)
                    ),
                ];
                if let Some(err) = self.last_sync_error.as_deref().filter(|e| !e.is_empty()) {
                    lines.push(format!("error: {err}"));
                }
                lines
            }
        }
    }
}

impl RowText for Email {
    fn row_lines(&self, density: Density) -> Vec<String> {
        let star = if self.is_starred { "★ " } else { "" };
        let unread = if !self.is_read { "● " } else { "" };
        let clip = if self.has_attachments { " 📎" } else { "" };
        let sender = self.from_name.as_deref().unwrap_or(&self.from_address);
        match density {
            Density::Minimal => vec![format!("{unread}{star}{}", self.subject)],
            Density::Compact => vec![format!(
                "{unread}{star}{sender} — {}{clip}  {}",
                self.subject,
                short_date(self.sent_at)
            )],
            Density::Detailed => {
                let mut lines = vec![
                    format!("{unread}{star}{}{clip}", self.subject),
                    format!(
                        "{} <{}>  {}  {}",
                        sender,
                        self.from_address,
                        short_date(self.sent_at),
                        human_size(self.size_bytes)
                    ),
                ];
                if let Some(snippet) = self.snippet.as_deref().filter(|s| !s.is_empty()) {
                    lines.push(snippet.to_string());
                }
                lines
            }
        }
    }
}

/// Row text with selection and busy markers on the first line.
pub fn row_text<R: RowText>(row: &Row<'_, R>) -> Vec<String> {
    let mark = if row.selected { "[x] " } else { "[ ] " };
    let busy = if row.busy { " …" } else { "" };
    let mut lines = row.record.row_lines(row.density);
    for (i, line) in lines.iter_mut().enumerate() {
        *line = if i == 0 {
            format!("{mark}{line}{busy}")
        } else {
            format!("    {line}")
        };
    }
    lines
}

fn push_rows<R: RowText>(out: &mut String, rows: &[Row<'_, R>], indent: &str) {
    for row in rows {
        for line in row_text(row) {
            let _ = writeln!(out, "{indent}{line}");
        }
    }
}

/// Plain-text rendering of a whole plan, used by the demo binary.
pub fn plan_text<R: Record + RowText>(plan: &RenderPlan<'_, R>) -> String {
    let mut out = String::new();
    let auto = |a: bool| if a { "auto" } else { "pinned" };
    let _ = writeln!(
        out,
        "{} of {} shown | mode {} ({}, suggests {}) | density {} ({}) | {} selected",
        plan.filtered_count,
        plan.total_count,
        plan.view_mode.key(),
        auto(plan.view_mode_auto),
        plan.recommended_view_mode.key(),
        plan.density.key(),
        auto(plan.density_auto),
        plan.selection.selected,
    );
    let stats = &plan.stats;
    let categories: Vec<String> = stats
        .by_category
        .iter()
        .map(|c| format!("{} {}", c.label, c.count))
        .collect();
    let _ = writeln!(
        out,
        "{} active, {} disabled, {} with errors | {}",
        stats.active,
        stats.disabled,
        stats.error,
        categories.join(", ")
    );

    match &plan.body {
        PlanBody::Empty { reason } => {
            let text = match reason {
                EmptyReason::Loading => "Loading...",
                EmptyReason::NoRecords => "Nothing here yet",
                EmptyReason::NoMatches => "No results match the current filters",
            };
            let _ = writeln!(out, "{text}");
        }
        PlanBody::Flat { rows } => push_rows(&mut out, rows, ""),
        PlanBody::Virtualized { range, rows } => {
            let _ = writeln!(
                out,
                "items {}..{} of {:.0}px",
                range.start_index, range.end_index, range.total_extent
            );
            push_rows(&mut out, rows, "");
        }
        PlanBody::Grouped { groups, .. } => {
            for group in groups {
                let errors = if group.error_count > 0 {
                    format!(", {} with errors", group.error_count)
                } else {
                    String::new()
                };
                let _ = writeln!(out, "== {} ({}{errors}) ==", group.label, group.rows.len());
                push_rows(&mut out, &group.rows, "  ");
            }
        }
        PlanBody::Paginated {
            window,
            buttons,
            rows,
        } => {
            push_rows(&mut out, rows, "");
            let range = window
                .item_range()
                .map(|(a, b)| format!("{a}-{b}"))
                .unwrap_or_else(|| "0".into());
            let pages: Vec<String> = buttons
                .iter()
                .map(|&p| {
                    if p == window.page_index {
                        format!("[{p}]")
                    } else {
                        p.to_string()
                    }
                })
                .collect();
            let _ = writeln!(
                out,
                "showing {range} of {} | pages {}",
                window.total_items,
                pages.join(" ")
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures::{account, email};
    use crate::core::models::{AccountStatus, Provider};

    #[test]
    fn density_controls_line_count() {
        let mut acct = account("1", "a@qq.com", Provider::Imap, AccountStatus::Error);
        acct.last_sync_error = Some("auth failed".into());
        assert_eq!(acct.row_lines(Density::Minimal), ["a@qq.com  [error]"]);
        assert_eq!(acct.row_lines(Density::Compact).len(), 1);
        let detailed = acct.row_lines(Density::Detailed);
        assert_eq!(detailed.len(), 4);
        assert_eq!(detailed[3], "error: auth failed");
    }

    #[test]
    fn email_markers() {
        let mut e = email(7, "Invoice", "billing@shop.example");
        e.is_starred = true;
        assert_eq!(e.row_lines(Density::Minimal), ["● ★ Invoice"]);
        e.is_read = true;
        e.from_name = Some("Shop".into());
        e.snippet = Some("Your invoice is ready".into());
        let lines = e.row_lines(Density::Detailed);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Shop <billing@shop.example>"));
    }

    #[test]
    fn row_flags_are_marked() {
        let acct = account("1", "a@x.com", Provider::Gmail, AccountStatus::Active);
        let row = Row {
            record: &acct,
            selected: true,
            busy: true,
            density: Density::Minimal,
        };
        assert_eq!(row_text(&row), ["[x] a@x.com  [active] …"]);
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(human_size(Some(512)), "512 B");
        assert_eq!(human_size(Some(2048)), "2.0 KB");
        assert_eq!(human_size(None), "-");
    }
}
