use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use unicode_width::UnicodeWidthStr;

use crate::calendar::{format_month, format_wall_clock, format_week, zero_pad};
use crate::config::Config;
use crate::conflict::Conflict;
use crate::event::Event;
use crate::notify::Notification;

const WEEKDAY_LABELS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, events), fields(count = events.len()))]
    pub fn print_event_table(&mut self, events: &[&Event]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let (headers, rows) = self.event_rows(events);
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn event_rows(&self, events: &[&Event]) -> (Vec<String>, Vec<Vec<String>>) {
        let headers = vec![
            "ID".to_string(),
            "Date".to_string(),
            "Time".to_string(),
            "Title".to_string(),
            "Location".to_string(),
            "Repeat".to_string(),
        ];

        let rows = events
            .iter()
            .map(|event| {
                let repeat = if event.is_recurring() {
                    format!("{}/{}", event.repeat.kind.as_key(), event.repeat.interval)
                } else {
                    String::new()
                };
                vec![
                    self.paint(&event.id, "33"),
                    event.date.format("%Y-%m-%d").to_string(),
                    format!(
                        "{}-{}",
                        format_wall_clock(event.start_time),
                        format_wall_clock(event.end_time)
                    ),
                    event.title.clone(),
                    event.location.clone(),
                    repeat,
                ]
            })
            .collect();

        (headers, rows)
    }

    #[tracing::instrument(skip(self, event), fields(id = %event.id))]
    pub fn print_event_info(&mut self, event: &Event) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id        {}", event.id)?;
        writeln!(out, "title     {}", event.title)?;
        writeln!(out, "date      {}", event.date.format("%Y-%m-%d"))?;
        writeln!(
            out,
            "time      {}-{}",
            format_wall_clock(event.start_time),
            format_wall_clock(event.end_time)
        )?;
        writeln!(out, "desc      {}", event.description)?;
        writeln!(out, "location  {}", event.location)?;
        writeln!(out, "category  {}", event.category)?;
        writeln!(
            out,
            "repeat    {} every {}",
            event.repeat.kind.as_key(),
            event.repeat.interval
        )?;
        if let Some(end_date) = event.repeat.end_date {
            writeln!(out, "until     {}", end_date.format("%Y-%m-%d"))?;
        }
        writeln!(out, "notify    {} min before", event.notification_time)?;

        Ok(())
    }

    /// Month grid with Sunday as the first column. Days with events are
    /// highlighted.
    #[tracing::instrument(skip(self, weeks, busy_days))]
    pub fn print_month_grid(
        &mut self,
        month: NaiveDate,
        weeks: &[[Option<u32>; 7]],
        busy_days: &[u32],
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{}", format_month(month))?;
        let header: Vec<String> = WEEKDAY_LABELS.iter().map(|label| format!("{label} ")).collect();
        writeln!(out, "{}", header.join(""))?;

        for week in weeks {
            let cells: Vec<String> = week
                .iter()
                .map(|cell| match cell {
                    Some(day) if busy_days.contains(day) => self.paint(&format!("{day:>2}*"), "1;36"),
                    Some(day) => format!("{day:>2} "),
                    None => "   ".to_string(),
                })
                .collect();
            writeln!(out, "{}", cells.join(""))?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, days))]
    pub fn print_week(
        &mut self,
        reference: NaiveDate,
        days: &[(NaiveDate, Vec<&Event>)],
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{}", format_week(reference))?;
        for (idx, (date, events)) in days.iter().enumerate() {
            let label = format!(
                "{} {}/{}",
                WEEKDAY_LABELS[idx % WEEKDAY_LABELS.len()],
                zero_pad(date.month()),
                zero_pad(date.day())
            );
            writeln!(out, "{}", self.paint(&label, "1"))?;
            for event in events {
                writeln!(
                    out,
                    "  {} {} [{}]",
                    format_wall_clock(event.start_time),
                    event.title,
                    event.id
                )?;
            }
        }

        Ok(())
    }

    pub fn print_notifications(&mut self, notifications: &[Notification]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for notification in notifications {
            writeln!(out, "{} {}", self.paint("[알림]", "31"), notification.message)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, candidate, conflicts), fields(count = conflicts.len()))]
    pub fn print_conflicts(&mut self, candidate: &Event, conflicts: &[Conflict<'_>]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if conflicts.is_empty() {
            writeln!(out, "No conflicts for event {}.", candidate.id)?;
            return Ok(());
        }

        writeln!(
            out,
            "{}",
            self.paint(&format!("일정 겹침 경고: {}", candidate.title), "31")
        )?;
        let headers = vec![
            "Date".to_string(),
            "ID".to_string(),
            "Title".to_string(),
            "Time".to_string(),
            "Overlap".to_string(),
        ];
        let rows = conflicts
            .iter()
            .map(|conflict| {
                vec![
                    conflict.date.format("%Y-%m-%d").to_string(),
                    self.paint(&conflict.existing.id, "33"),
                    conflict.existing.title.clone(),
                    format!(
                        "{}-{}",
                        format_wall_clock(conflict.existing.start_time),
                        format_wall_clock(conflict.existing.end_time)
                    ),
                    format!("{} min", conflict.overlap_minutes),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, &width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for &width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths).take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
