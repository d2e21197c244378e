//! Printing an `AggregateReport`: either as plain `key value` lines,
//! or as a table that is human-readable on a terminal (padding, ANSI
//! formatting for the title row) or TSV.

//! Does not escape anything in the fields, just uses `Display`. Text
//! keys come from directory names, which could contain tabs or
//! spaces, making the output ambiguous in those cases.

use std::{fmt::Display, io::Write};

use anyhow::{Result, anyhow, bail};
use itertools::Itertools;
use yansi::{Paint, Style};

use crate::aggregate::AggregateReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// `key value`, one pair per line, no title
    #[default]
    Plain,
    /// Aligned columns with a title row
    Table { color: bool },
    /// Tab separated, with a title row
    Tsv,
}

/// The column widths are fixed on creation, which allows streaming.
/// If a value is wider than its column, a single space is still
/// printed after it. The last column does not need a width and gets
/// no padding.
pub struct TerminalTable {
    widths: Vec<usize>,
    titles: Vec<String>,
    padding: String,
    tsv_mode: bool,
    color: bool,
}

impl TerminalTable {
    /// The length of `widths` must be one less than that of `titles`.
    /// In terminal mode a space is appended to each title, so that
    /// italic text is not clipped.
    pub fn new<S: Display>(widths: &[usize], titles: &[S], tsv_mode: bool, color: bool) -> Self {
        let titles = titles
            .iter()
            .map(|title| {
                if tsv_mode {
                    title.to_string()
                } else {
                    format!("{title} ")
                }
            })
            .collect();
        let max_width = widths.iter().max().copied().unwrap_or(0);
        let padding = " ".repeat(max_width);
        Self {
            widths: widths.to_owned(),
            titles,
            padding,
            tsv_mode,
            color,
        }
    }

    fn write_row<V: Display>(
        &self,
        row: &[V],
        line_style: Option<&Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        let lens = (self.widths.len(), row.len());
        let (l1, l2) = lens;
        if l1
            != l2
                .checked_sub(1)
                .ok_or_else(|| anyhow!("need at least 1 column"))?
        {
            bail!("widths.len != data.len - 1: {lens:?}")
        }

        for (i, either_or_both) in self.widths.iter().zip_longest(row).enumerate() {
            if self.tsv_mode && i > 0 {
                out.write_all(b"\t")?;
            }

            let val = either_or_both
                .as_ref()
                .right()
                .expect("value there because row len checked above");
            let s = val.to_string();
            let s_len = s.chars().count();
            match line_style {
                Some(style) => write!(out, "{}", s.as_str().paint(*style))?,
                None => out.write_all(s.as_bytes())?,
            }

            if let Some(width) = either_or_both.left() {
                if !self.tsv_mode {
                    if *width > s_len {
                        out.write_all(self.padding[0..width - s_len].as_bytes())?;
                    } else {
                        // at least 1 space anyway
                        out.write_all(b" ")?;
                    }
                }
            }
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&self, out: &mut impl Write) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        let style = if self.color && !self.tsv_mode {
            Some(&STYLE)
        } else {
            None
        };
        self.write_row(&self.titles, style, out)
    }

    pub fn write_data_row<V: Display>(&self, data: &[V], out: &mut impl Write) -> Result<()> {
        self.write_row(data, None, out)
    }
}

/// `key_title` and `value_title` are only used for the formats with
/// a title row.
pub fn write_report(
    report: &AggregateReport,
    format: ReportFormat,
    key_title: &str,
    value_title: &str,
    out: &mut impl Write,
) -> Result<()> {
    let (tsv_mode, color) = match format {
        ReportFormat::Plain => {
            for (key, value) in report.iter() {
                writeln!(out, "{key} {value}")?;
            }
            return Ok(());
        }
        ReportFormat::Table { color } => (false, color),
        ReportFormat::Tsv => (true, false),
    };

    let rows: Vec<[String; 2]> = report
        .iter()
        .map(|(key, value)| [key.to_string(), value.to_string()])
        .collect();
    let key_width = rows
        .iter()
        .map(|[key, _]| key.chars().count())
        .chain([key_title.chars().count()])
        .max()
        .unwrap_or(0)
        + 2;
    let table = TerminalTable::new(&[key_width], &[key_title, value_title], tsv_mode, color);
    table.write_title_row(out)?;
    for row in &rows {
        table.write_data_row(row, out)?;
    }
    Ok(())
}
