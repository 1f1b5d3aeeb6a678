//! Table formatting for CLI list output
//!
//! Commands describe their columns once and push typed cells; the formatter
//! renders aligned terminal columns, CSV (`csv`), Markdown (`tabled`) or keys.

use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity identity (cyan)
    Id(String),
    Text(String),
    Year(i32),
    /// Probability in [0, 1], colored by level; `None` prints as `-`
    Prob(Option<f64>),
    /// Number with fixed precision; `None` prints as `-`
    Float(Option<f64>, usize),
    /// Row error messages (red count in terminals)
    Errors(Vec<String>),
}

impl CellValue {
    fn plain(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Year(y) => y.to_string(),
            CellValue::Prob(p) => p.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".into()),
            CellValue::Float(f, prec) => f
                .map(|v| format!("{:.prec$}", v, prec = *prec))
                .unwrap_or_else(|| "-".into()),
            CellValue::Errors(errs) if errs.is_empty() => "-".into(),
            CellValue::Errors(errs) => errs.len().to_string(),
        }
    }

    /// Aligned, colored terminal cell
    pub fn format_tsv(&self, width: usize) -> String {
        let text = truncate_str(&self.plain(), width);
        match self {
            CellValue::Id(_) => format!("{:<width$}", style(text).cyan()),
            CellValue::Prob(Some(p)) => {
                let styled = if *p >= 0.9 {
                    style(text).green()
                } else if *p >= 0.5 {
                    style(text).yellow()
                } else {
                    style(text).red()
                };
                format!("{:>width$}", styled)
            }
            CellValue::Prob(None) | CellValue::Float(None, _) => format!("{:>width$}", style(text).dim()),
            CellValue::Year(_) | CellValue::Float(..) => format!("{:>width$}", text),
            CellValue::Errors(errs) if !errs.is_empty() => format!("{:<width$}", style(text).red().bold()),
            CellValue::Errors(_) => format!("{:<width$}", style(text).dim()),
            CellValue::Text(_) => format!("{:<width$}", text),
        }
    }

    /// Raw CSV field; missing values are empty
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Prob(None) | CellValue::Float(None, _) => String::new(),
            CellValue::Prob(Some(p)) => p.to_string(),
            CellValue::Float(Some(f), _) => f.to_string(),
            CellValue::Errors(errs) => errs.join("; "),
            _ => self.plain(),
        }
    }

    pub fn format_md(&self) -> String {
        match self {
            CellValue::Errors(errs) if !errs.is_empty() => errs.join("; "),
            _ => self.plain(),
        }
        .replace('|', "\\|")
    }

    fn display_width(&self) -> usize {
        self.plain().chars().count()
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: String,
    pub header: String,
    pub width: usize,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, header: impl Into<String>, width: usize) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width,
        }
    }
}

/// A row of cell values, identified by a key printed in `id` format
pub struct TableRow {
    pub key: String,
    pub cells: Vec<(String, CellValue)>,
}

impl TableRow {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: impl Into<String>, value: CellValue) -> Self {
        self.cells.push((key.into(), value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    noun: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            show_summary: true,
        }
    }

    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Csv => self.output_csv(rows),
            OutputFormat::Md => {
                self.output_md(rows);
                Ok(())
            }
            OutputFormat::Id => {
                for row in rows {
                    println!("{}", row.key);
                }
                Ok(())
            }
            _ => {
                self.output_tsv(rows);
                Ok(())
            }
        }
    }

    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(&col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(1);
                col.header.len().max(content).min(col.width)
            })
            .collect()
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.widths(rows);

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<w$}", style(&col.header).bold(), w = *w))
            .collect();
        println!("{}", header.join(" "));

        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total));

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(&col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<w$}", "-", w = *w),
                })
                .collect();
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!("{} {}(s)", style(rows.len()).cyan(), self.noun);
        }
    }

    fn output_csv(&self, rows: &[TableRow]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        writer
            .write_record(self.columns.iter().map(|c| c.key.as_str()))
            .into_diagnostic()?;

        for row in rows {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(&col.key).map(CellValue::format_csv).unwrap_or_default())
                .collect();
            writer.write_record(&record).into_diagnostic()?;
        }
        writer.flush().into_diagnostic()
    }

    fn output_md(&self, rows: &[TableRow]) {
        println!("{}", self.render_md(rows));
    }

    /// Markdown table text
    pub fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.clone()));
        for row in rows {
            builder.push_record(self.columns.iter().map(|col| {
                row.get(&col.key)
                    .map(CellValue::format_md)
                    .unwrap_or_else(|| "-".to_string())
            }));
        }
        builder.build().with(Style::markdown()).to_string()
    }
}
