//! `yld list` command - list entities of one kind, or the formula library

use clap::ValueEnum;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::load_workspace;
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::document::Document;
use crate::core::entity::Entity;
use crate::entities::yield_model::YieldFormula;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// What to list
    #[arg(value_enum)]
    pub kind: ListKind,

    /// Only entries whose id or name contains this text (case-insensitive)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Print only the number of matching entries
    #[arg(long)]
    pub count: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Scenarios,
    Families,
    Chips,
    Technologies,
    Models,
    /// Built-in yield formulas
    Formulas,
}

/// A library formula as shown by `yld list formulas`
#[derive(Debug, Serialize)]
struct FormulaEntry {
    formula: YieldFormula,
    expression: &'static str,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    // The formula library needs no project
    let (document, config) = if args.kind == ListKind::Formulas {
        (Document::default(), Config::load())
    } else {
        let ws = load_workspace(global)?;
        (ws.document, ws.config)
    };
    let format = effective_format(global.format, &config, true);
    let (columns, rows) = entity_rows(&document, args.kind, &args.search);

    if args.count {
        println!("{}", rows.len());
        return Ok(());
    }

    let search = &args.search;
    let printed = match args.kind {
        ListKind::Scenarios => print_filtered(&document.scenarios, search, format)?,
        ListKind::Families => print_filtered(&document.families, search, format)?,
        ListKind::Chips => print_filtered(&document.chips, search, format)?,
        ListKind::Technologies => print_filtered(&document.technologies, search, format)?,
        ListKind::Models => print_filtered(&document.models, search, format)?,
        ListKind::Formulas => print_structured(&formula_entries(search), format)?,
    };
    if printed {
        return Ok(());
    }

    let noun = match args.kind {
        ListKind::Scenarios => "scenario",
        ListKind::Families => "family",
        ListKind::Chips => "chip",
        ListKind::Technologies => "technology",
        ListKind::Models => "model",
        ListKind::Formulas => "formula",
    };
    TableFormatter::new(&columns, noun).output(&rows, format)
}

fn formula_entries(search: &Option<String>) -> Vec<FormulaEntry> {
    YieldFormula::all()
        .iter()
        .map(|f| FormulaEntry {
            formula: *f,
            expression: f.expression(),
        })
        .filter(|e| matches(search, e.formula.as_str(), e.expression))
        .collect()
}

fn matches(search: &Option<String>, id: &str, name: &str) -> bool {
    match search {
        Some(s) => {
            let s = s.to_lowercase();
            id.to_lowercase().contains(&s) || name.to_lowercase().contains(&s)
        }
        None => true,
    }
}

fn print_filtered<E: Entity>(items: &[E], search: &Option<String>, format: OutputFormat) -> Result<bool> {
    let filtered: Vec<&E> = items
        .iter()
        .filter(|e| matches(search, e.id(), e.name()))
        .collect();
    print_structured(&filtered, format)
}

fn entity_rows(doc: &Document, kind: ListKind, search: &Option<String>) -> (Vec<ColumnDef>, Vec<TableRow>) {
    match kind {
        ListKind::Scenarios => (
            vec![
                ColumnDef::new("id", "ID", 16),
                ColumnDef::new("name", "NAME", 30),
                ColumnDef::new("start_year", "START", 6),
                ColumnDef::new("end_year", "END", 6),
                ColumnDef::new("model", "MODEL", 16),
            ],
            doc.scenarios
                .iter()
                .filter(|s| matches(search, &s.id, &s.name))
                .map(|s| {
                    TableRow::new(&s.id)
                        .cell("id", CellValue::Id(s.id.clone()))
                        .cell("name", CellValue::Text(s.name.clone()))
                        .cell("start_year", CellValue::Year(s.start_year))
                        .cell("end_year", CellValue::Year(s.end_year))
                        .cell(
                            "model",
                            CellValue::Text(s.model.clone().unwrap_or_else(|| "-".to_string())),
                        )
                })
                .collect(),
        ),
        ListKind::Families => (
            vec![
                ColumnDef::new("id", "ID", 16),
                ColumnDef::new("name", "NAME", 24),
                ColumnDef::new("d0", "D0", 8),
                ColumnDef::new("d_in", "D_IN", 8),
                ColumnDef::new("t", "T", 8),
                ColumnDef::new("policy", "POLICY", 12),
            ],
            doc.families
                .iter()
                .filter(|f| matches(search, &f.id, &f.name))
                .map(|f| {
                    TableRow::new(&f.id)
                        .cell("id", CellValue::Id(f.id.clone()))
                        .cell("name", CellValue::Text(f.name.clone()))
                        .cell("d0", CellValue::Float(Some(f.d0), 4))
                        .cell("d_in", CellValue::Float(Some(f.d_in), 4))
                        .cell("t", CellValue::Float(Some(f.t), 4))
                        .cell("policy", CellValue::Text(f.policy().to_string()))
                })
                .collect(),
        ),
        ListKind::Chips => (
            vec![
                ColumnDef::new("id", "ID", 16),
                ColumnDef::new("name", "NAME", 24),
                ColumnDef::new("family", "FAMILY", 14),
                ColumnDef::new("package", "PACKAGE", 10),
                ColumnDef::new("area", "AREA_MM2", 9),
                ColumnDef::new("start", "START", 6),
                ColumnDef::new("technologies", "TECHNOLOGIES", 30),
            ],
            doc.chips
                .iter()
                .filter(|c| matches(search, &c.id, &c.name))
                .map(|c| {
                    let start = match c.special_start_year {
                        Some(y) if y != 0 => CellValue::Year(y),
                        _ => CellValue::Text("-".to_string()),
                    };
                    TableRow::new(&c.id)
                        .cell("id", CellValue::Id(c.id.clone()))
                        .cell("name", CellValue::Text(c.name.clone()))
                        .cell("family", CellValue::Text(c.family.clone()))
                        .cell("package", CellValue::Text(c.package.clone()))
                        .cell("area", CellValue::Float(Some(c.die_area_mm2), 2))
                        .cell("start", start)
                        .cell("technologies", CellValue::Text(c.technologies.join(",")))
                })
                .collect(),
        ),
        ListKind::Technologies => (
            vec![
                ColumnDef::new("id", "ID", 16),
                ColumnDef::new("name", "NAME", 24),
                ColumnDef::new("stage", "STAGE", 6),
                ColumnDef::new("kind", "KIND", 8),
                ColumnDef::new("extra", "EXTRA_%", 8),
            ],
            doc.technologies
                .iter()
                .filter(|t| matches(search, &t.id, &t.name))
                .map(|t| {
                    let kind = if t.is_dynamic() { "dynamic" } else { "static" };
                    TableRow::new(&t.id)
                        .cell("id", CellValue::Id(t.id.clone()))
                        .cell("name", CellValue::Text(t.name.clone()))
                        .cell("stage", CellValue::Text(t.stage.to_string()))
                        .cell("kind", CellValue::Text(kind.to_string()))
                        .cell("extra", CellValue::Float(Some(t.extra_yield.nominal()), 2))
                })
                .collect(),
        ),
        ListKind::Formulas => (
            vec![
                ColumnDef::new("formula", "FORMULA", 18),
                ColumnDef::new("expression", "EXPRESSION", 30),
            ],
            formula_entries(search)
                .iter()
                .map(|e| {
                    TableRow::new(e.formula.as_str())
                        .cell("formula", CellValue::Id(e.formula.as_str().to_string()))
                        .cell("expression", CellValue::Text(e.expression.to_string()))
                })
                .collect(),
        ),
        ListKind::Models => (
            vec![
                ColumnDef::new("id", "ID", 16),
                ColumnDef::new("name", "NAME", 28),
                ColumnDef::new("formula", "FORMULA", 18),
                ColumnDef::new("expression", "EXPRESSION", 28),
            ],
            doc.models
                .iter()
                .filter(|m| matches(search, &m.id, &m.name))
                .map(|m| {
                    TableRow::new(&m.id)
                        .cell("id", CellValue::Id(m.id.clone()))
                        .cell("name", CellValue::Text(m.name.clone()))
                        .cell("formula", CellValue::Text(m.formula.to_string()))
                        .cell("expression", CellValue::Text(m.formula.expression().to_string()))
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::chip::ChipType;
    use crate::entities::family::Family;

    #[test]
    fn test_search_matches_id_or_name() {
        assert!(matches(&None, "FAM-A", "Alpha"));
        assert!(matches(&Some("alp".into()), "FAM-A", "Alpha"));
        assert!(matches(&Some("fam-".into()), "FAM-A", "Alpha"));
        assert!(!matches(&Some("beta".into()), "FAM-A", "Alpha"));
    }

    #[test]
    fn test_entity_rows() {
        let mut doc = Document::default();
        doc.families.push(Family::new("FAM-A", "Alpha", 0.1, 0.5, 0.3));
        let mut chip = ChipType::new("BCR-1", "Driver", "FAM-A", 2.0);
        chip.special_start_year = Some(2028);
        chip.technologies = vec!["TECH-A".into(), "TECH-B".into()];
        doc.chips.push(chip);
        doc.chips.push(ChipType::new("BCR-2", "Other", "FAM-A", 3.0));

        let (columns, rows) = entity_rows(&doc, ListKind::Chips, &None);
        assert_eq!(columns.len(), 7);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("start").unwrap().format_csv(), "2028");
        assert_eq!(rows[0].get("technologies").unwrap().format_csv(), "TECH-A,TECH-B");
        assert_eq!(rows[1].get("start").unwrap().format_csv(), "-");

        let (_, rows) = entity_rows(&doc, ListKind::Chips, &Some("other".into()));
        assert_eq!(rows.len(), 1);

        let (_, rows) = entity_rows(&doc, ListKind::Families, &None);
        assert_eq!(rows[0].get("policy").unwrap().format_csv(), "exponential");

        let (_, rows) = entity_rows(&doc, ListKind::Formulas, &Some("seeds".into()));
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["seeds", "seeds_fixed_loss"]);
    }
}
