//! `yld calc` command - project a scenario into (year, chip) rows

use clap::ValueEnum;
use console::style;
use miette::Result;
use std::cmp::Ordering;

use crate::cli::helpers::{format_prob, load_workspace, projection_options};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::composer::CompositionPolicy;
use crate::core::engine::{project_scenario, Projection, ResultRow};
use crate::core::entity::Stage;
use crate::core::years::YearIndexing;

#[derive(clap::Args, Debug)]
pub struct CalcArgs {
    /// Scenario to project
    pub scenario: String,

    /// Yield model id or library formula (poisson, murphy, ...) to use instead of the scenario's
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Year index fed to the defect model (relative, relative_plus_one, calendar)
    #[arg(long)]
    pub indexing: Option<YearIndexing>,

    /// How technologies on one stage combine (additive, sequential)
    #[arg(long)]
    pub composition: Option<CompositionPolicy>,

    /// Only rows for this calendar year
    #[arg(long, short = 'y')]
    pub year: Option<i32>,

    /// Only rows for this chip
    #[arg(long)]
    pub chip: Option<String>,

    /// Only rows for chips of this family
    #[arg(long)]
    pub family: Option<String>,

    /// Only rows that carry errors
    #[arg(long)]
    pub errors_only: bool,

    /// Sort column
    #[arg(long, value_enum, default_value = "year")]
    pub sort: SortColumn,

    /// Reverse the sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Show at most N rows
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Print only the number of matching rows
    #[arg(long)]
    pub count: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    /// Year, then chip in document order
    Year,
    Chip,
    Family,
    DefectDensity,
    Total,
}

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let options = projection_options(
        &ws.config,
        args.model.as_deref(),
        args.indexing,
        args.composition,
    );

    let projection = project_scenario(&ws.document, &args.scenario, &options);
    let format = effective_format(global.format, &ws.config, true);

    let rows = select_rows(&projection, &args);

    if args.count {
        println!("{}", rows.len());
        return finish(&projection);
    }

    let mut view = projection.clone();
    view.rows = rows.into_iter().cloned().collect();

    if !print_structured(&view, format)? {
        if format == OutputFormat::Tsv && !global.quiet {
            print_header(&view);
        }

        let columns = columns();
        let table_rows: Vec<TableRow> = view.rows.iter().map(table_row).collect();
        TableFormatter::new(&columns, "row")
            .without_summary()
            .output(&table_rows, format)?;

        if format == OutputFormat::Tsv && !global.quiet {
            print_summary(&projection);
        }
    }

    finish(&projection)
}

/// Apply filters, ordering and the row limit
fn select_rows<'a>(projection: &'a Projection, args: &CalcArgs) -> Vec<&'a ResultRow> {
    let mut rows: Vec<&ResultRow> = projection
        .rows
        .iter()
        .filter(|r| args.year.map_or(true, |y| r.year == y))
        .filter(|r| args.chip.as_ref().map_or(true, |c| r.chip_id.eq_ignore_ascii_case(c)))
        .filter(|r| {
            args.family
                .as_ref()
                .map_or(true, |f| r.family_id.eq_ignore_ascii_case(f))
        })
        .filter(|r| !args.errors_only || r.has_errors())
        .collect();

    // Stable sorts keep document order among equal keys
    match args.sort {
        SortColumn::Year => {}
        SortColumn::Chip => rows.sort_by(|a, b| a.chip_id.cmp(&b.chip_id)),
        SortColumn::Family => rows.sort_by(|a, b| a.family_id.cmp(&b.family_id)),
        SortColumn::DefectDensity => {
            rows.sort_by(|a, b| cmp_missing_last(a.defect_density, b.defect_density))
        }
        SortColumn::Total => rows.sort_by(|a, b| cmp_missing_last(a.total, b.total)),
    }

    if args.reverse {
        rows.reverse();
    }
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }
    rows
}

fn cmp_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn columns() -> Vec<ColumnDef> {
    let mut columns = vec![
        ColumnDef::new("year", "YEAR", 6),
        ColumnDef::new("chip", "CHIP", 16),
        ColumnDef::new("family", "FAMILY", 14),
        ColumnDef::new("package", "PACKAGE", 10),
        ColumnDef::new("defect_density", "D", 8),
    ];
    columns.extend(
        Stage::all()
            .iter()
            .map(|s| ColumnDef::new(s.as_str(), s.as_str().to_uppercase(), 7)),
    );
    columns.push(ColumnDef::new("total", "TOTAL", 7));
    columns.push(ColumnDef::new("errors", "ERRORS", 6));
    columns
}

fn table_row(row: &ResultRow) -> TableRow {
    let mut table_row = TableRow::new(format!("{}\t{}", row.year, row.chip_id))
        .cell("year", CellValue::Year(row.year))
        .cell("chip", CellValue::Id(row.chip_id.clone()))
        .cell("family", CellValue::Text(row.family_id.clone()))
        .cell("package", CellValue::Text(row.package.clone()))
        .cell("defect_density", CellValue::Float(row.defect_density, 4));

    for stage in Stage::all() {
        table_row = table_row.cell(stage.as_str(), CellValue::Prob(row.stage_value(*stage)));
    }

    table_row
        .cell("total", CellValue::Prob(row.total))
        .cell(
            "errors",
            CellValue::Errors(row.errors.iter().map(ToString::to_string).collect()),
        )
}

fn print_header(projection: &Projection) {
    let name = projection
        .scenario_name
        .as_deref()
        .map(|n| format!(" ({})", n))
        .unwrap_or_default();
    let model = match (&projection.model_id, projection.model_formula) {
        (Some(id), Some(formula)) => format!("{} [{}]", id, formula),
        _ => "-".to_string(),
    };
    println!(
        "{}{} {} model {} {} {} {} {}",
        style(&projection.scenario_id).cyan().bold(),
        name,
        style("|").dim(),
        style(model).yellow(),
        style("|").dim(),
        projection.options.composition,
        style("|").dim(),
        projection.options.year_indexing
    );
    println!();
}

fn print_summary(projection: &Projection) {
    let summary = projection.summary();
    println!();

    let mut line = format!("{} row(s)", style(summary.rows).cyan());
    if summary.rows_with_errors > 0 {
        line.push_str(&format!(
            ", {} with errors ({} missing reference(s), {} other)",
            style(summary.rows_with_errors).red(),
            summary.missing_references,
            summary.other_row_errors
        ));
    }
    if summary.undefined_totals > 0 {
        line.push_str(&format!(
            ", {} undefined total(s)",
            style(summary.undefined_totals).yellow()
        ));
    }
    println!("{}", line);

    if let Some(best) = projection
        .rows
        .iter()
        .filter_map(|r| r.total.map(|t| (r, t)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
    {
        println!(
            "best total: {} {} {}",
            best.0.year,
            style(&best.0.chip_id).cyan(),
            format_prob(Some(best.1))
        );
    }
}

/// Report scenario-level errors on stderr and turn them into a failure
fn finish(projection: &Projection) -> Result<()> {
    if projection.errors.is_empty() {
        return Ok(());
    }
    for err in &projection.errors {
        eprintln!("{} {}", style("✗").red(), err);
    }
    match projection.errors.as_slice() {
        [only] => Err(only.clone().into()),
        errors => Err(miette::miette!(
            "scenario '{}' could not be projected: {} error(s)",
            projection.scenario_id,
            errors.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Document;
    use crate::core::engine::ProjectionOptions;
    use crate::entities::chip::ChipType;
    use crate::entities::family::Family;
    use crate::entities::scenario::Scenario;
    use crate::entities::yield_model::{YieldFormula, YieldModel};

    fn args() -> CalcArgs {
        CalcArgs {
            scenario: "SCN-1".into(),
            model: None,
            indexing: None,
            composition: None,
            year: None,
            chip: None,
            family: None,
            errors_only: false,
            sort: SortColumn::Year,
            reverse: false,
            limit: None,
            count: false,
        }
    }

    fn projection() -> Projection {
        let mut doc = Document::default();
        doc.scenarios.push(Scenario::new("SCN-1", "Base", 2026, 2027));
        doc.models
            .push(YieldModel::new("YM-1", "Poisson", YieldFormula::Poisson));
        doc.families.push(Family::new("FAM-A", "A", 1.0, 0.0, 0.0));
        doc.chips.push(ChipType::new("SMALL", "Small", "FAM-A", 10.0));
        doc.chips.push(ChipType::new("BIG", "Big", "FAM-A", 100.0));
        doc.chips.push(ChipType::new("LOST", "Lost", "FAM-X", 10.0));
        project_scenario(&doc, "SCN-1", &ProjectionOptions::default())
    }

    #[test]
    fn test_filters() {
        let p = projection();
        assert_eq!(select_rows(&p, &args()).len(), 6);

        let a = CalcArgs { year: Some(2027), ..args() };
        assert_eq!(select_rows(&p, &a).len(), 3);

        let a = CalcArgs { chip: Some("big".into()), ..args() };
        assert!(select_rows(&p, &a).iter().all(|r| r.chip_id == "BIG"));

        let a = CalcArgs { errors_only: true, ..args() };
        let rows = select_rows(&p, &a);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.chip_id == "LOST"));

        let a = CalcArgs { family: Some("FAM-X".into()), limit: Some(1), ..args() };
        assert_eq!(select_rows(&p, &a).len(), 1);
    }

    #[test]
    fn test_sort_by_total_puts_missing_last() {
        let p = projection();
        let a = CalcArgs { sort: SortColumn::Total, year: Some(2026), ..args() };
        let chips: Vec<&str> = select_rows(&p, &a).iter().map(|r| r.chip_id.as_str()).collect();
        assert_eq!(chips, vec!["BIG", "SMALL", "LOST"]);

        let a = CalcArgs { reverse: true, ..a };
        let chips: Vec<&str> = select_rows(&p, &a).iter().map(|r| r.chip_id.as_str()).collect();
        assert_eq!(chips, vec!["LOST", "SMALL", "BIG"]);
    }

    #[test]
    fn test_table_row_cells() {
        let p = projection();
        let row = table_row(p.row(2026, "LOST").unwrap());
        assert_eq!(row.key, "2026\tLOST");
        assert_eq!(row.get("total").unwrap().format_csv(), "");
        assert_eq!(
            row.get("errors").unwrap().format_csv(),
            "family 'FAM-X' not found"
        );
        assert_eq!(columns().len(), 5 + Stage::all().len() + 2);
    }

    #[test]
    fn test_finish_reports_scenario_errors() {
        let p = projection();
        assert!(finish(&p).is_ok());

        let missing = project_scenario(&Document::default(), "SCN-404", &ProjectionOptions::default());
        assert!(finish(&missing).is_err());
    }
}
