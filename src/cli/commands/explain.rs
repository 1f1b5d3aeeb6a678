//! `yld explain` command - the audit trail behind one (year, chip) row

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{format_prob, load_workspace, projection_options};
use crate::cli::output::{effective_format, print_structured};
use crate::cli::GlobalOpts;
use crate::core::composer::{CompositionPolicy, Contribution};
use crate::core::document::Document;
use crate::core::engine::{project_scenario, Projection, ResultRow};
use crate::core::entity::Stage;
use crate::core::years::YearIndexing;
use crate::entities::yield_model::{YieldFormula, YieldModel};

#[derive(clap::Args, Debug)]
pub struct ExplainArgs {
    /// Scenario to project
    pub scenario: String,

    /// Chip to explain
    #[arg(long, short = 'c')]
    pub chip: String,

    /// Calendar year to explain
    #[arg(long, short = 'y')]
    pub year: i32,

    /// Yield model id or library formula to use instead of the scenario's
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Year index fed to the defect model
    #[arg(long)]
    pub indexing: Option<YearIndexing>,

    /// How technologies on one stage combine
    #[arg(long)]
    pub composition: Option<CompositionPolicy>,
}

/// Everything that went into one row
#[derive(Debug, Serialize)]
pub struct Explanation {
    pub scenario: String,
    pub year: i32,
    pub year_index: f64,
    pub chip: String,
    pub chip_name: String,
    pub family: String,
    pub die_area_mm2: f64,
    pub defect_density: Option<f64>,
    pub model: Option<String>,
    pub formula: Option<YieldFormula>,
    /// Formula with the row's numbers plugged in
    pub preview: Option<String>,
    pub composition: CompositionPolicy,
    pub stages: Vec<StageAudit>,
    pub total: Option<f64>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StageAudit {
    pub stage: Stage,
    pub base: Option<f64>,
    pub total_extra: f64,
    pub value: Option<f64>,
    pub contributions: Vec<Contribution>,
}

pub fn run(args: ExplainArgs, global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let options = projection_options(
        &ws.config,
        args.model.as_deref(),
        args.indexing,
        args.composition,
    );

    let projection = project_scenario(&ws.document, &args.scenario, &options);
    if let Some(err) = projection.errors.first() {
        return Err(err.clone().into());
    }

    let Some(row) = projection
        .rows
        .iter()
        .find(|r| r.year == args.year && r.chip_id.eq_ignore_ascii_case(&args.chip))
    else {
        return Err(miette::miette!(
            help = "the chip may not exist, may start later (special_start_year), or the year is outside the scenario window",
            "no row for chip '{}' in {} of scenario '{}'",
            args.chip,
            args.year,
            args.scenario
        ));
    };

    let explanation = explain(&ws.document, &projection, row);
    let format = effective_format(global.format, &ws.config, false);
    if !print_structured(&explanation, format)? {
        print_human(&explanation);
    }
    Ok(())
}

/// Assemble the audit record for `row`
pub fn explain(doc: &Document, projection: &Projection, row: &ResultRow) -> Explanation {
    let model = resolve_model(doc, projection);
    let start_year = doc
        .scenario(&projection.scenario_id)
        .map(|s| s.start_year)
        .unwrap_or(row.year);

    let preview = match (&model, row.defect_density) {
        (Some(model), Some(d)) => Some(model.preview(d, row.die_area_mm2)),
        _ => None,
    };

    Explanation {
        scenario: projection.scenario_id.clone(),
        year: row.year,
        year_index: projection.options.year_indexing.index(row.year, start_year),
        chip: row.chip_id.clone(),
        chip_name: row.chip_name.clone(),
        family: row.family_id.clone(),
        die_area_mm2: row.die_area_mm2,
        defect_density: row.defect_density,
        model: projection.model_id.clone(),
        formula: projection.model_formula,
        preview,
        composition: projection.options.composition,
        stages: row
            .stages
            .iter()
            .map(|s| StageAudit {
                stage: s.stage,
                base: s.base,
                total_extra: s.total_extra,
                value: s.value,
                contributions: s.contributions.clone(),
            })
            .collect(),
        total: row.total,
        errors: row.errors.iter().map(ToString::to_string).collect(),
    }
}

/// The model the projection used, rebuilt for the formula preview
fn resolve_model(doc: &Document, projection: &Projection) -> Option<YieldModel> {
    let id = projection.model_id.as_deref()?;
    doc.models
        .iter()
        .find(|m| m.id == id)
        .cloned()
        .or_else(|| projection.model_formula.map(YieldModel::from_formula))
}

fn print_human(e: &Explanation) {
    println!(
        "{} {} {} ({})",
        style(&e.scenario).cyan().bold(),
        style(e.year).bold(),
        style(&e.chip).cyan(),
        e.chip_name
    );
    println!(
        "  family {}  D = {}  area = {} mm2  year index = {}",
        e.family,
        e.defect_density
            .map(|d| format!("{:.4}", d))
            .unwrap_or_else(|| "-".to_string()),
        e.die_area_mm2,
        e.year_index
    );
    if let (Some(model), Some(preview)) = (&e.model, &e.preview) {
        println!("  model {}: {}", style(model).yellow(), preview);
    }
    println!();

    println!(
        "{:<6} {:>8} {:>9} {:>8}",
        style("STAGE").bold(),
        style("BASE").bold(),
        style("EXTRA").bold(),
        style("VALUE").bold()
    );
    for stage in &e.stages {
        println!(
            "{:<6} {:>8} {:>+8.2}% {:>8}",
            stage.stage.as_str(),
            format_prob(stage.base),
            stage.total_extra,
            format_prob(stage.value)
        );
        for c in &stage.contributions {
            let kind = if c.dynamic { "dynamic" } else { "static" };
            println!(
                "         {} {} {:+.2} ({})",
                style(&c.technology_id).cyan(),
                c.technology_name,
                c.extra,
                style(kind).dim()
            );
        }
    }
    println!();
    println!("{:<6} {:>8}", style("TOTAL").bold(), format_prob(e.total));

    for err in &e.errors {
        println!("{} {}", style("✗").red(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::ProjectionOptions;
    use crate::entities::chip::ChipType;
    use crate::entities::family::Family;
    use crate::entities::scenario::Scenario;
    use crate::entities::technology::Technology;

    fn doc() -> Document {
        let mut doc = Document::default();
        doc.scenarios.push(Scenario::new("SCN-1", "Base", 2026, 2028));
        doc.families.push(Family::new("FAM-A", "A", 1.0, 0.0, 0.0));
        let mut chip = ChipType::new("CHIP-1", "One", "FAM-A", 100.0);
        chip.technologies = vec!["TECH-S".into()];
        doc.chips.push(chip);
        doc.technologies
            .push(Technology::fixed("TECH-S", "Saw fix", Stage::Saw, 10.0));
        doc.plant.stages.insert(Stage::Saw, 0.5);
        doc
    }

    #[test]
    fn test_explanation_with_library_formula() {
        let doc = doc();
        let opts = ProjectionOptions {
            model_override: Some("poisson".into()),
            ..Default::default()
        };
        let projection = project_scenario(&doc, "SCN-1", &opts);
        let row = projection.row(2027, "CHIP-1").unwrap();

        let e = explain(&doc, &projection, row);
        assert_eq!(e.year_index, 1.0);
        assert_eq!(e.formula, Some(YieldFormula::Poisson));
        assert!(e.preview.as_deref().unwrap().starts_with("exp(-x) = 0.3679"));

        let saw = e.stages.iter().find(|s| s.stage == Stage::Saw).unwrap();
        assert_eq!(saw.base, Some(0.5));
        assert_eq!(saw.contributions[0].technology_id, "TECH-S");
        assert!((saw.value.unwrap() - 0.55).abs() < 1e-12);
        assert!(e.errors.is_empty());
    }

    #[test]
    fn test_explanation_uses_configured_model_parameters() {
        let mut doc = doc();
        let mut model = YieldModel::new("YM-NB", "Clustered", YieldFormula::NegativeBinomial);
        model.alpha = Some(4.0);
        doc.models.push(model);

        let projection = project_scenario(&doc, "SCN-1", &ProjectionOptions::default());
        let row = projection.row(2026, "CHIP-1").unwrap();
        let e = explain(&doc, &projection, row);
        assert_eq!(e.model.as_deref(), Some("YM-NB"));
        assert!(e.preview.unwrap().contains("alpha = 4"));
    }
}
