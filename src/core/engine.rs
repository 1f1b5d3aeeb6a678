//! Scenario result builder - projects every (year, chip) pair of a scenario
//!
//! [`project_scenario`] is the single entry point. It is a pure function of
//! the document, the scenario identity and the options: reference and
//! configuration problems are returned as data so callers can render partial,
//! explainable results.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::composer::{compose, CompositionPolicy, StageYield};
use crate::core::document::{Document, DocumentIndex};
use crate::core::entity::{clamp01, Stage};
use crate::core::years::YearIndexing;
use crate::entities::chip::ChipType;
use crate::entities::scenario::Scenario;
use crate::entities::yield_model::{YieldFormula, YieldModel};

/// Knobs that change how a scenario is projected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOptions {
    /// Yield model id (or bare library formula) replacing the scenario's choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,

    #[serde(default)]
    pub year_indexing: YearIndexing,

    #[serde(default)]
    pub composition: CompositionPolicy,
}

/// Problems that prevent any row from being computed
#[derive(Debug, Clone, PartialEq, Error, Diagnostic, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioError {
    #[error("scenario '{scenario}' starts in {start_year}, after its end year {end_year}")]
    #[diagnostic(
        code(yld::engine::configuration),
        help("set start_year to a year on or before end_year")
    )]
    Configuration {
        scenario: String,
        start_year: i32,
        end_year: i32,
    },

    #[error("scenario '{scenario}' not found")]
    #[diagnostic(code(yld::engine::scenario_not_found))]
    NotFound { scenario: String },

    #[error("yield model '{model}' not found and no fallback model is configured")]
    #[diagnostic(
        code(yld::engine::unknown_yield_model),
        help("add a model under models/ or pass a library formula such as 'poisson'")
    )]
    UnknownYieldModel { model: String },
}

/// Reference problems local to one row
#[derive(Debug, Clone, PartialEq, Error, Diagnostic, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("family '{family}' not found")]
    #[diagnostic(code(yld::engine::missing_family))]
    MissingFamily { family: String },

    #[error("technology '{technology}' not found")]
    #[diagnostic(code(yld::engine::missing_technology))]
    MissingTechnology { technology: String },

    #[error("family '{family}' has non-finite defect parameters")]
    #[diagnostic(code(yld::engine::invalid_family))]
    InvalidFamilyParameters { family: String },

    #[error("{stage} yield is not a finite number")]
    #[diagnostic(code(yld::engine::non_finite_yield))]
    NonFiniteYield { stage: Stage },
}

impl RowError {
    /// Whether this error comes from a dangling identity reference
    pub fn is_missing_reference(&self) -> bool {
        matches!(
            self,
            RowError::MissingFamily { .. } | RowError::MissingTechnology { .. }
        )
    }
}

/// One projected (year, chip) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub year: i32,
    pub chip_id: String,
    pub chip_name: String,
    pub package: String,
    pub family_id: String,
    pub family_name: Option<String>,
    pub die_area_mm2: f64,
    pub defect_density: Option<f64>,
    /// Every stage in line order
    pub stages: Vec<StageYield>,
    /// Product of all stage values, `None` if any stage is not computable
    pub total: Option<f64>,
    pub errors: Vec<RowError>,
}

impl ResultRow {
    pub fn stage(&self, stage: Stage) -> Option<&StageYield> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn stage_value(&self, stage: Stage) -> Option<f64> {
        self.stage(stage).and_then(|s| s.value)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Output of one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub scenario_id: String,
    pub scenario_name: Option<String>,
    /// Yield model actually used for the fabrication stage
    pub model_id: Option<String>,
    pub model_formula: Option<YieldFormula>,
    pub options: ProjectionOptions,
    pub rows: Vec<ResultRow>,
    pub errors: Vec<ScenarioError>,
    /// SHA-256 of the canonical JSON of the inputs
    pub input_digest: String,
}

/// Error counts for a status line
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectionSummary {
    pub rows: usize,
    pub rows_with_errors: usize,
    pub missing_references: usize,
    pub other_row_errors: usize,
    pub scenario_errors: usize,
    pub undefined_totals: usize,
}

impl Projection {
    fn empty(scenario_id: &str, options: &ProjectionOptions, input_digest: String) -> Self {
        Self {
            scenario_id: scenario_id.to_string(),
            scenario_name: None,
            model_id: None,
            model_formula: None,
            options: options.clone(),
            rows: Vec::new(),
            errors: Vec::new(),
            input_digest,
        }
    }

    /// Find the row for a chip in a given year
    pub fn row(&self, year: i32, chip_id: &str) -> Option<&ResultRow> {
        self.rows
            .iter()
            .find(|r| r.year == year && r.chip_id == chip_id)
    }

    pub fn summary(&self) -> ProjectionSummary {
        let mut summary = ProjectionSummary {
            rows: self.rows.len(),
            scenario_errors: self.errors.len(),
            ..Default::default()
        };
        for row in &self.rows {
            if row.has_errors() {
                summary.rows_with_errors += 1;
            }
            if row.total.is_none() {
                summary.undefined_totals += 1;
            }
            for err in &row.errors {
                if err.is_missing_reference() {
                    summary.missing_references += 1;
                } else {
                    summary.other_row_errors += 1;
                }
            }
        }
        summary
    }
}

/// Project one scenario of `doc`
///
/// Rows are ordered by year, then by chip in document order.
pub fn project_scenario(doc: &Document, scenario_id: &str, options: &ProjectionOptions) -> Projection {
    let _span = tracing::debug_span!("project", scenario = scenario_id).entered();

    let mut projection = Projection::empty(scenario_id, options, input_digest(doc, scenario_id, options));

    let Some(scenario) = doc.scenario(scenario_id) else {
        projection.errors.push(ScenarioError::NotFound {
            scenario: scenario_id.to_string(),
        });
        return projection;
    };
    projection.scenario_name = Some(scenario.name.clone());

    if !scenario.is_valid() {
        projection.errors.push(ScenarioError::Configuration {
            scenario: scenario.id.clone(),
            start_year: scenario.start_year,
            end_year: scenario.end_year,
        });
        return projection;
    }

    let index = DocumentIndex::build(doc);
    let model = match select_model(&index, scenario, options) {
        Ok(model) => model,
        Err(err) => {
            projection.errors.push(err);
            return projection;
        }
    };
    projection.model_id = Some(model.id.clone());
    projection.model_formula = Some(model.formula);

    debug!(
        model = %model.id,
        years = scenario.year_count(),
        chips = doc.chips.len(),
        "projecting scenario"
    );

    for year in scenario.years() {
        for chip in doc.chips.iter().filter(|c| c.is_active_in(year)) {
            projection
                .rows
                .push(build_row(doc, &index, scenario, &model, chip, year, options));
        }
    }

    debug!(rows = projection.rows.len(), "projection complete");
    projection
}

fn select_model<'a>(
    index: &DocumentIndex<'a>,
    scenario: &Scenario,
    options: &ProjectionOptions,
) -> Result<Cow<'a, YieldModel>, ScenarioError> {
    if let Some(id) = &options.model_override {
        return lookup_model(index, id).ok_or_else(|| ScenarioError::UnknownYieldModel {
            model: id.clone(),
        });
    }

    if let Some(model) = scenario.model.as_deref().and_then(|id| lookup_model(index, id)) {
        return Ok(model);
    }

    match index.fallback_model() {
        Some(fallback) => {
            warn!(
                scenario = %scenario.id,
                requested = scenario.model.as_deref().unwrap_or("<none>"),
                fallback = %fallback.id,
                "scenario model not found, using first configured model"
            );
            Ok(Cow::Borrowed(fallback))
        }
        None => Err(ScenarioError::UnknownYieldModel {
            model: scenario.model.clone().unwrap_or_else(|| "<none>".to_string()),
        }),
    }
}

/// A configured model by id, else a bare library formula
fn lookup_model<'a>(index: &DocumentIndex<'a>, id: &str) -> Option<Cow<'a, YieldModel>> {
    index
        .model(id)
        .map(Cow::Borrowed)
        .or_else(|| {
            id.parse::<YieldFormula>()
                .ok()
                .map(|f| Cow::Owned(YieldModel::from_formula(f)))
        })
}

fn build_row(
    doc: &Document,
    index: &DocumentIndex<'_>,
    scenario: &Scenario,
    model: &YieldModel,
    chip: &ChipType,
    year: i32,
    options: &ProjectionOptions,
) -> ResultRow {
    let mut errors = Vec::new();

    let family = index.family(&chip.family);
    if family.is_none() {
        errors.push(RowError::MissingFamily {
            family: chip.family.clone(),
        });
    }

    let mut technologies = Vec::new();
    for id in chip.unique_technologies() {
        match index.technology(id) {
            Some(tech) => technologies.push(tech),
            None => errors.push(RowError::MissingTechnology {
                technology: id.to_string(),
            }),
        }
    }

    let y_idx = options.year_indexing.index(year, scenario.start_year);
    let defect_density = match family {
        Some(fam) => {
            let density = fam.defect_density_with(y_idx, scenario.decay_override);
            if fam.has_finite_parameters() && density.is_finite() {
                Some(density)
            } else {
                errors.push(RowError::InvalidFamilyParameters {
                    family: fam.id.clone(),
                });
                None
            }
        }
        None => None,
    };

    let fab_base = defect_density
        .map(|d| model.probability(d, chip.die_area_mm2))
        .filter(|p| {
            let finite = p.is_finite();
            if !finite {
                errors.push(RowError::NonFiniteYield { stage: Stage::Fab });
            }
            finite
        });

    let mut stages: Vec<StageYield> = Stage::all()
        .iter()
        .map(|&stage| {
            let base = match stage {
                Stage::Fab => fab_base,
                _ => Some(scenario.baseline(stage, year, &doc.plant)),
            };
            compose(
                stage,
                base,
                technologies.iter().copied(),
                year,
                options.composition,
            )
        })
        .collect();

    // A NaN extra or baseline must not leak into the output
    for stage in &mut stages {
        if stage.value.is_some_and(|v| !v.is_finite()) {
            stage.value = None;
            errors.push(RowError::NonFiniteYield { stage: stage.stage });
        }
    }

    let total = stages
        .iter()
        .map(|s| s.value)
        .product::<Option<f64>>()
        .map(clamp01);

    ResultRow {
        year,
        chip_id: chip.id.clone(),
        chip_name: chip.name.clone(),
        package: chip.package.clone(),
        family_id: chip.family.clone(),
        family_name: family.map(|f| f.name.clone()),
        die_area_mm2: chip.die_area_mm2,
        defect_density,
        stages,
        total,
        errors,
    }
}

/// Hex SHA-256 over the canonical JSON of the inputs
///
/// Non-finite floats serialize as `null`.
fn input_digest(doc: &Document, scenario_id: &str, options: &ProjectionOptions) -> String {
    let canonical = serde_json::to_vec(&(doc, scenario_id, options)).unwrap_or_else(|e| {
        warn!(error = %e, "cannot serialize projection inputs, digest covers no input");
        Vec::new()
    });
    format!("{:x}", Sha256::digest(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::TechnologyOverride;
    use crate::entities::family::Family;
    use crate::entities::technology::Technology;

    /// One Poisson model, one family with D = 1, one 100 mm² chip
    fn reference_doc() -> Document {
        let mut doc = Document::default();
        let mut scn = Scenario::new("SCN-1", "Reference", 2026, 2026);
        scn.model = Some("YM-P".to_string());
        doc.scenarios.push(scn);
        doc.models
            .push(YieldModel::new("YM-P", "Poisson", YieldFormula::Poisson));
        doc.families.push(Family::new("FAM-A", "Alpha", 1.0, 0.0, 0.0));
        doc.chips
            .push(ChipType::new("CHIP-1", "Reference die", "FAM-A", 100.0));
        doc
    }

    fn run(doc: &Document) -> Projection {
        project_scenario(doc, "SCN-1", &ProjectionOptions::default())
    }

    #[test]
    fn test_reference_poisson_row() {
        let p = run(&reference_doc());
        assert!(p.errors.is_empty());
        assert_eq!(p.rows.len(), 1);

        let row = &p.rows[0];
        assert_eq!(row.year, 2026);
        assert_eq!(row.family_name.as_deref(), Some("Alpha"));
        let fab = row.stage_value(Stage::Fab).unwrap();
        assert!((fab - 0.3679).abs() < 1e-4);
        // Unconfigured stages lose nothing
        assert!((row.total.unwrap() - fab).abs() < 1e-12);
        assert_eq!(row.stages.len(), Stage::all().len());
    }

    #[test]
    fn test_invalid_window_yields_single_configuration_error() {
        let mut doc = reference_doc();
        doc.scenarios[0].start_year = 2030;
        doc.scenarios[0].end_year = 2020;

        let p = run(&doc);
        assert!(p.rows.is_empty());
        assert_eq!(p.errors.len(), 1);
        assert!(matches!(p.errors[0], ScenarioError::Configuration { .. }));
    }

    #[test]
    fn test_unknown_scenario() {
        let p = project_scenario(&reference_doc(), "SCN-404", &ProjectionOptions::default());
        assert!(p.rows.is_empty());
        assert!(matches!(p.errors[0], ScenarioError::NotFound { .. }));
    }

    #[test]
    fn test_special_start_year_gates_rows() {
        let mut doc = reference_doc();
        doc.scenarios[0].end_year = 2030;
        let mut late = ChipType::new("CHIP-2", "Late die", "FAM-A", 50.0);
        late.special_start_year = Some(2028);
        doc.chips.push(late);

        let p = run(&doc);
        for row in p.rows.iter().filter(|r| r.chip_id == "CHIP-2") {
            assert!(row.year >= 2028);
        }
        assert!(p.row(2027, "CHIP-2").is_none());
        assert!(p.row(2028, "CHIP-2").is_some());
        assert!(p.row(2030, "CHIP-2").is_some());
        // 5 years of CHIP-1 + 3 years of CHIP-2
        assert_eq!(p.rows.len(), 8);
    }

    #[test]
    fn test_rows_ordered_by_year_then_document_order() {
        let mut doc = reference_doc();
        doc.scenarios[0].end_year = 2027;
        doc.chips
            .push(ChipType::new("CHIP-0", "Second in doc", "FAM-A", 10.0));

        let p = run(&doc);
        let keys: Vec<(i32, &str)> = p
            .rows
            .iter()
            .map(|r| (r.year, r.chip_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2026, "CHIP-1"),
                (2026, "CHIP-0"),
                (2027, "CHIP-1"),
                (2027, "CHIP-0"),
            ]
        );
    }

    #[test]
    fn test_missing_family_emits_row_with_null_total() {
        let mut doc = reference_doc();
        doc.chips[0].family = "FAM-GONE".to_string();

        let p = run(&doc);
        assert_eq!(p.rows.len(), 1);
        let row = &p.rows[0];
        assert_eq!(row.stage_value(Stage::Fab), None);
        assert_eq!(row.total, None);
        assert_eq!(
            row.errors,
            vec![RowError::MissingFamily {
                family: "FAM-GONE".to_string()
            }]
        );
        // Other stages are still computed
        assert_eq!(row.stage_value(Stage::Saw), Some(1.0));
    }

    #[test]
    fn test_missing_technology_does_not_block_others() {
        let mut doc = reference_doc();
        doc.technologies
            .push(Technology::fixed("TECH-A", "Anneal", Stage::Fab, 10.0));
        doc.chips[0].technologies = vec!["TECH-A".to_string(), "TECH-GONE".to_string()];

        let row = run(&doc).rows.remove(0);
        assert_eq!(row.errors.len(), 1);
        assert!(matches!(row.errors[0], RowError::MissingTechnology { .. }));
        let expected = (-1.0_f64).exp() * 1.1;
        assert!((row.stage_value(Stage::Fab).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_technology_applied_once() {
        let mut doc = reference_doc();
        doc.technologies
            .push(Technology::fixed("TECH-A", "Anneal", Stage::Fab, 10.0));
        doc.chips[0].technologies = vec!["TECH-A".to_string(), "TECH-A".to_string()];

        let row = run(&doc).rows.remove(0);
        let fab = row.stage(Stage::Fab).unwrap();
        assert_eq!(fab.contributions.len(), 1);
        assert_eq!(fab.total_extra, 10.0);
    }

    #[test]
    fn test_dynamic_technology_across_years() {
        let mut doc = reference_doc();
        doc.scenarios[0].start_year = 2025;
        doc.scenarios[0].end_year = 2030;
        doc.technologies.push(Technology::yearly(
            "TECH-D",
            "Litho",
            Stage::Epi,
            7.0,
            [(2026, -10.0)],
        ));
        doc.technology_overrides.push(TechnologyOverride {
            technology: "TECH-D".to_string(),
            year: 2029,
            extra_yield: -20.0,
        });
        doc.plant.stages.insert(Stage::Epi, 0.5);
        doc.chips[0].technologies = vec!["TECH-D".to_string()];

        let p = run(&doc);
        let epi = |year| p.row(year, "CHIP-1").unwrap().stage_value(Stage::Epi).unwrap();
        assert!((epi(2025) - 0.5).abs() < 1e-12);
        assert!((epi(2026) - 0.45).abs() < 1e-12);
        assert!((epi(2028) - 0.45).abs() < 1e-12);
        assert!((epi(2030) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_all_values_in_unit_interval() {
        let mut doc = reference_doc();
        doc.scenarios[0].end_year = 2035;
        doc.families[0] = Family::new("FAM-A", "Alpha", 0.05, 2.0, 0.4);
        doc.technologies
            .push(Technology::fixed("TECH-UP", "Boost", Stage::Fab, 500.0));
        doc.technologies
            .push(Technology::fixed("TECH-DOWN", "Drag", Stage::Saw, -500.0));
        doc.chips[0].technologies = vec!["TECH-UP".to_string(), "TECH-DOWN".to_string()];
        doc.chips
            .push(ChipType::new("CHIP-ORPHAN", "Orphan", "FAM-X", 30.0));

        for row in run(&doc).rows {
            for stage in &row.stages {
                if let Some(v) = stage.value {
                    assert!((0.0..=1.0).contains(&v));
                }
            }
            if let Some(t) = row.total {
                assert!((0.0..=1.0).contains(&t));
            }
        }
    }

    #[test]
    fn test_audit_trail_replays_stage_values() {
        let mut doc = reference_doc();
        doc.scenarios[0].end_year = 2030;
        doc.technologies
            .push(Technology::fixed("TECH-A", "Anneal", Stage::Fab, 3.5));
        doc.technologies.push(Technology::yearly(
            "TECH-D",
            "Litho",
            Stage::Fab,
            0.0,
            [(2027, 1.25), (2029, 4.0)],
        ));
        doc.chips[0].technologies = vec!["TECH-A".to_string(), "TECH-D".to_string()];

        for row in run(&doc).rows {
            for stage in &row.stages {
                let base = stage.base.unwrap();
                let sum: f64 = stage.contributions.iter().map(|c| c.extra).sum();
                let replayed = clamp01(base * (1.0 + sum / 100.0));
                assert!((replayed - stage.value.unwrap()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_model_fallback_to_first_configured() {
        let mut doc = reference_doc();
        doc.scenarios[0].model = Some("YM-MISSING".to_string());
        doc.models.insert(0, YieldModel::new("YM-M", "Murphy", YieldFormula::Murphy));

        let p = run(&doc);
        assert!(p.errors.is_empty());
        assert_eq!(p.model_id.as_deref(), Some("YM-M"));
        let expected = 1.0 - (-1.0_f64).exp();
        assert!((p.rows[0].stage_value(Stage::Fab).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_no_models_at_all_is_fatal() {
        let mut doc = reference_doc();
        doc.models.clear();

        let p = run(&doc);
        assert!(p.rows.is_empty());
        assert_eq!(
            p.errors,
            vec![ScenarioError::UnknownYieldModel {
                model: "YM-P".to_string()
            }]
        );
    }

    #[test]
    fn test_model_override_by_formula_and_unknown() {
        let doc = reference_doc();
        let opts = ProjectionOptions {
            model_override: Some("seeds_fixed_loss".to_string()),
            ..Default::default()
        };
        let p = project_scenario(&doc, "SCN-1", &opts);
        assert_eq!(p.model_formula, Some(YieldFormula::SeedsFixedLoss));
        assert!((p.rows[0].stage_value(Stage::Fab).unwrap() - (-0.92_f64).exp()).abs() < 1e-12);

        let opts = ProjectionOptions {
            model_override: Some("YM-NOPE".to_string()),
            ..Default::default()
        };
        let p = project_scenario(&doc, "SCN-1", &opts);
        assert!(p.rows.is_empty());
        assert!(matches!(p.errors[0], ScenarioError::UnknownYieldModel { .. }));
    }

    #[test]
    fn test_year_indexing_changes_density() {
        let mut doc = reference_doc();
        doc.families[0] = Family::new("FAM-A", "Alpha", 0.0, 1.0, 1.0);

        let relative = run(&doc);
        assert!((relative.rows[0].defect_density.unwrap() - 1.0).abs() < 1e-12);

        let opts = ProjectionOptions {
            year_indexing: YearIndexing::RelativePlusOne,
            ..Default::default()
        };
        let shifted = project_scenario(&doc, "SCN-1", &opts);
        let expected = (-1.0_f64).exp();
        assert!((shifted.rows[0].defect_density.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_decay_override_from_scenario() {
        let mut doc = reference_doc();
        doc.scenarios[0].end_year = 2028;
        doc.families[0] = Family::new("FAM-A", "Alpha", 0.1, 1.0, 1.0);
        doc.scenarios[0].decay_override = Some(0.0);

        for row in run(&doc).rows {
            assert!((row.defect_density.unwrap() - 1.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_family_parameters() {
        let mut doc = reference_doc();
        doc.families[0].d0 = f64::NAN;

        let row = run(&doc).rows.remove(0);
        assert_eq!(row.defect_density, None);
        assert_eq!(row.total, None);
        assert!(matches!(row.errors[0], RowError::InvalidFamilyParameters { .. }));
    }

    #[test]
    fn test_non_finite_extra_marks_stage() {
        let mut doc = reference_doc();
        doc.technologies
            .push(Technology::fixed("TECH-N", "Broken", Stage::Fab, f64::NAN));
        doc.chips[0].technologies = vec!["TECH-N".to_string()];

        let row = run(&doc).rows.remove(0);
        assert_eq!(row.stage_value(Stage::Fab), None);
        assert_eq!(row.total, None);
        assert!(row
            .errors
            .iter()
            .any(|e| matches!(e, RowError::NonFiniteYield { stage: Stage::Fab })));
    }

    #[test]
    fn test_non_finite_baseline_marks_stage() {
        let mut doc = reference_doc();
        doc.plant = serde_yml::from_str("stages:\n  saw: .nan\n").unwrap();
        assert!(doc.plant.get(Stage::Saw).unwrap().is_nan());

        let p = run(&doc);
        let row = &p.rows[0];
        assert_eq!(row.stage_value(Stage::Saw), None);
        assert!(row.stage_value(Stage::Fab).is_some());
        assert_eq!(row.total, None);
        assert_eq!(row.errors.len(), 1);
        assert!(matches!(
            row.errors[0],
            RowError::NonFiniteYield { stage: Stage::Saw }
        ));
        assert_eq!(p.input_digest.len(), 64);
    }

    #[test]
    fn test_identical_inputs_identical_outputs() {
        let doc = reference_doc();
        let a = run(&doc);
        let b = run(&doc);
        assert_eq!(a, b);
        assert_eq!(a.input_digest.len(), 64);

        let mut changed = doc.clone();
        changed.chips[0].die_area_mm2 = 101.0;
        assert_ne!(run(&changed).input_digest, a.input_digest);
    }

    #[test]
    fn test_summary_counts() {
        let mut doc = reference_doc();
        doc.chips
            .push(ChipType::new("CHIP-2", "Orphan", "FAM-X", 10.0));
        doc.chips[1].technologies = vec!["TECH-X".to_string()];

        let summary = run(&doc).summary();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.rows_with_errors, 1);
        assert_eq!(summary.missing_references, 2);
        assert_eq!(summary.undefined_totals, 1);
        assert_eq!(summary.scenario_errors, 0);
    }
}
