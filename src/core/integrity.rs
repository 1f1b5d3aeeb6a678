//! Reference-integrity checks over a whole document
//!
//! The engine tolerates dangling references by recording row errors; these
//! checks surface the same problems up front, plus a few that never reach a
//! row (duplicate ids, unused override rows).

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::core::document::Document;
use crate::core::entity::Entity;
use crate::entities::technology::ExtraYield;
use crate::entities::yield_model::YieldFormula;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding, attributed to the entity it was found on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityIssue {
    pub severity: Severity,
    pub entity: String,
    pub message: String,
}

impl IntegrityIssue {
    fn error(entity: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    fn warning(entity: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            entity: entity.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.entity, self.message)
    }
}

fn duplicates<'a, E: Entity + 'a>(items: impl IntoIterator<Item = &'a E>, issues: &mut Vec<IntegrityIssue>) {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id()) {
            issues.push(IntegrityIssue::error(
                item.id(),
                format!("duplicate {} id (the first definition is used)", E::PREFIX),
            ));
        }
    }
}

/// Check every cross-entity reference in `doc`
pub fn check_document(doc: &Document) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    duplicates(&doc.scenarios, &mut issues);
    duplicates(&doc.families, &mut issues);
    duplicates(&doc.chips, &mut issues);
    duplicates(&doc.technologies, &mut issues);
    duplicates(&doc.models, &mut issues);

    let families: HashSet<&str> = doc.families.iter().map(|f| f.id.as_str()).collect();
    let models: HashSet<&str> = doc.models.iter().map(|m| m.id.as_str()).collect();
    let technologies: HashMap<&str, &ExtraYield> = doc
        .technologies
        .iter()
        .map(|t| (t.id.as_str(), &t.extra_yield))
        .collect();

    for scenario in &doc.scenarios {
        if !scenario.is_valid() {
            issues.push(IntegrityIssue::error(
                &scenario.id,
                format!(
                    "start_year {} is after end_year {}",
                    scenario.start_year, scenario.end_year
                ),
            ));
        }
        match scenario.model.as_deref() {
            Some(model) if models.contains(model) || model.parse::<YieldFormula>().is_ok() => {}
            Some(model) if doc.models.is_empty() => issues.push(IntegrityIssue::error(
                &scenario.id,
                format!("model '{}' not found and no models configured", model),
            )),
            Some(model) => issues.push(IntegrityIssue::warning(
                &scenario.id,
                format!("model '{}' not found, the first configured model will be used", model),
            )),
            None if doc.models.is_empty() => issues.push(IntegrityIssue::error(
                &scenario.id,
                "no model selected and no models configured",
            )),
            None => {}
        }
    }

    for family in &doc.families {
        if !family.has_finite_parameters() {
            issues.push(IntegrityIssue::error(&family.id, "defect parameters must be finite numbers"));
        }
    }

    for chip in &doc.chips {
        if !families.contains(chip.family.as_str()) {
            issues.push(IntegrityIssue::error(
                &chip.id,
                format!("family '{}' not found", chip.family),
            ));
        }
        for tech in chip.unique_technologies() {
            if !technologies.contains_key(tech) {
                issues.push(IntegrityIssue::error(
                    &chip.id,
                    format!("technology '{}' not found", tech),
                ));
            }
        }
        if chip.unique_technologies().len() != chip.technologies.len() {
            issues.push(IntegrityIssue::warning(
                &chip.id,
                "technology listed more than once (applied once)",
            ));
        }
        if chip.die_area_mm2 <= 0.0 {
            issues.push(IntegrityIssue::warning(&chip.id, "die area is not positive"));
        }
    }

    for row in &doc.technology_overrides {
        match technologies.get(row.technology.as_str()) {
            None => issues.push(IntegrityIssue::error(
                &row.technology,
                format!("override row for {} references an unknown technology", row.year),
            )),
            Some(ExtraYield::Static { .. }) => issues.push(IntegrityIssue::warning(
                &row.technology,
                format!("override row for {} is ignored, the technology is static", row.year),
            )),
            Some(ExtraYield::Dynamic { .. }) => {}
        }
    }

    for tech in &doc.technologies {
        if let ExtraYield::Dynamic { overrides, .. } = &tech.extra_yield {
            let has_rows = doc.technology_overrides.iter().any(|r| r.technology == tech.id);
            if overrides.is_empty() && !has_rows {
                issues.push(IntegrityIssue::warning(
                    &tech.id,
                    "dynamic technology has no yearly overrides and always contributes 0",
                ));
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::TechnologyOverride;
    use crate::core::entity::Stage;
    use crate::entities::chip::ChipType;
    use crate::entities::family::Family;
    use crate::entities::scenario::Scenario;
    use crate::entities::technology::Technology;
    use crate::entities::yield_model::YieldModel;

    fn clean_doc() -> Document {
        let mut doc = Document::default();
        doc.models.push(YieldModel::new("YM-P", "Poisson", YieldFormula::Poisson));
        doc.families.push(Family::new("FAM-A", "A", 0.1, 0.5, 0.3));
        doc.technologies
            .push(Technology::fixed("TECH-S", "Clip", Stage::Osat, 0.5));
        let mut chip = ChipType::new("CHIP-1", "Die", "FAM-A", 10.0);
        chip.technologies = vec!["TECH-S".to_string()];
        doc.chips.push(chip);
        let mut scn = Scenario::new("SCN-1", "Base", 2026, 2030);
        scn.model = Some("YM-P".to_string());
        doc.scenarios.push(scn);
        doc
    }

    #[test]
    fn test_clean_document() {
        assert!(check_document(&clean_doc()).is_empty());
    }

    #[test]
    fn test_dangling_references() {
        let mut doc = clean_doc();
        doc.chips[0].family = "FAM-X".to_string();
        doc.chips[0].technologies.push("TECH-X".to_string());

        let issues = check_document(&doc);
        assert_eq!(issues.iter().filter(|i| i.is_error()).count(), 2);
        assert!(issues.iter().all(|i| i.entity == "CHIP-1"));
    }

    #[test]
    fn test_duplicates_and_bounds() {
        let mut doc = clean_doc();
        doc.families.push(Family::new("FAM-A", "Again", 0.1, 0.5, 0.3));
        doc.scenarios[0].end_year = 2020;

        let messages: Vec<String> = check_document(&doc).iter().map(|i| i.to_string()).collect();
        assert!(messages.iter().any(|m| m.contains("duplicate FAM id")));
        assert!(messages.iter().any(|m| m.contains("after end_year")));
    }

    #[test]
    fn test_model_reference_falls_back() {
        let mut doc = clean_doc();
        doc.scenarios[0].model = Some("YM-GONE".to_string());
        let issues = check_document(&doc);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);

        doc.scenarios[0].model = Some("murphy".to_string());
        assert!(check_document(&doc).is_empty());
    }

    #[test]
    fn test_unresolved_model_without_models_is_error() {
        let mut doc = clean_doc();
        doc.models.clear();
        doc.scenarios[0].model = Some("YM-GONE".to_string());
        let issues = check_document(&doc);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
        assert!(issues[0].message.contains("no models configured"));

        // A formula tag still resolves without any configured model
        doc.scenarios[0].model = Some("poisson".to_string());
        assert!(check_document(&doc).is_empty());
    }

    #[test]
    fn test_override_rows() {
        let mut doc = clean_doc();
        doc.technologies.push(Technology::yearly(
            "TECH-D",
            "Litho",
            Stage::Fab,
            1.0,
            Vec::<(i32, f64)>::new(),
        ));
        let issues = check_document(&doc);
        assert!(issues[0].message.contains("always contributes 0"));

        doc.technology_overrides = vec![
            TechnologyOverride { technology: "TECH-D".into(), year: 2027, extra_yield: 1.0 },
            TechnologyOverride { technology: "TECH-S".into(), year: 2027, extra_yield: 1.0 },
            TechnologyOverride { technology: "TECH-Z".into(), year: 2027, extra_yield: 1.0 },
        ];
        let issues = check_document(&doc);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.entity == "TECH-S" && !i.is_error()));
        assert!(issues.iter().any(|i| i.entity == "TECH-Z" && i.is_error()));
    }
}
