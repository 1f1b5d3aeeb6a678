//! Template generation for new entity files

use chrono::{DateTime, Datelike, Utc};
use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

use crate::core::entity::Stage;
use crate::core::identity::EntityPrefix;
use crate::entities::yield_model::YieldFormula;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// Values substituted into an entity template
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub id: String,
    pub name: String,
    pub author: String,
    pub created: DateTime<Utc>,
    // FAM
    pub d0: Option<f64>,
    pub d_in: Option<f64>,
    pub t: Option<f64>,
    // CHIP
    pub family: Option<String>,
    pub package: Option<String>,
    pub die_area_mm2: Option<f64>,
    pub special_start_year: Option<i32>,
    pub technologies: Vec<String>,
    // TECH
    pub stage: Option<Stage>,
    pub extra_yield: Option<f64>,
    pub dynamic: bool,
    // YM
    pub formula: Option<YieldFormula>,
    // SCN
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub model: Option<String>,
}

impl TemplateContext {
    pub fn new(id: impl Into<String>, name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author: author.into(),
            created: Utc::now(),
            d0: None,
            d_in: None,
            t: None,
            family: None,
            package: None,
            die_area_mm2: None,
            special_start_year: None,
            technologies: Vec::new(),
            stage: None,
            extra_yield: None,
            dynamic: false,
            formula: None,
            start_year: None,
            end_year: None,
            model: None,
        }
    }

    pub fn with_defects(mut self, d0: f64, d_in: f64, t: f64) -> Self {
        self.d0 = Some(d0);
        self.d_in = Some(d_in);
        self.t = Some(t);
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_die_area(mut self, area_mm2: f64) -> Self {
        self.die_area_mm2 = Some(area_mm2);
        self
    }

    pub fn with_special_start_year(mut self, year: Option<i32>) -> Self {
        self.special_start_year = year;
        self
    }

    pub fn with_technologies(mut self, technologies: Vec<String>) -> Self {
        self.technologies = technologies;
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_extra_yield(mut self, extra: f64, dynamic: bool) -> Self {
        self.extra_yield = Some(extra);
        self.dynamic = dynamic;
        self
    }

    pub fn with_formula(mut self, formula: YieldFormula) -> Self {
        self.formula = Some(formula);
        self
    }

    pub fn with_window(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = Some(start_year);
        self.end_year = Some(end_year);
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Template generator using Tera
pub struct TemplateGenerator {
    tera: Tera,
}

#[derive(Debug, Error, miette::Diagnostic)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    #[diagnostic(code(yld::template::not_found))]
    NotFound(String),

    #[error("template rendering error: {0}")]
    #[diagnostic(code(yld::template::render))]
    RenderError(String),
}

impl TemplateGenerator {
    /// Create a generator over the embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    fn template_name(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Scn => "scenario.yaml.tera",
            EntityPrefix::Fam => "family.yaml.tera",
            EntityPrefix::Chip => "chip.yaml.tera",
            EntityPrefix::Tech => "technology.yaml.tera",
            EntityPrefix::Ym => "model.yaml.tera",
        }
    }

    /// Render the file body for a new entity of kind `prefix`
    pub fn generate(&self, prefix: EntityPrefix, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let name = Self::template_name(prefix);
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }

        let mut context = tera::Context::new();
        context.insert("id", &ctx.id);
        context.insert("name", &ctx.name);
        context.insert("author", &ctx.author);
        context.insert("created", &ctx.created.to_rfc3339());

        match prefix {
            EntityPrefix::Fam => {
                context.insert("d0", &ctx.d0.unwrap_or(0.1));
                context.insert("d_in", &ctx.d_in.unwrap_or(0.5));
                context.insert("t", &ctx.t.unwrap_or(0.3));
            }
            EntityPrefix::Chip => {
                context.insert("family", &ctx.family.clone().unwrap_or_else(|| "FAM-...".to_string()));
                context.insert("package", &ctx.package.clone().unwrap_or_default());
                context.insert("die_area_mm2", &ctx.die_area_mm2.unwrap_or(10.0));
                context.insert("special_start_year", &ctx.special_start_year);
                context.insert("technologies", &ctx.technologies);
            }
            EntityPrefix::Tech => {
                context.insert("stage", ctx.stage.unwrap_or(Stage::Fab).as_str());
                context.insert("extra_yield", &ctx.extra_yield.unwrap_or(0.0));
                context.insert("dynamic", &ctx.dynamic);
            }
            EntityPrefix::Ym => {
                let formula = ctx.formula.unwrap_or(YieldFormula::Poisson);
                context.insert("formula", formula.as_str());
                context.insert("expression", formula.expression());
            }
            EntityPrefix::Scn => {
                let this_year = ctx.created.year();
                let start = ctx.start_year.unwrap_or(this_year);
                context.insert("start_year", &start);
                context.insert("end_year", &ctx.end_year.unwrap_or(start + 4));
                context.insert("model", &ctx.model);
            }
        }

        self.tera
            .render(name, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}
