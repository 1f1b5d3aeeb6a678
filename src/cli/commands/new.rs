//! `yld new` command - create an entity file from a template

use chrono::Datelike;
use clap::ValueEnum;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::require_project;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::entity::Stage;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::yield_model::YieldFormula;
use crate::schema::template::{TemplateContext, TemplateGenerator};

#[derive(clap::Args, Debug, Default)]
pub struct NewArgs {
    /// Kind of entity to create
    #[arg(value_enum)]
    pub kind: NewKind,

    /// Identity (default: generated PREFIX-ULID)
    #[arg(long)]
    pub id: Option<String>,

    /// Display name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Family: mature defect density floor (defects / cm²)
    #[arg(long)]
    pub d0: Option<f64>,

    /// Family: initial excess defect density
    #[arg(long)]
    pub d_in: Option<f64>,

    /// Family: decay constant
    #[arg(long)]
    pub t: Option<f64>,

    /// Chip: owning family id
    #[arg(long)]
    pub family: Option<String>,

    /// Chip: package name
    #[arg(long)]
    pub package: Option<String>,

    /// Chip: die area in mm²
    #[arg(long)]
    pub area: Option<f64>,

    /// Chip: first production year
    #[arg(long)]
    pub from_year: Option<i32>,

    /// Chip: technology ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub technologies: Vec<String>,

    /// Technology: stage it adjusts (fab, epi, saw, kgd, osat)
    #[arg(long)]
    pub stage: Option<Stage>,

    /// Technology: extra yield in percentage points (nominal value when dynamic)
    #[arg(long, allow_hyphen_values = true)]
    pub extra: Option<f64>,

    /// Technology: per-year overrides instead of a fixed value
    #[arg(long)]
    pub dynamic: bool,

    /// Model: library formula
    #[arg(long)]
    pub formula: Option<YieldFormula>,

    /// Scenario: first year
    #[arg(long)]
    pub start: Option<i32>,

    /// Scenario: last year
    #[arg(long)]
    pub end: Option<i32>,

    /// Scenario: yield model id
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Prompt for values not given as flags
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NewKind {
    #[default]
    Family,
    Chip,
    Technology,
    Model,
    Scenario,
}

impl NewKind {
    fn prefix(self) -> EntityPrefix {
        match self {
            NewKind::Family => EntityPrefix::Fam,
            NewKind::Chip => EntityPrefix::Chip,
            NewKind::Technology => EntityPrefix::Tech,
            NewKind::Model => EntityPrefix::Ym,
            NewKind::Scenario => EntityPrefix::Scn,
        }
    }

    fn label(self) -> &'static str {
        match self {
            NewKind::Family => "family",
            NewKind::Chip => "chip",
            NewKind::Technology => "technology",
            NewKind::Model => "model",
            NewKind::Scenario => "scenario",
        }
    }
}

pub fn run(mut args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = require_project(global)?;
    let config = Config::load_for(Some(&project));

    if args.interactive {
        prompt_missing(&mut args)?;
    }

    let prefix = args.kind.prefix();
    let id = args
        .id
        .clone()
        .unwrap_or_else(|| EntityId::new(prefix).to_string());

    let ctx = context(&args, &id, config.author());
    let content = TemplateGenerator::new()?.generate(prefix, &ctx)?;

    let path = project.entity_path(prefix, &id);
    if path.exists() && !args.force {
        return Err(miette::miette!(
            help = "pass --force to overwrite it",
            "{} already exists",
            path.display()
        ));
    }
    std::fs::write(&path, content).into_diagnostic()?;
    tracing::debug!(path = %path.display(), "wrote entity file");

    if !global.quiet {
        println!(
            "{} Created {} {}",
            style("✓").green(),
            args.kind.label(),
            style(&id).cyan()
        );
        println!("   {}", style(path.display()).dim());
    }
    Ok(())
}

/// Template context for `args`, filling defaults for anything not given
fn context(args: &NewArgs, id: &str, author: String) -> TemplateContext {
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("New {}", args.kind.label()));
    let ctx = TemplateContext::new(id, name, author);

    match args.kind {
        NewKind::Family => ctx.with_defects(
            args.d0.unwrap_or(0.1),
            args.d_in.unwrap_or(0.5),
            args.t.unwrap_or(0.3),
        ),
        NewKind::Chip => {
            let mut ctx = ctx
                .with_package(args.package.clone().unwrap_or_default())
                .with_die_area(args.area.unwrap_or(10.0))
                .with_special_start_year(args.from_year)
                .with_technologies(args.technologies.clone());
            if let Some(family) = &args.family {
                ctx = ctx.with_family(family);
            }
            ctx
        }
        NewKind::Technology => ctx
            .with_stage(args.stage.unwrap_or(Stage::Fab))
            .with_extra_yield(args.extra.unwrap_or(0.0), args.dynamic),
        NewKind::Model => ctx.with_formula(args.formula.unwrap_or(YieldFormula::SeedsFixedLoss)),
        NewKind::Scenario => {
            let start = args.start.unwrap_or_else(|| chrono::Utc::now().year());
            let end = args.end.unwrap_or(start + 4);
            ctx.with_window(start, end).with_model(args.model.clone())
        }
    }
}

fn prompt_missing(args: &mut NewArgs) -> Result<()> {
    let theme = ColorfulTheme::default();

    println!();
    println!(
        "{} Creating new {}",
        style("◆").cyan(),
        style(args.kind.label()).bold()
    );
    println!("{}", style("─".repeat(50)).dim());

    if args.name.is_none() {
        let name: String = Input::with_theme(&theme)
            .with_prompt("Name")
            .default(format!("New {}", args.kind.label()))
            .interact_text()
            .into_diagnostic()?;
        args.name = Some(name);
    }

    let number = |prompt: &str, default: f64| -> Result<f64> {
        Input::with_theme(&theme)
            .with_prompt(prompt)
            .default(default)
            .interact_text()
            .into_diagnostic()
    };

    match args.kind {
        NewKind::Family => {
            if args.d0.is_none() {
                args.d0 = Some(number("D0 (defects / cm²)", 0.1)?);
            }
            if args.d_in.is_none() {
                args.d_in = Some(number("D_in (defects / cm²)", 0.5)?);
            }
            if args.t.is_none() {
                args.t = Some(number("Decay constant t", 0.3)?);
            }
        }
        NewKind::Chip => {
            if args.family.is_none() {
                let family: String = Input::with_theme(&theme)
                    .with_prompt("Family id")
                    .interact_text()
                    .into_diagnostic()?;
                args.family = Some(family);
            }
            if args.area.is_none() {
                args.area = Some(number("Die area (mm²)", 10.0)?);
            }
        }
        NewKind::Technology => {
            if args.stage.is_none() {
                let stages = Stage::all();
                let names: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
                let choice = Select::with_theme(&theme)
                    .with_prompt("Stage")
                    .items(&names)
                    .default(0)
                    .interact()
                    .into_diagnostic()?;
                args.stage = Some(stages[choice]);
            }
            if !args.dynamic {
                args.dynamic = Confirm::with_theme(&theme)
                    .with_prompt("Year-by-year overrides?")
                    .default(false)
                    .interact()
                    .into_diagnostic()?;
            }
            if args.extra.is_none() {
                args.extra = Some(number("Extra yield (%)", 0.0)?);
            }
        }
        NewKind::Model => {
            if args.formula.is_none() {
                let formulas = YieldFormula::all();
                let items: Vec<String> = formulas
                    .iter()
                    .map(|f| format!("{:<18} {}", f.as_str(), f.expression()))
                    .collect();
                let choice = Select::with_theme(&theme)
                    .with_prompt("Formula")
                    .items(&items)
                    .default(0)
                    .interact()
                    .into_diagnostic()?;
                args.formula = Some(formulas[choice]);
            }
        }
        NewKind::Scenario => {
            let this_year = chrono::Utc::now().year();
            if args.start.is_none() {
                let start: i32 = Input::with_theme(&theme)
                    .with_prompt("First year")
                    .default(this_year)
                    .interact_text()
                    .into_diagnostic()?;
                args.start = Some(start);
            }
            if args.end.is_none() {
                let end: i32 = Input::with_theme(&theme)
                    .with_prompt("Last year")
                    .default(args.start.unwrap_or(this_year) + 4)
                    .interact_text()
                    .into_diagnostic()?;
                args.end = Some(end);
            }
        }
    }
    Ok(())
}
