//! `yld validate` command - schema and reference-integrity checks

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::require_project;
use crate::cli::GlobalOpts;
use crate::core::document::Document;
use crate::core::identity::EntityPrefix;
use crate::core::integrity::{check_document, IntegrityIssue};
use crate::schema::validator::Validator;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Entity files to validate (default: every file in the project)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Show summary only, don't show individual findings
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Debug, Default, PartialEq)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    schema_errors: usize,
    integrity_errors: usize,
    warnings: usize,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let mut stats = ValidationStats::default();

    let document = match &global.document {
        // A single document file has no per-entity schemas to check
        Some(path) => Document::from_file(path)?,
        None => {
            let project = require_project(global)?;
            let files: Vec<PathBuf> = if args.paths.is_empty() {
                EntityPrefix::all()
                    .iter()
                    .flat_map(|p| project.entity_files(*p))
                    .collect()
            } else {
                args.paths.clone()
            };

            if !args.summary {
                println!(
                    "{} Validating {} file(s)...\n",
                    style("→").blue(),
                    files.len()
                );
            }
            check_schemas(&files, &args, &mut stats);

            match project.load_document() {
                Ok(doc) => doc,
                Err(e) => {
                    print_summary(&stats);
                    return Err(e.into());
                }
            }
        }
    };

    let issues = check_document(&document);
    tally_issues(&issues, &mut stats);
    if !args.summary && !issues.is_empty() {
        println!();
        println!("{}", style("References").bold());
        for issue in &issues {
            let marker = if issue.is_error() {
                style("✗").red()
            } else {
                style("!").yellow()
            };
            println!("{} {}", marker, issue);
        }
    }

    print_summary(&stats);

    let failures = stats.files_failed
        + stats.integrity_errors
        + if args.strict { stats.warnings } else { 0 };
    if failures > 0 {
        Err(miette::miette!(
            "Validation failed: {} schema error(s), {} reference error(s){}",
            stats.schema_errors,
            stats.integrity_errors,
            if args.strict {
                format!(", {} warning(s) in strict mode", stats.warnings)
            } else {
                String::new()
            }
        ))
    } else {
        if !global.quiet {
            println!("{} All checks passed!", style("✓").green().bold());
        }
        Ok(())
    }
}

fn check_schemas(files: &[PathBuf], args: &ValidateArgs, stats: &mut ValidationStats) {
    let validator = Validator::default();

    for path in files {
        match validator.validate_file(path) {
            Ok(None) => {
                if !args.summary {
                    println!(
                        "{} {} - unknown entity type (skipped)",
                        style("?").yellow(),
                        path.display()
                    );
                }
            }
            Ok(Some(Ok(()))) => {
                stats.files_checked += 1;
                stats.files_passed += 1;
                if !args.summary {
                    println!("{} {}", style("✓").green(), path.display());
                }
            }
            Ok(Some(Err(e))) => {
                stats.files_checked += 1;
                stats.files_failed += 1;
                stats.schema_errors += e.violation_count();
                if !args.summary {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        path.display(),
                        e.violation_count()
                    );
                    println!("{:?}", miette::Report::new(e));
                }
            }
            Err(e) => {
                stats.files_checked += 1;
                stats.files_failed += 1;
                stats.schema_errors += 1;
                if !args.summary {
                    println!("{} {} - {}", style("✗").red(), path.display(), e);
                }
            }
        }
    }
}

fn tally_issues(issues: &[IntegrityIssue], stats: &mut ValidationStats) {
    for issue in issues {
        if issue.is_error() {
            stats.integrity_errors += 1;
        } else {
            stats.warnings += 1;
        }
    }
}

fn print_summary(stats: &ValidationStats) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:    {}", style(stats.files_checked).cyan());
    println!("  Files passed:     {}", style(stats.files_passed).green());
    println!("  Files failed:     {}", style(stats.files_failed).red());
    println!("  Schema errors:    {}", style(stats.schema_errors).red());
    println!("  Reference errors: {}", style(stats.integrity_errors).red());
    if stats.warnings > 0 {
        println!("  Warnings:         {}", style(stats.warnings).yellow());
    }
    println!();
}
