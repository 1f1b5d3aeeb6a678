//! `yld init` command - Initialize a new yield projection project

use console::style;
use miette::Result;
use std::path::{Path, PathBuf};

use crate::core::identity::EntityPrefix;
use crate::core::loader::{OVERRIDES_FILE, PLANT_FILE};
use crate::core::project::{Project, ProjectError, PROJECT_DIR};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Rewrite the configuration even if .yld/ already exists
    #[arg(long)]
    pub force: bool,

    /// Add a worked example (models, a family, technologies, chips, a scenario)
    #[arg(long)]
    pub seed: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let project = match Project::init(&args.path, args.force) {
        Ok(project) => project,
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} yld project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("yld init --force").yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(root = %project.root().display(), "initialized project");

    println!(
        "{} Initialized yld project at {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );

    if args.seed {
        let written = project.write_seed()?;
        println!(
            "{} Added {} example file(s)",
            style("✓").green(),
            style(written.len()).cyan()
        );
    }

    println!();
    println!("Created project structure:");
    print_structure(project.root());
    println!();
    println!("Next steps:");
    if args.seed {
        println!("  {} Project the example scenario", style("yld calc SCN-BASE").yellow());
        println!(
            "  {} Trace one row",
            style("yld explain SCN-BASE --chip PMIC-88 --year 2029").yellow()
        );
    } else {
        println!("  {} Define a product family", style("yld new family").yellow());
        println!("  {} Add a chip type", style("yld new chip --family FAM-...").yellow());
    }
    println!("  {} Validate project files", style("yld validate").yellow());
    Ok(())
}

fn print_structure(root: &Path) {
    let mut entries = vec![
        format!("{}/", PROJECT_DIR),
        format!("{}/config.yaml", PROJECT_DIR),
        PLANT_FILE.to_string(),
        OVERRIDES_FILE.to_string(),
    ];
    entries.extend(EntityPrefix::all().iter().map(|p| format!("{}/", p.dir_name())));

    for entry in entries {
        if root.join(&entry).exists() {
            let marker = if entry.ends_with('/') { "+" } else { "-" };
            println!("  {} {}", marker, style(entry).dim());
        }
    }
}
