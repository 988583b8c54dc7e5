//! `pcf init` command - Initialize a new forecast project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Overwrite the default files even if .pcf/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            tracing::info!(root = %project.root().display(), "initialized project");
            println!(
                "{} Initialized forecast project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Expected replacements and costs per part",
                style("pcf forecast").yellow()
            );
            println!(
                "  {} Units most likely to fail in the horizon",
                style("pcf rank --top-n 5").yellow()
            );
            println!(
                "  {} Edit the sample data",
                style("data/snapshot.yaml").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} Forecast project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("pcf init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let entries = [".pcf/", ".pcf/config.yaml", "data/", "data/snapshot.yaml"];

    for entry in entries {
        if root.join(entry).exists() {
            println!("  {}", style(entry).dim());
        }
    }
}
