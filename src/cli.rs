use crate::config::load_config;
use crate::patcher::{PatchOutcome, SvgPatcher};
use crate::resolver::TableResolver;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pumlpatch",
    version,
    about = "Patch bare \\ref links in PlantUML-generated SVG files"
)]
pub struct Args {
    /// SVG files to patch in place
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Relative path prefix prepended to resolved links
    #[arg(short = 'r', long = "relPath", default_value = "")]
    pub rel_path: String,

    /// Scope used to qualify reference lookups
    #[arg(short = 's', long = "context", default_value = "")]
    pub context: String,

    /// JSON file mapping reference names to link targets
    #[arg(short = 'm', long = "refMap")]
    pub ref_map: Option<PathBuf>,

    /// Config JSON file (html extension, external URL base)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Print a per-file summary after patching
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let resolver = match args.ref_map.as_deref() {
        Some(path) => TableResolver::from_json_file(path)?,
        None => TableResolver::empty(),
    };

    for file in &args.files {
        let patcher = SvgPatcher::new(
            file,
            args.rel_path.as_str(),
            args.context.as_str(),
            &resolver,
            config.clone(),
        );
        let outcome = patcher.run()?;
        if args.verbose {
            println!("{}: {}", file.display(), describe_outcome(outcome));
        }
    }

    Ok(())
}

fn describe_outcome(outcome: PatchOutcome) -> String {
    match outcome {
        PatchOutcome::Untouched => "no bare refs".to_string(),
        PatchOutcome::Patched(stats) => format!(
            "{} resolved, {} unresolved, {} skipped",
            stats.resolved, stats.unresolved, stats.skipped
        ),
    }
}
