use crate::error::{InjectError, Result};
use crate::ops::{Directive, Preset, Rewrite, RewriteReport, Rewriter, Transaction};
use crate::ops::locate::locate_manifests;
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for the `inject` subcommand.
#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct InjectArgs {
    /// Built-in directive to inject
    #[arg(value_enum, conflicts_with_all = ["dependency", "directive"])]
    pub preset: Option<Preset>,

    /// Dependency line to insert after the `[dependencies]` header
    #[arg(long, value_name = "LINE", conflicts_with = "directive")]
    pub dependency: Option<String>,

    /// Line of the feature block inserted after the `[features]` header
    ///
    /// Repeat for every line of the block, in order. Pass an empty string
    /// for a blank line. Without any --feature, `[features]` is left alone.
    ///
    /// Example:
    ///   --dependency 'tracing = { version = "0.1", optional = true }'
    ///   --feature 'trace = ["dep:tracing"]'
    #[arg(
        long = "feature",
        value_name = "LINE",
        requires = "dependency",
        allow_hyphen_values = true,
        verbatim_doc_comment
    )]
    pub features: Vec<String>,

    /// TOML file with a `dependency` string and an optional `features` array
    #[arg(long, value_name = "PATH")]
    pub directive: Option<PathBuf>,

    /// Directory whose immediate subdirectories hold the manifests
    #[arg(long, value_name = "DIR", default_value = "crates")]
    pub crates_dir: PathBuf,

    /// File name of the manifests to rewrite
    #[arg(long, value_name = "NAME", default_value = "Cargo.toml")]
    pub manifest_name: String,

    /// Show what would change without writing any file
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

impl InjectArgs {
    /// Builds the directive from whichever source was given.
    pub fn resolve_directive(&self) -> Result<Directive> {
        match (self.preset, &self.dependency, &self.directive) {
            (Some(preset), None, None) => Ok(Directive::preset(preset)),
            (None, Some(dependency), None) => {
                let features = (!self.features.is_empty()).then(|| self.features.clone());
                Directive::new(dependency.as_str(), features)
            }
            (None, None, Some(path)) => Directive::load(path),
            (None, None, None) => Err(InjectError::NoDirective),
            _ => Err(InjectError::InvalidDirective(
                "give only one of a preset, --dependency or --directive".to_string(),
            )),
        }
    }
}

pub fn execute(args: InjectArgs) -> Result<()> {
    let directive = args.resolve_directive()?;
    log::debug!("Injecting dependency line: {}", directive.dependency());
    let rewriter = Rewriter::new(directive)?;

    let manifests = match locate_manifests(&args.crates_dir, &args.manifest_name) {
        Ok(manifests) => manifests,
        Err(InjectError::MissingBaseDirectory(dir)) => {
            // Nothing was touched; report and leave with success.
            eprintln!("{} {} does not exist", "Error:".red().bold(), dir.display());
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    println!(
        "Found {} {} files to process\n",
        manifests.len(),
        args.manifest_name
    );

    let success_message = if rewriter.directive().features().is_some() {
        "Added dependency and features"
    } else {
        "Added dependency"
    };

    let mut txn = Transaction::new(args.dry_run);
    let mut incomplete = 0;

    for manifest in &manifests {
        println!("Processing {}", manifest.display());
        let report = inject_manifest(manifest, &rewriter, &mut txn)?;

        if report.is_complete(rewriter.directive()) {
            println!("  {} {}", "✓".green(), success_message);
        } else {
            incomplete += 1;
            log::warn!(
                "{}: no [dependencies] header, dependency inserted: {}, features inserted: {}",
                manifest.display(),
                report.dependency_inserted,
                report.features_inserted
            );
            println!(
                "  {} {}",
                "⚠".yellow(),
                "Warning: Could not add all required lines".yellow()
            );
        }
    }

    if let Err(e) = txn.commit() {
        eprintln!("{} {}", "Error during commit:".red().bold(), e);
        return Err(e);
    }

    txn.print_summary(&args.crates_dir);

    println!("\nDone! Processed {} files.", manifests.len());
    if incomplete > 0 {
        println!(
            "{} {} file{} could not receive every line.",
            "⚠".yellow(),
            incomplete,
            if incomplete == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

/// Reads one manifest, rewrites it, and stages the result.
///
/// The rewritten content is staged whether or not the report is complete.
pub fn inject_manifest(
    manifest: &Path,
    rewriter: &Rewriter,
    txn: &mut Transaction,
) -> Result<RewriteReport> {
    let original = fs::read_to_string(manifest).map_err(|e| {
        InjectError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", manifest.display(), e),
        ))
    })?;

    let Rewrite { content, report } = rewriter.rewrite(&original);
    log::debug!("{}: {:?}", manifest.display(), report);

    txn.update_file(manifest.to_path_buf(), original, content)?;
    Ok(report)
}
