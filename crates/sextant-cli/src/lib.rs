//! CLI logic for the Sextant hierarchy tool.
//!
//! [`run`] loads the corpus and configuration named by [`Args`], runs the
//! requested command and prints the result to standard output.

pub mod error_adapter;
pub mod render;

mod args;
mod config;

pub use args::{Args, Command, OutputFormat};

use std::{
    io::{self, Write},
    path::Path,
};

use log::{info, warn};

use sextant::{
    CatalogCache, Hierarchy, HierarchyBuilder, SextantError,
    config::{AppConfig, TreeConfig},
};

use error_adapter::{DiagnosticAdapter, render as render_report};
use render::{GraphReport, ScheduleReport};

/// Run the Sextant CLI application, printing to standard output.
///
/// # Errors
///
/// Returns `SextantError` for:
/// - Configuration loading errors
/// - An unreadable corpus directory or mapping file
/// - An empty corpus or one without a usable root
/// - An unknown document passed to `paths`
pub fn run(args: &Args) -> Result<(), SextantError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(args, &mut out)
}

/// Like [`run`], writing command output to `out`.
///
/// # Errors
///
/// See [`run`]; write failures are reported as [`SextantError::Io`].
pub fn run_with_output<W: Write>(args: &Args, out: &mut W) -> Result<(), SextantError> {
    info!(
        corpus = args.corpus.as_str(),
        command:? = args.command;
        "Processing corpus"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(root) = &args.root {
        app_config = with_root(app_config, root);
    }

    let builder = HierarchyBuilder::new(app_config);
    let mut cache = CatalogCache::new();
    let corpus = builder.load(
        Path::new(&args.corpus),
        args.mapping.as_deref().map(Path::new),
        &mut cache,
    )?;

    if let Command::Paths { document } = &args.command {
        for diagnostic in corpus.diagnostics() {
            warn!("{}", render_report(&DiagnosticAdapter::new(diagnostic)));
        }
        let enumeration = builder.paths_for(&corpus, document)?;
        match args.format {
            OutputFormat::Text => render::paths(out, &enumeration)?,
            OutputFormat::Json => render::json(out, &enumeration)?,
        }
        info!(paths = enumeration.paths().len(); "Paths printed");
        return Ok(());
    }

    let hierarchy = builder.build(&corpus)?;
    report_diagnostics(&hierarchy);

    match (&args.command, args.format) {
        (Command::Tree, OutputFormat::Text) => render::tree(out, hierarchy.tree())?,
        (Command::Tree, OutputFormat::Json) => render::json(out, hierarchy.tree())?,
        (Command::Graph { dot: true }, _) => writeln!(out, "{}", hierarchy.graph().to_dot())?,
        (Command::Graph { dot: false }, OutputFormat::Text) => render::graph(out, hierarchy.graph())?,
        (Command::Graph { dot: false }, OutputFormat::Json) => {
            render::json(out, &GraphReport::new(hierarchy.graph()))?
        }
        (Command::Links, OutputFormat::Text) => render::links(out, hierarchy.graph().links())?,
        (Command::Links, OutputFormat::Json) => render::json(out, hierarchy.graph().links())?,
        (Command::Schedule { start }, format) => {
            let scheduled = builder.schedule(hierarchy.tree(), *start);
            match format {
                OutputFormat::Text => render::schedule(out, &scheduled)?,
                OutputFormat::Json => render::json(
                    out,
                    &ScheduleReport {
                        schedule: &scheduled,
                        timeline: scheduled.flatten(),
                    },
                )?,
            }
        }
        (Command::Paths { .. }, _) => {}
    }

    info!(
        nodes = hierarchy.tree().len(),
        diagnostics = hierarchy.diagnostics().len();
        "Command completed"
    );
    Ok(())
}

fn with_root(config: AppConfig, root: &str) -> AppConfig {
    let tree: TreeConfig = config.tree().clone().with_root(root);
    config.with_tree(tree)
}

/// Logs every warning and error of the pass as a graphical report.
fn report_diagnostics(hierarchy: &Hierarchy) {
    for diagnostic in hierarchy.diagnostics() {
        if diagnostic.severity().is_info() {
            continue;
        }
        warn!("{}", render_report(&DiagnosticAdapter::new(diagnostic)));
    }
}
