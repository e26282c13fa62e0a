use anyhow::{Context, Result};
use ariadne::{Label, Report, ReportKind, Source};
use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use weft::{Diagnostic, Diagnostics, LinkConfig, ModifierKind, Severity, Tree, build_manifolds};

#[derive(ClapParser)]
#[command(name = "weft")]
#[command(about = "Resolve and link manifold symbol trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a tree and write the result as JSON
    Link {
        /// Path to the parser's JSON tree
        tree: PathBuf,
        /// Pipeline settings (weft.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Source file the tree spans point into, for annotated diagnostics
        #[arg(long)]
        source: Option<PathBuf>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fail on warnings too
        #[arg(long)]
        deny_warnings: bool,
        /// Print an indented dump instead of JSON
        #[arg(long)]
        dump: bool,
    },
    /// Link a tree and only report diagnostics
    Check {
        /// Path to the parser's JSON tree
        tree: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        deny_warnings: bool,
    },
    /// List every linked manifold
    Manifolds {
        /// Path to the parser's JSON tree
        tree: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        deny_warnings: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Link {
            tree,
            config,
            source,
            output,
            deny_warnings,
            dump,
        } => {
            let config = load_config(config.as_deref(), deny_warnings)?;
            let (tree, diagnostics) = link(&tree, &config)?;
            report(&diagnostics, source.as_deref())?;
            if rejected(&diagnostics, &config) {
                std::process::exit(1);
            }
            let rendered = if dump {
                tree.to_string()
            } else {
                serde_json::to_string_pretty(&tree)?
            };
            match output {
                Some(output) => {
                    fs::write(&output, rendered)
                        .with_context(|| format!("writing {}", output.display()))?;
                    eprintln!("Linked tree written to: {}", output.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Check {
            tree,
            config,
            source,
            deny_warnings,
        } => {
            let config = load_config(config.as_deref(), deny_warnings)?;
            let (_, diagnostics) = link(&tree, &config)?;
            report(&diagnostics, source.as_deref())?;
            let errors = diagnostics.errors().count();
            let warnings = diagnostics.warnings().count();
            eprintln!("{}: {errors} errors, {warnings} warnings", tree.display());
            if rejected(&diagnostics, &config) {
                std::process::exit(1);
            }
        }
        Commands::Manifolds {
            tree,
            config,
            deny_warnings,
        } => {
            let config = load_config(config.as_deref(), deny_warnings)?;
            let (tree, diagnostics) = link(&tree, &config)?;
            report(&diagnostics, None)?;
            if rejected(&diagnostics, &config) {
                std::process::exit(1);
            }
            for line in manifold_lines(&tree) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, deny_warnings: bool) -> Result<LinkConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            LinkConfig::from_toml(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => LinkConfig::default(),
    };
    config.deny_warnings |= deny_warnings;
    log::debug!("config: {config:?}");
    Ok(config)
}

fn link(path: &Path, config: &LinkConfig) -> Result<(Tree, Diagnostics)> {
    let json = fs::read_to_string(path).with_context(|| format!("reading tree {}", path.display()))?;
    let mut tree: Tree =
        serde_json::from_str(&json).with_context(|| format!("parsing tree {}", path.display()))?;
    let diagnostics = build_manifolds(&mut tree, config)
        .with_context(|| format!("linking {}", path.display()))?;
    Ok((tree, diagnostics))
}

/// Every command refuses to produce output for a rejected tree.
fn rejected(diagnostics: &Diagnostics, config: &LinkConfig) -> bool {
    diagnostics.is_fatal(config.deny_warnings)
}

/// Print diagnostics, annotated against the source when it is available.
fn report(diagnostics: &Diagnostics, source: Option<&Path>) -> Result<()> {
    let source = match source {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading source {}", path.display()))?;
            Some((path.display().to_string(), text))
        }
        None => None,
    };

    for diagnostic in diagnostics {
        match (&source, diagnostic.span()) {
            (Some((filename, text)), Some(span)) if span.end <= text.len() => {
                print_report(diagnostic, filename, text, span.clone())?;
            }
            _ => eprintln!("{}: {diagnostic}", diagnostic.severity()),
        }
    }
    Ok(())
}

fn print_report(diagnostic: &Diagnostic, filename: &str, text: &str, span: std::ops::Range<usize>) -> Result<()> {
    let kind = match diagnostic.severity() {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
    };
    Report::build(kind, (filename, span.clone()))
        .with_message(diagnostic.to_string())
        .with_label(Label::new((filename, span)).with_message(diagnostic.label()))
        .finish()
        .eprint((filename, Source::from(text)))?;
    Ok(())
}

fn manifold_lines(tree: &Tree) -> Vec<String> {
    let mut lines = Vec::new();
    for (label, id) in tree.declared_manifolds() {
        let Some(manifold) = tree.manifold(id) else {
            lines.push(format!("{id} {label} (dangling)"));
            continue;
        };
        let mut line = format!("{id} {label}");
        if let Some(function) = &manifold.function {
            line.push_str(&format!(" function={function}"));
        }
        if !manifold.inputs.is_empty() {
            let inputs: Vec<_> = manifold.inputs.iter().map(ToString::to_string).collect();
            line.push_str(&format!(" inputs=[{}]", inputs.join(",")));
        }
        if let Some(effect) = &manifold.bound_effect {
            line.push_str(&format!(" bound_effect={effect}"));
        }
        for kind in ModifierKind::ALL {
            let payloads = manifold.modifiers(kind);
            if !payloads.is_empty() {
                let payloads: Vec<_> = payloads.iter().map(ToString::to_string).collect();
                line.push_str(&format!(" {kind}=[{}]", payloads.join(",")));
            }
        }
        lines.push(line);
    }
    lines
}
