//! latex-math - parse and lay out LaTeX math from the command line

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use latex_math::{
    parse, symbols, to_latex, Display, FontMetrics, LabelConfig, LabelMode, MathLabel, MathTable,
    RenderOutput, Size,
};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "latex-math", version, about = "Parse and lay out LaTeX math")]
struct Args {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum Style {
    Display,
    Text,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the finalized math list and its LaTeX
    Parse {
        /// The LaTeX expression
        expr: String,
    },
    /// Typeset an expression and print the display tree and render primitives as JSON
    Layout {
        /// The LaTeX expression
        expr: String,
        /// Font size in points
        #[arg(long)]
        font_size: Option<f32>,
        #[arg(long, value_enum)]
        style: Option<Style>,
        /// JSON math table to use instead of the built-in one
        #[arg(long)]
        math_table: Option<PathBuf>,
        /// JSON label config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the supported commands
    Symbols,
}

#[derive(Serialize)]
struct LayoutReport<'a> {
    latex: &'a str,
    size: Size,
    display: &'a Display,
    render: RenderOutput,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Parse { expr } => {
            let list = parse(&expr).context("Failed to parse expression")?;
            let finalized = list.finalized();
            println!("{finalized:#?}");
            println!("{}", to_latex(&list));
        }
        Command::Layout {
            expr,
            font_size,
            style,
            math_table,
            config,
        } => {
            let mut config = match config {
                Some(path) => {
                    tracing::debug!("Loading label config from {:?}", path);
                    LabelConfig::load_or_default(&path)
                }
                None => LabelConfig::default(),
            };
            if let Some(font_size) = font_size {
                config.font_size = font_size;
            }
            if let Some(style) = style {
                config.mode = match style {
                    Style::Display => LabelMode::Display,
                    Style::Text => LabelMode::Text,
                };
            }

            let metrics: Arc<dyn FontMetrics> = match math_table {
                Some(path) => {
                    tracing::debug!("Loading math table from {:?}", path);
                    let table = MathTable::load(&path)
                        .with_context(|| format!("Failed to load math table {}", path.display()))?;
                    tracing::debug!(
                        "Math table loaded: {} glyphs, {} constants",
                        table.glyphs.len(),
                        table.constants.len()
                    );
                    Arc::new(table)
                }
                None => MathTable::shared_approximate(),
            };

            let mut label = MathLabel::with_metrics(expr.as_str(), config, metrics);
            if let Some(error) = label.error() {
                return Err(anyhow::Error::new(error.clone()).context("Failed to parse expression"));
            }
            let size = label.size_that_fits();
            tracing::debug!("Laid out {:?} at {}x{}", expr, size.width, size.height);
            let render = label
                .render(size)
                .context("Expression produced no display")?;
            let display = label
                .display()
                .context("Expression produced no display")?;
            let report = LayoutReport {
                latex: &expr,
                size,
                display,
                render,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Symbols => {
            for command in symbols::supported_commands() {
                println!("\\{command}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_with_table_and_config_files() {
        let dir = std::env::temp_dir();
        let table_path = dir.join("latex_math_cli_table.json");
        let config_path = dir.join("latex_math_cli_config.json");
        std::fs::write(&table_path, MathTable::approximate().to_json().unwrap()).unwrap();
        std::fs::write(&config_path, r#"{"font_size": 12, "mode": "text"}"#).unwrap();

        let result = run(Command::Layout {
            expr: "\\frac{1}{x}".to_string(),
            font_size: None,
            style: None,
            math_table: Some(table_path.clone()),
            config: Some(config_path.clone()),
        });
        assert!(result.is_ok());

        std::fs::remove_file(&table_path).ok();
        std::fs::remove_file(&config_path).ok();
    }

    #[test]
    fn test_layout_reports_missing_table() {
        let result = run(Command::Layout {
            expr: "x".to_string(),
            font_size: None,
            style: None,
            math_table: Some(PathBuf::from("/nonexistent/latex_math_table.json")),
            config: None,
        });
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to load math table"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = run(Command::Parse {
            expr: "\\frac{a".to_string(),
        });
        assert!(result.is_err());
    }
}
