//! CLI: load exports → visit → (sheets | json)
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser};
use colored::Colorize;
use indexmap::IndexSet;
use tracing::info;

use crate::load::{LoadSettings, load_model};
use crate::pipeline::{RunConfig, RunOutput, run};
use crate::sheet::write_sheets;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// inspect model exports: list every element and report where fragments,
/// layouts and pluggable widgets are used
#[derive(Parser, Debug)]
#[command(name = "model-xref", version)]
pub struct CommandLineInterface {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    output_settings: OutputSettings,

    /// only visit documents whose qualified name starts with this prefix
    #[arg(long, env = "MODULE_NAME", default_value = "")]
    module_name: String,

    /// visit the documents of each batch in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// log every visited element
    #[arg(long, short, env = "VERBOSE", default_value_t = false)]
    pub verbose: bool,

    /// tracing filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JQ pre-process filter for each export file.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, env = "INPUT", num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// directory receiving one .csv file per sheet
    #[arg(long, env = "SHEETS_DIR")]
    sheets_dir: Option<PathBuf>,

    /// output .json file for the cross-reference index
    #[arg(long, env = "JSON_FILE")]
    json: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_settings(&self) -> LoadSettings {
        LoadSettings { inputs: self.input.clone(), jq_expr: self.jq_expr.clone() }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Filter directive for the tracing subscriber.
    pub fn log_filter(&self) -> &str {
        if self.verbose { "debug" } else { &self.log_level }
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let model = load_model(&self.input_settings.load_settings()).context("failed to load model exports")?;
        let config = RunConfig { module_prefix: self.module_name.clone(), parallel: self.parallel };
        let output = run(&model, &config).context("failed to inspect model")?;

        if let Some(dir) = self.output_settings.sheets_dir.as_ref() {
            for path in write_sheets(dir, &[&output.overview, &output.flows])? {
                info!(path = %path.display(), "wrote sheet");
            }
        }
        if let Some(path) = self.output_settings.json.as_ref() {
            output.cross_reference.write_file(path)?;
            info!(path = %path.display(), "wrote cross-reference");
        }

        print_summary(&output);
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_summary(output: &RunOutput) {
    let stats = &output.stats;
    let unused = &output.cross_reference.unused;
    println!("{}", "model-xref".bold());
    println!(
        "  visited   {} pages, {} snippets, {} layouts, {} microflows",
        stats.pages.to_string().cyan(),
        stats.fragments.to_string().cyan(),
        stats.layouts.to_string().cyan(),
        stats.flows.to_string().cyan(),
    );
    println!(
        "  elements  {} rows, {} flow rows, {} widgets",
        output.overview.rows().len().to_string().cyan(),
        output.flows.rows().len().to_string().cyan(),
        output.cross_reference.widget_instances.len().to_string().cyan(),
    );
    print_unused("snippets", &unused.fragment);
    print_unused("layouts", &unused.layout);
}

fn print_unused(label: &str, names: &IndexSet<String>) {
    if names.is_empty() {
        println!("  unused {label:<9}{}", "none".green());
        return;
    }
    println!("  unused {label:<9}{}", names.len().to_string().yellow());
    for name in names {
        println!("    {}", name.yellow());
    }
}
