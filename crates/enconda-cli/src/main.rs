//! enconda CLI - find and score environment-setup errors in READMEs

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use enconda_core::config::{BenchConfig, BreakdownMode, ConfigOverrides, DEFAULT_CONFIG_FILE};
use enconda_core::eval::{EvaluationEngine, EvaluationRun, EvaluationSummary, Evaluator, LlmOracle};
use enconda_core::inference::{
    AgentAnalyzer, BatchProcessor, BatchRun, LlmAnalyzer, OutputManager, ReadmeAnalyzer,
    ReadmeDataset, sample_evenly,
};
use enconda_core::OpenAiClient;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enconda")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Environment-setup error benchmark for READMEs",
    long_about = "Detect environment-setup errors in README files with an LLM or an external agent,\nthen score the detections against human golden answers."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (info-level logs on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score analyzer result files against golden answers
    Evaluate {
        /// Directory holding <repo>/<readme>_errors.json result files
        #[arg(long = "results_dir", visible_alias = "results-dir")]
        results_dir: PathBuf,

        /// Benchmark data root holding <repo>/<folder>/README.json golden answers
        #[arg(long = "data_root_dir", visible_alias = "data-root-dir")]
        data_root_dir: PathBuf,

        /// Directory for the detailed and summary reports
        #[arg(long = "output_dir", visible_alias = "output-dir", default_value = "evaluation_output")]
        output_dir: PathBuf,

        /// Model used by the similarity oracle [default: gpt-4o-mini]
        #[arg(long = "evaluation_model", visible_alias = "evaluation-model")]
        evaluation_model: Option<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Count unmatched golden errors as per-category false negatives
        #[arg(long)]
        breakdown_misses: bool,

        /// Console summary format
        #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
        format: SummaryFormat,
    },

    /// Analyze benchmark READMEs and write result files
    Analyze {
        /// Analyzer backend
        #[arg(long, value_enum, default_value_t = AnalyzeMode::Llm)]
        mode: AnalyzeMode,

        /// Benchmark data root holding error_gen_<repo>/<folder>/README.md
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Directory of *.jsonl repository structure files
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Output directory for results, records and the summary report
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Analyze an evenly spaced sample of README folders
        #[arg(long)]
        sample_size: Option<usize>,

        /// Reprocess folders that already have results
        #[arg(long)]
        force: bool,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// List the folders that would be analyzed and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Initialize config file
    Init {
        /// Output path for config
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },

    /// List error categories
    Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    Text,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnalyzeMode {
    Llm,
    Agent,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Evaluate {
            results_dir,
            data_root_dir,
            output_dir,
            evaluation_model,
            config,
            breakdown_misses,
            format,
        } => evaluate_command(EvaluateArgs {
            results_dir,
            data_root_dir,
            output_dir,
            evaluation_model,
            config,
            breakdown_misses,
            format,
        }),
        Commands::Analyze {
            mode,
            data_dir,
            source_dir,
            output_dir,
            sample_size,
            force,
            config,
            dry_run,
        } => analyze_command(AnalyzeArgs {
            mode,
            data_dir,
            source_dir,
            output_dir,
            sample_size,
            force,
            config,
            dry_run,
        }),
        Commands::Init { output } => init_command(&output),
        Commands::Categories => categories_command(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Logs go to stderr so stdout carries only reports.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct EvaluateArgs {
    results_dir: PathBuf,
    data_root_dir: PathBuf,
    output_dir: PathBuf,
    evaluation_model: Option<String>,
    config: Option<PathBuf>,
    breakdown_misses: bool,
    format: SummaryFormat,
}

fn evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    if !args.results_dir.is_dir() {
        bail!("Results directory does not exist: {}", args.results_dir.display());
    }
    if !args.data_root_dir.is_dir() {
        bail!("Data root directory does not exist: {}", args.data_root_dir.display());
    }

    let config = load_config(
        args.config.as_deref(),
        ConfigOverrides {
            evaluation_model: args.evaluation_model,
            breakdown: args
                .breakdown_misses
                .then_some(BreakdownMode::IncludeGoldenMisses),
            ..ConfigOverrides::default()
        },
    )?;
    config.validate()?;

    println!("{} {}", "Evaluating:".cyan().bold(), args.results_dir.display());
    println!("  {} {}", "golden answers:".dimmed(), args.data_root_dir.display());
    println!("  {} {}", "oracle model:".dimmed(), config.evaluation.model_name);
    println!();

    let oracle = LlmOracle::from_config(&config)?;
    let engine = EvaluationEngine::new(&oracle).with_breakdown(config.evaluation.breakdown);
    let evaluator = Evaluator::new(&args.results_dir, &args.data_root_dir, &args.output_dir);

    let run = evaluator.evaluate(&engine);
    let paths = evaluator.save_reports(&run.overall)?;

    match args.format {
        SummaryFormat::Text => print_evaluation_summary(&run),
        SummaryFormat::Markdown => {
            println!("{}", EvaluationSummary::from_overall(&run.overall).to_markdown());
            print_skipped(&run);
        }
    }

    println!();
    println!("{} {}", "✓ Detailed results:".green().bold(), paths.detailed.display());
    println!("{} {}", "✓ Summary:".green().bold(), paths.summary.display());

    Ok(())
}

fn print_evaluation_summary(run: &EvaluationRun) {
    let summary = EvaluationSummary::from_overall(&run.overall);
    let error_type = &summary.overall_metrics.error_type;

    println!("{}", "─".repeat(60).dimmed());
    println!("{}", "Evaluation Summary".bold());
    println!("{}", "─".repeat(60).dimmed());
    println!("Files evaluated: {}", summary.total_files);
    println!();
    println!("{}", "Error type detection".bold());
    println!("  Precision: {}", percent(error_type.precision));
    println!("  Recall:    {}", percent(error_type.recall));
    println!("  F1:        {}", percent(error_type.f1_score));
    println!();
    println!("{}", "Text similarity".bold());
    println!(
        "  Description accuracy:  {}",
        percent(summary.overall_metrics.description_accuracy)
    );
    println!(
        "  Fix solution accuracy: {}",
        percent(summary.overall_metrics.fix_solution_accuracy)
    );

    if !summary.error_type_breakdown.is_empty() {
        println!();
        println!("{}", "Per-category metrics".bold());
        for (category, scores) in &summary.error_type_breakdown {
            let name = enconda_categories::get_category_name(category).unwrap_or("Unknown category");
            println!(
                "  {} {:<32} P={} R={} F1={}",
                category.cyan(),
                name,
                percent(scores.precision),
                percent(scores.recall),
                percent(scores.f1_score)
            );
        }
    }

    print_skipped(run);
}

fn print_skipped(run: &EvaluationRun) {
    if !run.skipped.is_empty() {
        println!();
        println!(
            "{} {} result {} skipped",
            "warning:".yellow().bold(),
            run.skipped.len(),
            if run.skipped.len() == 1 { "file" } else { "files" }
        );
        for skipped in &run.skipped {
            println!("  {} {}", skipped.path.display().to_string().dimmed(), skipped.reason);
        }
    }
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

struct AnalyzeArgs {
    mode: AnalyzeMode,
    data_dir: Option<PathBuf>,
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    sample_size: Option<usize>,
    force: bool,
    config: Option<PathBuf>,
    dry_run: bool,
}

fn analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = load_config(
        args.config.as_deref(),
        ConfigOverrides {
            data_root_dir: args.data_dir,
            source_root_dir: args.source_dir,
            output_dir: args.output_dir,
            sample_size: args.sample_size,
            ..ConfigOverrides::default()
        },
    )?;

    let data_root = &config.data.data_root_dir;
    if !data_root.is_dir() {
        bail!("Data directory does not exist: {}", data_root.display());
    }

    let dataset = ReadmeDataset::new(data_root, &config.data.source_root_dir);
    let output = OutputManager::new(&config.output.output_dir);

    if args.dry_run {
        let folders = dataset.readme_folders();
        let planned = match config.data.sample_size {
            Some(n) => sample_evenly(&folders, n),
            None => folders,
        };
        println!(
            "{} {} README {}",
            "Would analyze:".cyan().bold(),
            planned.len(),
            if planned.len() == 1 { "folder" } else { "folders" }
        );
        for folder in &planned {
            let done = output
                .errors_path(&folder.repo_name, &folder.readme_name)
                .exists();
            let marker = if done { " (done)".dimmed().to_string() } else { String::new() };
            println!("  {}{}", folder.document_id(), marker);
        }
        return Ok(());
    }

    config.validate()?;

    let analyzer: Box<dyn ReadmeAnalyzer> = match args.mode {
        AnalyzeMode::Llm => Box::new(LlmAnalyzer::new(OpenAiClient::new(&config.llm)?)),
        AnalyzeMode::Agent => Box::new(AgentAnalyzer::new(config.agent.clone(), &config.llm)),
    };

    println!("{} {}", "Analyzing:".cyan().bold(), data_root.display());
    println!("  {} {}", "mode:".dimmed(), analyzer.mode());
    println!("  {} {}", "output:".dimmed(), output.output_dir().display());
    println!();

    let run = BatchProcessor::new(analyzer.as_ref(), dataset, output)
        .with_sample_size(config.data.sample_size)
        .with_skip_existing(config.output.skip_existing && !args.force)
        .run()?;

    print_batch_summary(&run);
    Ok(())
}

fn print_batch_summary(run: &BatchRun) {
    let totals = &run.summary.summary;

    println!("{}", "─".repeat(60).dimmed());
    println!(
        "Processed {} README {} ({} skipped)",
        totals.total_repositories,
        if totals.total_repositories == 1 { "folder" } else { "folders" },
        run.skipped
    );
    println!(
        "  {} {}   {} {}   success rate {}",
        "succeeded:".green(),
        totals.successful_processing,
        "failed:".red(),
        totals.failed_processing,
        totals.success_rate
    );
    println!("  errors found: {}", totals.total_errors_found);

    for (category, count) in &run.summary.error_type_distribution {
        println!("    {} {}", category.cyan(), count);
    }

    let tokens = &run.summary.token_statistics;
    if tokens.repositories_with_token_data > 0 {
        println!(
            "  tokens: {} in / {} out (avg {:.2} per README)",
            tokens.total_input_tokens, tokens.total_output_tokens, tokens.average_total_tokens
        );
    }

    for failed in &run.summary.failed_repositories {
        println!("  {} {}: {}", "failed".red().bold(), failed.repo_name, failed.error_message);
    }
}

fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> anyhow::Result<BenchConfig> {
    let mut config = BenchConfig::load_or_default(path).context("Failed to load config")?;
    config.apply_overrides(overrides);
    config.resolve_env_vars();
    Ok(config)
}

fn init_command(output: &Path) -> anyhow::Result<()> {
    let default_config = BenchConfig::default();
    let toml_content = toml::to_string_pretty(&default_config)?;

    std::fs::write(output, toml_content)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Created config file: {}",
        "✓".green().bold(),
        output.display()
    );

    Ok(())
}

fn categories_command() -> anyhow::Result<()> {
    println!(
        "{} (catalog {})",
        "Error categories".bold(),
        enconda_categories::CATALOG_VERSION
    );
    println!();

    for (id, name, description) in enconda_categories::CATEGORIES_DATA {
        println!("  {} {}", id.cyan().bold(), name);
        println!("     {}", description.dimmed());
    }

    Ok(())
}
