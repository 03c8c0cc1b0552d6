//! talentlens - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use talentlens::cli::{Args, Commands};
use talentlens::config::Config;
use talentlens::delegate::OllamaDelegate;
use talentlens::gateway::demo;
use talentlens::pipeline::{PipelineConfig, QueryPipeline};
use talentlens::types::{Question, QueryResponse};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(message) = args.validate() {
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(2);
    }

    let config = Config::load().unwrap_or_default();

    match &args.command {
        Some(Commands::Demo) => run_demo(&args, &config).await,
        Some(Commands::Doctor) => run_doctor(&args, &config).await,
        Some(Commands::Config) => show_config(&config),
        None => {
            let question = args.question.clone().expect("validated above");
            run_question(&args, &config, &question).await
        }
    }
}

/// Build the pipeline over the demo fixtures, wiring a delegate when asked
fn build_pipeline(args: &Args, config: &Config) -> Result<QueryPipeline> {
    let pipeline_config =
        PipelineConfig::default().verbose(args.verbosity() == talentlens::cli::Verbosity::Verbose);

    let mut pipeline = QueryPipeline::new(
        Arc::new(demo::structured_store()),
        Arc::new(demo::semantic_store()),
        pipeline_config,
    );

    if args.delegate || config.delegate.enabled {
        let url = if args.delegate {
            args.delegate_url()
        } else {
            config.delegate_url().to_string()
        };
        let model = args
            .model
            .clone()
            .unwrap_or_else(|| config.delegate_model().to_string());
        let delegate = OllamaDelegate::with_config(&url, &model)?;
        pipeline = pipeline.with_delegate(Arc::new(delegate));
    }

    Ok(pipeline)
}

async fn run_question(args: &Args, config: &Config, question: &str) -> Result<()> {
    let pipeline = build_pipeline(args, config)?;

    let spinner = if args.verbosity().show_progress() && !args.json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        pb.set_message("retrieving evidence...");
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let result = pipeline.ask(&Question::new(question)).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(response) => print_response(args, &response),
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_response(args: &Args, response: &QueryResponse) {
    if args.json {
        match serde_json::to_string_pretty(response) {
            Ok(json) => println!("{}", json),
            Err(err) => eprintln!("{} {}", "error:".red().bold(), err),
        }
        return;
    }

    if response.degraded {
        println!("{}", "⚠ partial results: some sources were unavailable".yellow());
    }

    println!("{}", response.answer);

    if args.verbosity() == talentlens::cli::Verbosity::Quiet {
        return;
    }

    if let Some(sql) = &response.sql_query {
        println!("\n{}", "generated query:".dimmed());
        println!("{}", sql.dimmed());
    }

    println!(
        "\n{} {} · {} {}ms",
        "strategy:".dimmed(),
        response.query_type.as_str().cyan(),
        "latency:".dimmed(),
        response.elapsed_ms
    );
}

async fn run_demo(args: &Args, config: &Config) -> Result<()> {
    let questions = [
        "hello!",
        "How many Python developers do we have?",
        "Who are the best candidates to lead Project Phoenix?",
        "Does Alice's resume mention Kubernetes?",
        "Compare Alice's resume with Carol's resume",
    ];

    for (i, question) in questions.iter().enumerate() {
        println!(
            "\n{} {}",
            format!("[{}/{}]", i + 1, questions.len()).bold(),
            question.green()
        );
        println!("{}", "-".repeat(60).dimmed());
        run_question(args, config, question).await?;
    }

    Ok(())
}

async fn run_doctor(args: &Args, config: &Config) -> Result<()> {
    let structured = demo::structured_store();
    let semantic = demo::semantic_store();

    println!("{}", "talentlens doctor".bold());
    println!("  employees indexed:  {}", structured.employee_count());
    println!("  documents indexed:  {}", semantic.document_count());
    println!("  document chunks:    {}", semantic.chunk_count());

    if args.delegate || config.delegate.enabled {
        let url = if args.delegate {
            args.delegate_url()
        } else {
            config.delegate_url().to_string()
        };
        let delegate = OllamaDelegate::with_config(&url, config.delegate_model())?;
        match delegate.health_check().await {
            Ok(true) => println!("  delegate:           {} ({})", "reachable".green(), url),
            _ => println!("  delegate:           {} ({})", "unreachable".red(), url),
        }
    } else {
        println!("  delegate:           {}", "disabled".dimmed());
    }

    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let path = Config::config_path()?;
    println!("{} {}", "config file:".dimmed(), path.display());
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
