//! # finrag CLI
//!
//! Command-line interface for retrieval-augmented question answering over
//! financial reports.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `finrag ask <report> "<question>"` | Answer a question (rag or agent mode) |
//! | `finrag retrieve <report> "<query>"` | Print the top-k retrieved chunks |
//! | `finrag index <report> --out <dir>` | Build and persist a vector index |
//! | `finrag eval <report> <eval_set>` | Score answers against an eval set |
//!
//! ## Examples
//!
//! ```bash
//! # Direct retrieve-then-generate
//! finrag ask data/apple_2016.txt "What were net sales in 2016?"
//!
//! # Same steps, with a step-by-step trace
//! finrag ask data/apple_2016.txt "What were Q2 earnings?" --mode agent
//!
//! # Inspect retrieval without calling the generation API
//! finrag retrieve data/apple_2016.txt "first quarter revenue" --k 5
//!
//! # Persist an index and reuse it
//! finrag index data/apple_2016.txt --out ./indexes/apple_2016
//! finrag ask data/apple_2016.txt "What was gross margin?" --index ./indexes/apple_2016
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use finrag::agent::{answer_with_rag, FinanceAgent};
use finrag::chunk::load_and_chunk;
use finrag::config::{load_config, Config};
use finrag::embedding::create_provider;
use finrag::eval::{is_match, load_eval_set};
use finrag::generate::{AnswerGenerator, OpenAIGenerator};
use finrag::retriever::Retriever;

/// finrag — retrieval-augmented question answering over financial reports.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; built-in defaults apply when the file does not exist. See
/// `config/finrag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "finrag",
    about = "Retrieval-augmented question answering over financial reports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/finrag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// How a question is answered.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Direct retrieve-then-generate.
    Rag,
    /// Same steps with a recorded explanation trace.
    Agent,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question about a report.
    Ask {
        /// Plain-text report file (UTF-8).
        document: PathBuf,

        /// Natural-language question.
        question: String,

        #[arg(long, value_enum, default_value = "rag")]
        mode: Mode,

        /// Number of chunks to retrieve (overrides config).
        #[arg(long)]
        k: Option<usize>,

        /// Load a previously persisted index instead of rebuilding
        /// (rag mode only; the agent always rebuilds from scratch).
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Print the top-k retrieved chunks for a query, without generation.
    Retrieve {
        document: PathBuf,
        query: String,

        #[arg(long)]
        k: Option<usize>,

        /// Load a previously persisted index instead of rebuilding.
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Build a vector index for a report and persist it.
    Index {
        document: PathBuf,

        /// Output directory for the index artifacts.
        #[arg(long)]
        out: PathBuf,
    },

    /// Run an eval set against a report and print per-question matches.
    Eval {
        document: PathBuf,

        /// JSON array of { question, expected_answer } pairs.
        eval_set: PathBuf,

        #[arg(long, value_enum, default_value = "rag")]
        mode: Mode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Ask {
            document,
            question,
            mode,
            k,
            index,
        } => {
            let k = k.unwrap_or(config.retrieval.top_k);
            let generator = OpenAIGenerator::new(config.generation.clone())?;

            match mode {
                Mode::Rag => {
                    let retriever =
                        prepare_retriever(&config, &document, index.as_deref()).await?;
                    let answer = answer_with_rag(&retriever, &generator, &question, k).await?;
                    println!("{}", answer);
                }
                Mode::Agent => {
                    let provider = create_provider(&config.embedding)?;
                    let retriever = Retriever::new(Arc::from(provider));
                    let mut agent = FinanceAgent::new(
                        document,
                        config.chunking.clone(),
                        retriever,
                        Box::new(generator),
                        k,
                    );
                    match agent.run(&question).await {
                        Ok(run) => {
                            for entry in &run.trace {
                                println!("  {}", entry);
                            }
                            println!();
                            println!("{}", run.answer);
                        }
                        Err(failure) => {
                            for entry in &failure.trace {
                                eprintln!("  {}", entry);
                            }
                            return Err(failure.into());
                        }
                    }
                }
            }
        }

        Commands::Retrieve {
            document,
            query,
            k,
            index,
        } => {
            let k = k.unwrap_or(config.retrieval.top_k);
            let retriever = prepare_retriever(&config, &document, index.as_deref()).await?;
            let chunks = retriever.retrieve(&query, k).await?;

            for (i, chunk) in chunks.iter().enumerate() {
                println!("{}. {}", i + 1, chunk);
                println!();
            }
        }

        Commands::Index { document, out } => {
            let retriever = prepare_retriever(&config, &document, None).await?;
            retriever.save_index(&out)?;
            println!(
                "indexed {} chunks ({} dims) -> {}",
                retriever.index().len(),
                retriever.index().dims(),
                out.display()
            );
        }

        Commands::Eval {
            document,
            eval_set,
            mode,
        } => {
            let cases = load_eval_set(&eval_set)?;
            let k = config.retrieval.top_k;
            let generator = OpenAIGenerator::new(config.generation.clone())?;
            let mut matched = 0usize;

            match mode {
                Mode::Rag => {
                    let retriever = prepare_retriever(&config, &document, None).await?;
                    for (i, case) in cases.iter().enumerate() {
                        let answer =
                            answer_with_rag(&retriever, &generator, &case.question, k).await?;
                        let ok = is_match(&answer, &case.expected_answer);
                        matched += ok as usize;
                        print_eval_line(i, &case.question, &answer, ok);
                    }
                }
                Mode::Agent => {
                    let provider = create_provider(&config.embedding)?;
                    let retriever = Retriever::new(Arc::from(provider));
                    let mut agent = FinanceAgent::new(
                        document,
                        config.chunking.clone(),
                        retriever,
                        Box::new(generator) as Box<dyn AnswerGenerator>,
                        k,
                    );
                    for (i, case) in cases.iter().enumerate() {
                        let run = agent.run(&case.question).await?;
                        let ok = is_match(&run.answer, &case.expected_answer);
                        matched += ok as usize;
                        print_eval_line(i, &case.question, &run.answer, ok);
                    }
                }
            }

            println!();
            println!(
                "accuracy: {}/{} ({:.1}%)",
                matched,
                cases.len(),
                100.0 * matched as f64 / cases.len().max(1) as f64
            );
        }
    }

    Ok(())
}

/// Build a retriever for a document, either by loading a persisted index
/// or by chunking and embedding the document from scratch.
async fn prepare_retriever(
    config: &Config,
    document: &Path,
    index_dir: Option<&Path>,
) -> Result<Retriever> {
    let provider = create_provider(&config.embedding)?;
    let mut retriever = Retriever::new(Arc::from(provider));

    match index_dir {
        Some(dir) => retriever.load_index(dir)?,
        None => {
            let chunks = load_and_chunk(document, &config.chunking)?;
            retriever.build_index(&chunks).await?;
        }
    }

    Ok(retriever)
}

fn print_eval_line(i: usize, question: &str, answer: &str, ok: bool) {
    let mark = if ok { "match" } else { "miss" };
    println!("Q{}: {}", i + 1, question);
    println!("  [{}] {}", mark, answer.replace('\n', " "));
}
