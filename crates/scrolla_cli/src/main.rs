//! `scrolla` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration and logging, then dispatch one subcommand.
//! - Keep all feed semantics inside `scrolla_core`.

use clap::{Parser, Subcommand};
use log::{error, info};
use scrolla_core::{
    core_version, default_log_level, init_logging, load_or_default, open_db, reorder_feed,
    FeedReport, FeedRepository, FileSource, Generators, KnowledgeRepository, OllamaClient,
    Pipeline, PipelineConfig, PipelineOutcome, SourceProvider, SqliteFeedRepository,
    SqliteKnowledgeRepository, UrlSource, WikipediaSource,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "scrolla", version, about = "Topic to learning-feed generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// TOML config file.
    #[arg(long, global = true, env = "SCROLLA_CONFIG")]
    config: Option<PathBuf>,
    /// SQLite database path, overriding `storage.db_path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and store the feed for a topic.
    Run {
        #[arg(long)]
        topic: String,
        /// Local text files used as additional sources.
        #[arg(long = "source-file")]
        source_files: Vec<PathBuf>,
        /// Reference pages; `{topic}` expands to the hyphenated topic.
        #[arg(long = "reference-url")]
        reference_urls: Vec<String>,
        #[arg(long)]
        no_wikipedia: bool,
    },
    /// Re-order a stored feed to follow the topic's knowledge order.
    Reorder {
        #[arg(long)]
        topic: String,
    },
    /// Print quality statistics and archived sources for a stored feed.
    Report {
        #[arg(long)]
        topic: String,
    },
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    if let Commands::Version = cli.command {
        println!("scrolla {}", core_version());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.storage.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.logging.log_dir = log_dir;
    }
    let level = cli
        .log_level
        .or_else(|| config.logging.level.clone())
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&level, &config.logging.log_dir)?;

    match cli.command {
        Commands::Run {
            topic,
            source_files,
            reference_urls,
            no_wikipedia,
        } => run_topic(&config, &topic, source_files, reference_urls, no_wikipedia),
        Commands::Reorder { topic } => reorder_topic(&config, &topic),
        Commands::Report { topic } => report_topic(&config, &topic),
        Commands::Version => Ok(ExitCode::SUCCESS),
    }
}

fn run_topic(
    config: &PipelineConfig,
    topic: &str,
    source_files: Vec<PathBuf>,
    reference_urls: Vec<String>,
    no_wikipedia: bool,
) -> Result<ExitCode, Box<dyn Error>> {
    let conn = open_db(&config.storage.db_path)?;
    let client = OllamaClient::new(
        config.generator.endpoint.clone(),
        config.generator.model.clone(),
        config.generator.timeout(),
        config.generator.retry_policy(),
    )?;

    let mut sources: Vec<Box<dyn SourceProvider>> = Vec::new();
    if !no_wikipedia {
        sources.push(Box::new(WikipediaSource::new()));
    }
    for path in source_files {
        sources.push(Box::new(FileSource::new(path)));
    }
    for url in reference_urls {
        sources.push(Box::new(UrlSource::new(url)));
    }

    let pipeline = Pipeline::new(
        Generators {
            extractor: &client,
            knowledge: &client,
            atoms: &client,
        },
        sources,
        SqliteKnowledgeRepository::try_new(&conn)?,
        SqliteFeedRepository::try_new(&conn)?,
        config.pipeline.clone(),
    );

    match pipeline.run(topic)? {
        PipelineOutcome::Completed {
            feed,
            skipped_concepts,
            run_id,
        } => {
            println!("run {run_id}: {} atoms for \"{}\"", feed.len(), feed.topic);
            if !skipped_concepts.is_empty() {
                println!("skipped concepts: {}", skipped_concepts.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
        PipelineOutcome::NothingProduced { stage } => {
            println!("nothing produced for \"{topic}\" ({})", stage.as_str());
            Ok(ExitCode::from(2))
        }
    }
}

fn reorder_topic(config: &PipelineConfig, topic: &str) -> Result<ExitCode, Box<dyn Error>> {
    let conn = open_db(&config.storage.db_path)?;
    let feed_repo = SqliteFeedRepository::try_new(&conn)?;
    let Some(feed) = feed_repo.load_feed(topic)? else {
        println!("no stored feed for \"{topic}\"");
        return Ok(ExitCode::from(2));
    };

    let concept_order = SqliteKnowledgeRepository::try_new(&conn)?
        .list(topic)?
        .into_iter()
        .map(|record| record.concept)
        .collect::<Vec<_>>();
    let (feed, report) = reorder_feed(feed, &concept_order);
    feed_repo.save_feed(&feed, None)?;

    info!(
        "event=feed_reorder module=cli status=ok topic=\"{}\" matched={} missing={} orphaned={}",
        topic,
        report.matched.len(),
        report.missing.len(),
        report.orphaned.len()
    );
    println!(
        "reordered {} atoms: {} concepts matched, {} without atoms",
        feed.len(),
        report.matched.len(),
        report.missing.len()
    );
    for (concept, count) in &report.orphaned {
        println!("appended {count} atom(s) for unknown concept \"{concept}\"");
    }
    Ok(ExitCode::SUCCESS)
}

fn report_topic(config: &PipelineConfig, topic: &str) -> Result<ExitCode, Box<dyn Error>> {
    let conn = open_db(&config.storage.db_path)?;
    let feed_repo = SqliteFeedRepository::try_new(&conn)?;
    match feed_repo.load_feed(topic)? {
        Some(feed) => {
            print!("{}", FeedReport::from_feed(&feed));
            for source in feed_repo.load_raw_sources(topic)? {
                println!(
                    "source {} ({}): {} chars",
                    source.name,
                    source.role.as_str(),
                    source.text.chars().count()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("no stored feed for \"{topic}\"");
            Ok(ExitCode::from(2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};
    use scrolla_core::config::CONFIG_ENV_VAR;

    #[test]
    fn run_accepts_repeated_source_files_and_global_flags() {
        let cli = Cli::try_parse_from([
            "scrolla",
            "run",
            "--topic",
            "Stack",
            "--source-file",
            "a.txt",
            "--source-file",
            "b.txt",
            "--reference-url",
            "https://www.geeksforgeeks.org/{topic}/",
            "--reference-url",
            "https://opendatastructures.org/ods-python/",
            "--no-wikipedia",
            "--db",
            "feeds.db",
        ])
        .unwrap();

        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("feeds.db")));
        match cli.command {
            Commands::Run {
                topic,
                source_files,
                reference_urls,
                no_wikipedia,
            } => {
                assert_eq!(topic, "Stack");
                assert_eq!(source_files.len(), 2);
                assert_eq!(reference_urls.len(), 2);
                assert_eq!(reference_urls[0], "https://www.geeksforgeeks.org/{topic}/");
                assert!(no_wikipedia);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn config_flag_reads_the_shared_environment_variable() {
        let command = Cli::command();
        let config = command
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .unwrap();
        assert_eq!(
            config.get_env(),
            Some(std::ffi::OsStr::new(CONFIG_ENV_VAR))
        );
    }
}
