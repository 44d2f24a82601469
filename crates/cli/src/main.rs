use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use intro_ai_core::genetics::{HeredityEngine, InheritanceModel, Pedigree, DEFAULT_MAX_PEOPLE};
use intro_ai_core::language::{answer, load_files, QaConfig};
use intro_ai_core::ranking::{
    iterate_pagerank, sample_pagerank, Corpus, PageRankConfig, PageRanks,
};
use intro_ai_core::search::{minimax, self_play, Board};

#[derive(Parser)]
#[command(name = "intro-ai")]
#[command(version)]
#[command(about = "Classic introductory AI algorithms: heredity, PageRank, minimax, TF-IDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer gene and trait probabilities for every person in a family
    Heredity {
        /// Path to family CSV (columns: name, mother, father, trait)
        data: String,

        /// Probability that an inherited allele mutates
        #[arg(long, default_value = "0.01")]
        mutation: f64,

        /// Refuse families larger than this (enumeration is exponential)
        #[arg(long, default_value_t = DEFAULT_MAX_PEOPLE)]
        max_people: usize,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Rank the HTML pages of a directory by sampling and by iteration
    Pagerank {
        /// Directory of .html pages
        corpus: String,

        /// Damping factor
        #[arg(long, default_value = "0.85")]
        damping: f64,

        /// Number of random-surfer samples
        #[arg(long, default_value = "10000")]
        samples: usize,

        /// Seed for the sampler; random when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the optimal Tic-Tac-Toe move, or play a full game
    Tictactoe {
        /// Board as three rows of X, O and '.', separated by '/'
        #[arg(long, default_value = ".../.../...")]
        board: String,

        /// Play both sides to the end instead of printing one move
        #[arg(long)]
        play: bool,
    },

    /// Answer a question from a directory of .txt documents
    Questions {
        /// Directory of .txt documents
        corpus: String,

        /// Query; read from stdin when omitted
        #[arg(short, long)]
        query: Option<String>,

        /// Number of files searched for sentences
        #[arg(long, default_value = "1")]
        files: usize,

        /// Number of sentences printed
        #[arg(long, default_value = "1")]
        sentences: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Heredity {
            data,
            mutation,
            max_people,
            format,
        } => cmd_heredity(&data, mutation, max_people, &format),
        Commands::Pagerank {
            corpus,
            damping,
            samples,
            seed,
            format,
        } => cmd_pagerank(&corpus, damping, samples, seed, &format),
        Commands::Tictactoe { board, play } => cmd_tictactoe(&board, play),
        Commands::Questions {
            corpus,
            query,
            files,
            sentences,
        } => cmd_questions(&corpus, query, files, sentences),
    }
}

fn cmd_heredity(data_path: &str, mutation: f64, max_people: usize, format: &str) -> Result<()> {
    let ped = Pedigree::from_csv(data_path)
        .with_context(|| format!("Failed to load family from '{}'", data_path))?;
    eprintln!("Loaded {} people from '{}'", ped.n_people(), data_path);

    let model = InheritanceModel::default()
        .with_mutation(mutation)
        .context("Invalid mutation rate")?;
    let engine = HeredityEngine::with_max_people(&ped, &model, max_people)
        .context("Cannot run inference on this family")?;
    let report = engine.infer().context("Inference failed")?;

    eprintln!(
        "Evaluated {} scenarios (evidence likelihood {:.3e})",
        report.n_scenarios, report.evidence_likelihood
    );

    match format.to_lowercase().as_str() {
        "json" => print_json(&report.people)?,
        "text" => print!("{}", report.summary()),
        other => anyhow::bail!("Unknown format '{}'. Use 'text' (default) or 'json'.", other),
    }
    Ok(())
}

fn cmd_pagerank(
    corpus_dir: &str,
    damping: f64,
    samples: usize,
    seed: Option<u64>,
    format: &str,
) -> Result<()> {
    let corpus = Corpus::crawl(corpus_dir)
        .with_context(|| format!("Failed to crawl '{}'", corpus_dir))?;
    eprintln!("Crawled {} pages from '{}'", corpus.len(), corpus_dir);

    let config = PageRankConfig {
        damping,
        samples,
        ..PageRankConfig::default()
    };
    config.validate().context("Invalid PageRank parameters")?;

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let sampled = sample_pagerank(&corpus, config.damping, config.samples, &mut rng)
        .context("Sampling PageRank failed")?;
    let iterated = iterate_pagerank(&corpus, &config).context("Iterating PageRank failed")?;

    match format.to_lowercase().as_str() {
        "json" => print_json(&serde_json::json!({
            "samples": config.samples,
            "sampled": sampled,
            "iterated": iterated,
        }))?,
        "text" => {
            print_ranks(&format!("PageRank Results from Sampling (n = {})", samples), &sampled);
            print_ranks("PageRank Results from Iteration", &iterated);
        }
        other => anyhow::bail!("Unknown format '{}'. Use 'text' (default) or 'json'.", other),
    }
    Ok(())
}

fn print_ranks(title: &str, ranks: &PageRanks) {
    println!("{}", title);
    for (page, rank) in ranks.iter() {
        println!("  {}: {:.4}", page, rank);
    }
}

fn cmd_tictactoe(board: &str, play: bool) -> Result<()> {
    let board = board
        .parse::<Board>()
        .with_context(|| format!("Invalid board '{}'", board))?;

    if play {
        let history = self_play(&board);
        for (turn, position) in history.iter().enumerate() {
            println!("Turn {}:\n{}\n", turn, position);
        }
        let last = history.last().copied().unwrap_or(board);
        match last.winner() {
            Some(mark) => println!("Game over: {} wins.", mark),
            None => println!("Game over: tie."),
        }
        return Ok(());
    }

    println!("{}\n", board);
    match minimax(&board) {
        Some((row, col)) => println!("{} should play row {}, column {}", board.player(), row, col),
        None => match board.winner() {
            Some(mark) => println!("Game over: {} wins.", mark),
            None => println!("Game over: tie."),
        },
    }
    Ok(())
}

fn cmd_questions(
    corpus_dir: &str,
    query: Option<String>,
    file_matches: usize,
    sentence_matches: usize,
) -> Result<()> {
    let files = load_files(corpus_dir)
        .with_context(|| format!("Failed to load documents from '{}'", corpus_dir))?;
    eprintln!("Loaded {} documents from '{}'", files.len(), corpus_dir);

    let query = match query {
        Some(q) => q,
        None => prompt("Query: ")?,
    };

    let config = QaConfig {
        file_matches,
        sentence_matches,
    };
    let matches = answer(&query, &files, &config).context("Failed to answer query")?;
    if matches.is_empty() {
        eprintln!("No matching sentence found");
    }
    for sentence in matches {
        println!("{}", sentence);
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read query from stdin")?;
    Ok(line.trim().to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json_str = serde_json::to_string_pretty(value)?;
    println!("{}", json_str);
    Ok(())
}
