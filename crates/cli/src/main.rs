use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use reconcile::{DedupReport, ReconcileScope, ReviewStats};
use review_store::{MovieId, Review, SeedData, SeededStores, SentimentLabel, SourceStore, UserId};
use server::{
    Actor, EnrichmentEvent, ReviewError, ReviewOrchestrator, ServiceConfig, SubmitOutcome,
    SubmitRequest,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use text_pipeline::filters::load_term_list;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// reel-reviews - movie review lifecycle over a seed data directory
#[derive(Parser)]
#[command(name = "reel-reviews")]
#[command(about = "Submit, list, vote on and maintain movie reviews", long_about = None)]
struct Cli {
    /// Directory holding reviews.dat, legacy_reviews.dat and movies.dat
    #[arg(short, long, env = "REEL_REVIEWS_DATA_DIR", default_value = "data/reviews")]
    data_dir: PathBuf,

    /// Address of the sentiment classification service
    #[arg(long, env = "REEL_REVIEWS_CLASSIFIER_ADDR", default_value = server::config::DEFAULT_CLASSIFIER_ADDR)]
    classifier_addr: String,

    /// Word list replacing the built-in profanity denylist (one term per line)
    #[arg(long)]
    denylist: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Exactly one of --movie or --author
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ScopeArgs {
    #[arg(long)]
    movie: Option<MovieId>,

    #[arg(long)]
    author: Option<UserId>,
}

impl ScopeArgs {
    fn scope(&self) -> Result<ReconcileScope> {
        match (&self.movie, &self.author) {
            (Some(movie_id), _) => Ok(ReconcileScope::Movie(*movie_id)),
            (None, Some(author)) => Ok(ReconcileScope::Author(author.clone())),
            (None, None) => bail!("Pass --movie or --author"),
        }
    }
}

/// Who is acting; omit --user to act anonymously
#[derive(Args)]
struct ActorArgs {
    #[arg(long)]
    user: Option<UserId>,

    /// Display name, defaults to the user id
    #[arg(long)]
    name: Option<String>,
}

impl ActorArgs {
    fn actor(&self) -> Actor {
        match &self.user {
            Some(id) => Actor::user(id.clone(), self.name.clone().unwrap_or_else(|| id.clone())),
            None => Actor::Anonymous,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new review
    Submit {
        #[arg(long)]
        movie: MovieId,

        /// Star rating, 1 to 5
        #[arg(long)]
        stars: u8,

        #[arg(long)]
        text: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// List merged reviews for a movie or an author, newest first
    List {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Backfill missing sentiment before printing (Ctrl-C stops early)
        #[arg(long)]
        enrich: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Toggle a like on a review
    Like {
        review_id: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Toggle a dislike on a review
    Dislike {
        review_id: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Remove superseded duplicate reviews for a movie from the primary store
    Dedup {
        #[arg(long)]
        movie: MovieId,
    },

    /// Rating distribution and activity over time
    Stats {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        json: bool,
    },

    /// Run the profanity and spam checks on some text
    Moderate { text: String },

    /// Classify the sentiment of some text
    Classify { text: String },

    /// Summarize long text to its first and last sentence
    Summarize { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<ReviewError>() {
            Some(review_error) if review_error.is_user_facing() => {
                eprintln!("{} {}", "✗".red(), review_error);
                std::process::exit(2);
            }
            _ => Err(e),
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();
    let seed = SeedData::load_from_dir(&cli.data_dir)
        .with_context(|| format!("Failed to load seed data from {}", cli.data_dir.display()))?;
    let stores = seed.into_stores().context("Failed to build stores")?;
    debug!("Loaded seed data in {:?}", start.elapsed());

    let mut config = ServiceConfig::default().with_classifier_addr(cli.classifier_addr.clone());
    if let Some(path) = &cli.denylist {
        let terms = load_term_list(path)
            .with_context(|| format!("Failed to read denylist {}", path.display()))?;
        config = config.with_denylist(terms);
    }
    let orchestrator = ReviewOrchestrator::from_config(stores.clone().into(), config)?;

    match cli.command {
        Commands::Submit {
            movie,
            stars,
            text,
            actor,
        } => {
            let request = SubmitRequest {
                movie_id: movie,
                stars,
                text,
            };
            let outcome = orchestrator.submit(&actor.actor(), request).await?;
            save(&stores, &cli.data_dir).await?;
            print_submit_outcome(&outcome);
        }
        Commands::List { scope, enrich, json } => {
            handle_list(&orchestrator, &scope.scope()?, enrich, json).await?;
        }
        Commands::Like { review_id, actor } => {
            let votes = orchestrator.like(&actor.actor(), &review_id).await?;
            save(&stores, &cli.data_dir).await?;
            println!(
                "{} {} now has {} likes, {} dislikes",
                "✓".green(),
                review_id,
                votes.like_count(),
                votes.dislike_count()
            );
        }
        Commands::Dislike { review_id, actor } => {
            let votes = orchestrator.dislike(&actor.actor(), &review_id).await?;
            save(&stores, &cli.data_dir).await?;
            println!(
                "{} {} now has {} likes, {} dislikes",
                "✓".green(),
                review_id,
                votes.like_count(),
                votes.dislike_count()
            );
        }
        Commands::Dedup { movie } => {
            let report = orchestrator.dedup(movie).await?;
            if report.removed > 0 {
                save(&stores, &cli.data_dir).await?;
            }
            print_dedup(&report);
        }
        Commands::Stats { scope, json } => {
            let scope = scope.scope()?;
            let stats = orchestrator.stats(&scope).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&scope, &stats);
            }
        }
        Commands::Moderate { text } => {
            let report = orchestrator.moderate(&text).await;
            println!("{}", report.cleaned_text());
            if report.profanity.contains_profanity {
                println!("{} masked: {}", "•".yellow(), report.profanity.found_words.join(", "));
            }
            if report.spam.is_abusive {
                println!("{} spam/abuse: {}", "•".red(), report.spam.found_words.join(", "));
            }
        }
        Commands::Classify { text } => {
            let sentiment = orchestrator.classify(&text).await;
            println!("{} ({}%)", color_label(sentiment.label), sentiment.confidence);
        }
        Commands::Summarize { text } => {
            println!("{}", orchestrator.summarize(&text));
        }
    }

    Ok(())
}

async fn save(stores: &SeededStores, data_dir: &Path) -> Result<()> {
    stores
        .save_to_dir(data_dir)
        .await
        .with_context(|| format!("Failed to write seed data to {}", data_dir.display()))
}

/// Handle the 'list' command
async fn handle_list(
    orchestrator: &ReviewOrchestrator,
    scope: &ReconcileScope,
    enrich: bool,
    json: bool,
) -> Result<()> {
    let mut reviews = orchestrator.load_reviews(scope).await?;

    if enrich {
        let cancel = CancellationToken::new();
        let on_ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let (tx, mut rx) = mpsc::channel::<EnrichmentEvent>(64);
        let progress = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                debug!("{} -> {:?}", event.review_id, event.state);
            }
        });

        let report = orchestrator.enrich(&mut reviews, &cancel, Some(&tx)).await;
        drop(tx);
        progress.await?;
        on_ctrl_c.abort();

        if !json {
            let note = if report.cancelled { " (stopped early)" } else { "" };
            println!(
                "{} Enriched {} of {} reviews in {} batches{}",
                "✓".green(),
                report.enriched,
                report.pending,
                report.batches,
                note
            );
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reviews)?);
    } else {
        print_reviews(orchestrator, scope, &reviews);
    }
    Ok(())
}

fn scope_heading(orchestrator: &ReviewOrchestrator, scope: &ReconcileScope) -> String {
    match scope {
        ReconcileScope::Movie(movie_id) => orchestrator
            .movie_title(*movie_id)
            .unwrap_or_else(|| format!("Movie {}", movie_id)),
        ReconcileScope::Author(author) => format!("Reviews by {}", author),
    }
}

fn color_label(label: SentimentLabel) -> colored::ColoredString {
    match label {
        SentimentLabel::Positive => label.as_str().green(),
        SentimentLabel::Negative => label.as_str().red(),
        SentimentLabel::Neutral => label.as_str().yellow(),
    }
}

fn stars(count: u8) -> String {
    format!("{}{}", "★".repeat(count as usize), "☆".repeat(5 - count.min(5) as usize))
}

/// Helper function to format and print a review list
fn print_reviews(orchestrator: &ReviewOrchestrator, scope: &ReconcileScope, reviews: &[Review]) {
    println!("{}", scope_heading(orchestrator, scope).bold().blue());
    if reviews.is_empty() {
        println!("  No reviews yet");
        return;
    }

    for (i, review) in reviews.iter().enumerate() {
        let sentiment = match review.sentiment {
            Some(s) => format!("{} {}%", color_label(s.label), s.confidence),
            None => "pending".dimmed().to_string(),
        };
        let source = match review.source_store {
            SourceStore::Primary => "",
            SourceStore::Legacy => " [legacy]",
        };
        println!(
            "{}. {} {} - {} ({}){}",
            (i + 1).to_string().green(),
            stars(review.star_rating).yellow(),
            review.author_display_name.bold(),
            review.created_at.format("%Y-%m-%d"),
            sentiment,
            source.dimmed()
        );
        if let ReconcileScope::Author(_) = scope {
            println!("   on {}", scope_heading(orchestrator, &ReconcileScope::Movie(review.movie_id)));
        }
        println!("   {}", orchestrator.summarize(&review.text));
        println!(
            "   {} 👍 {} 👎 {}",
            review.id.dimmed(),
            review.like_count,
            review.dislike_count
        );
    }
}

fn print_submit_outcome(outcome: &SubmitOutcome) {
    let review = &outcome.review;
    println!("{} Review {} stored", "✓".green(), review.id);
    if let Some(s) = review.sentiment {
        println!("  Sentiment: {} ({}%)", color_label(s.label), s.confidence);
    }
    if outcome.text_altered {
        println!(
            "  {} Some words were masked: {}",
            "!".yellow(),
            outcome.masked_words.join(", ")
        );
    }
    if outcome.spam_flagged {
        println!(
            "  {} Flagged for review: {}",
            "!".yellow(),
            outcome.spam_words.join(", ")
        );
    }
    if !outcome.legacy_replicated {
        println!("  {} Legacy copy not written", "!".yellow());
    }
}

fn print_dedup(report: &DedupReport) {
    println!(
        "{} Movie {}: removed {} duplicate reviews, {} kept",
        "✓".green(),
        report.movie_id,
        report.removed,
        report.kept
    );
}

fn print_stats(scope: &ReconcileScope, stats: &ReviewStats) {
    println!("{}", format!("Stats for {}", scope).bold().blue());
    println!("{}Reviews: {}", "• ".cyan(), stats.total_reviews);
    println!("{}Average rating: {:.2}", "• ".cyan(), stats.average_rating);

    let widest = stats.rating_distribution.iter().copied().max().unwrap_or(0).max(1);
    for (i, count) in stats.rating_distribution.iter().enumerate().rev() {
        let bar = "█".repeat((*count as usize * 30).div_ceil(widest as usize));
        println!("  {}★ {:>4} {}", i + 1, count, bar.green());
    }

    println!("Reviews by month:");
    for period in &stats.reviews_by_month {
        println!("  {} {}", period.period, period.count);
    }
}
