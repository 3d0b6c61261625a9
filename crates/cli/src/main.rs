use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use recommender::{BuildConfig, Model, ModelHandle, MovieRecommendation, DEFAULT_MODEL_FILE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// reel-knn - item-to-item movie recommender
#[derive(Parser)]
#[command(name = "reel-knn")]
#[command(about = "Movie recommendations from cosine similarity between rating patterns", long_about = None)]
struct Cli {
    /// Path to the saved model file
    #[arg(short, long, global = true, env = "REEL_KNN_MODEL", default_value = DEFAULT_MODEL_FILE)]
    model: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a model from MovieLens-style CSV files and save it
    Build {
        /// Ratings CSV (userId, movieId, rating, ...)
        #[arg(long)]
        ratings: PathBuf,

        /// Movies CSV (movieId, title, genres)
        #[arg(long)]
        movies: PathBuf,

        /// Keep movies with strictly more votes than this
        #[arg(long, default_value = "10")]
        min_movie_votes: u32,

        /// Keep users with strictly more votes than this
        #[arg(long, default_value = "50")]
        min_user_votes: u32,

        /// Neighbour capacity of the index
        #[arg(long, default_value = "20")]
        neighbors: usize,
    },

    /// Recommend movies similar to the first title matching the query
    Recommend {
        /// Title text (case-insensitive substring match)
        #[arg(long)]
        query: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        count: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Search for movies by title
    Search {
        /// Title text (case-insensitive substring match)
        #[arg(long)]
        title: String,

        /// Maximum number of matches to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show model statistics
    Info,

    /// Run concurrent queries against the loaded model
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Maximum requests in flight at once
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Recommendations per request
        #[arg(long, default_value = "10")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            ratings,
            movies,
            min_movie_votes,
            min_user_votes,
            neighbors,
        } => {
            let config = BuildConfig::new()
                .with_min_movie_votes(min_movie_votes)
                .with_min_user_votes(min_user_votes)
                .with_max_neighbors(neighbors);
            handle_build(&cli.model, &ratings, &movies, config)?
        }
        Commands::Recommend { query, count, json } => {
            handle_recommend(&cli.model, &query, count, json)?
        }
        Commands::Search { title, limit } => handle_search(&cli.model, &title, limit)?,
        Commands::Info => handle_info(&cli.model)?,
        Commands::Benchmark {
            requests,
            concurrent,
            count,
        } => handle_benchmark(&cli.model, requests, concurrent, count).await?,
    }

    Ok(())
}

fn load_model(path: &Path) -> Result<Model> {
    let start = Instant::now();
    let model = Model::load(path)
        .with_context(|| format!("Failed to load model. Run `reel-knn build` first to create {}", path.display()))?;
    // stderr keeps `--json` output clean
    eprintln!("{} Loaded model in {:?}", "✓".green(), start.elapsed());
    Ok(model)
}

/// Handle the 'build' command
fn handle_build(model_path: &Path, ratings: &Path, movies: &Path, config: BuildConfig) -> Result<()> {
    println!("Loading ratings from {} and movies from {}...", ratings.display(), movies.display());
    let start = Instant::now();
    let model = Model::from_files(ratings, movies, config).context("Failed to build model")?;
    println!("{} Built model in {:?}", "✓".green(), start.elapsed());

    model.save(model_path)?;
    println!("{} Saved model to {}", "✓".green(), model_path.display());
    print_stats(&model);
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(model_path: &Path, query: &str, count: usize, json: bool) -> Result<()> {
    let handle = ModelHandle::new(load_model(model_path)?);
    println!("{}", render_recommendations(&handle, query, count, json)?);
    Ok(())
}

/// Recommendations for `query` as stdout text. Failures, including an
/// unknown or filtered title, are errors so the process exits non-zero.
fn render_recommendations(handle: &ModelHandle, query: &str, count: usize, json: bool) -> Result<String> {
    let recommendations = handle
        .recommend(query, count)
        .with_context(|| format!("No recommendations for '{}'", query))?;

    if json {
        Ok(serde_json::to_string_pretty(&recommendations)?)
    } else {
        Ok(format_recommendations(query, &recommendations))
    }
}

/// Handle the 'search' command
fn handle_search(model_path: &Path, title: &str, limit: usize) -> Result<()> {
    let handle = ModelHandle::new(load_model(model_path)?);
    let hits = handle.service()?.search(title, limit)?;

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if hits.is_empty() {
        println!("  (no matches)");
    }
    for hit in &hits {
        let marker = if hit.in_matrix { "•".green() } else { "·".dimmed() };
        println!("{} {}: {}", marker, hit.movie_id, hit.title);
    }
    if hits.iter().any(|hit| !hit.in_matrix) {
        println!("{}", "  Dimmed entries have too few ratings to recommend from".dimmed());
    }
    Ok(())
}

/// Handle the 'info' command
fn handle_info(model_path: &Path) -> Result<()> {
    let model = load_model(model_path)?;
    print_stats(&model);
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    model_path: &Path,
    requests: usize,
    concurrent: usize,
    count: usize,
) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("--requests and --concurrent must be positive");
    }

    let handle = Arc::new(ModelHandle::new(load_model(model_path)?));
    let model = handle.snapshot().ok_or_else(|| anyhow!("Model not loaded"))?;

    // Queryable titles only, so every request exercises the full path
    let titles: Vec<String> = model
        .row_map()
        .movies()
        .iter()
        .filter_map(|&id| model.catalog().get(id).map(|m| m.title.clone()))
        .collect();
    if titles.is_empty() {
        bail!("Model has no queryable movies");
    }
    let queries: Vec<String> = (0..requests)
        .map(|_| titles[rand::random::<u32>() as usize % titles.len()].clone())
        .collect();

    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrent));
    let wall_clock = Instant::now();
    let mut tasks = Vec::with_capacity(requests);
    for query in queries {
        let handle = Arc::clone(&handle);
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        tasks.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            handle.recommend(&query, count)?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    let mut failures = 0usize;
    for task in tasks {
        match task.await? {
            Ok(elapsed) => timings.push(elapsed),
            Err(err) => {
                warn!("Benchmark request failed: {}", err);
                failures += 1;
            }
        }
    }
    let total_time = wall_clock.elapsed();
    if timings.is_empty() {
        bail!("All {} benchmark requests failed", failures);
    }

    timings.sort();
    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let throughput = timings.len() as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} failed, {} concurrent)", requests, failures, concurrent);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_stats(model: &Model) {
    let stats = model.stats();
    println!("{}", "Model:".bold().blue());
    println!("{}Movies in matrix: {}", "• ".green(), stats.movies_in_matrix);
    println!("{}Users in matrix: {}", "• ".green(), stats.users_in_matrix);
    println!("{}Stored ratings: {}", "• ".green(), stats.stored_ratings);
    println!("{}Density: {:.4}%", "• ".green(), stats.density * 100.0);
    println!("{}Catalog size: {}", "• ".cyan(), stats.catalog_size);
    println!(
        "{}Thresholds: movies > {} votes, users > {} votes",
        "• ".cyan(),
        stats.config.min_movie_votes,
        stats.config.min_user_votes
    );
    println!("{}Neighbour capacity: {}", "• ".cyan(), stats.config.max_neighbors);
}

fn format_recommendations(query: &str, recommendations: &[MovieRecommendation]) -> String {
    let mut out = format!("Movies similar to '{}':", query).bold().blue().to_string();
    for (i, rec) in recommendations.iter().enumerate() {
        let genres = if rec.genres.is_empty() {
            String::new()
        } else {
            format!(" [{}]", rec.genres.join(", "))
        };
        out.push_str(&format!(
            "\n{}. {}{} - distance {:.4} (similarity {:.2})",
            (i + 1).to_string().green(),
            rec.title,
            genres,
            rec.distance,
            rec.similarity()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Catalog, Movie, Rating};

    fn handle() -> ModelHandle {
        let catalog = Catalog::from_movies(vec![
            Movie::new(1, "Alpha (1990)"),
            Movie::new(2, "Beta (1991)"),
            Movie::new(3, "Alpha Returns (1993)"),
        ])
        .unwrap();
        let ratings = vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 4.0),
            Rating::new(3, 10, 5.0),
            Rating::new(3, 20, 4.5),
            Rating::new(2, 10, 3.0),
        ];
        let config = BuildConfig::new().with_min_movie_votes(1).with_min_user_votes(1);
        ModelHandle::new(Model::build(&ratings, catalog, config).unwrap())
    }

    #[test]
    fn test_json_output_lists_recommendations() {
        let out = render_recommendations(&handle(), "alpha", 5, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["movie_id"], 3);
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_not_found_is_an_error_in_every_format() {
        for json in [false, true] {
            let err = render_recommendations(&handle(), "gamma", 5, json).unwrap_err();
            assert!(err.to_string().contains("No recommendations for 'gamma'"));

            // Movie 2 is in the catalog but has too few votes for the matrix
            let err = render_recommendations(&handle(), "beta", 5, json).unwrap_err();
            assert!(format!("{:#}", err).contains("too few ratings"));
        }
    }
}
