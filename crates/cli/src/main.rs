use anyhow::{Context, Result};
use catalog::{Dataset, DirectorId, Film, FilmId, User, UserId};
use clap::{Parser, Subcommand};
use colored::Colorize;
use server::{App, DirectorSort, Recommendation, SearchBy, ServiceConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Cinegraph - film ratings, friends and Slope One recommendations
#[derive(Parser)]
#[command(name = "cinegraph")]
#[command(about = "Film recommendations from a social rating graph", long_about = None)]
struct Cli {
    /// Path to the dataset directory (users.dat, films.dat, marks.dat, friends.dat)
    #[arg(short, long, default_value = "data/sample")]
    data_dir: PathBuf,

    /// Optional JSON service configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get film recommendations for a user
    Recommend {
        #[arg(long)]
        user_id: UserId,

        /// Show predicted marks and co-rater support
        #[arg(long)]
        explain: bool,
    },

    /// List a user's friends
    Friends {
        #[arg(long)]
        user_id: UserId,
    },

    /// List the friends two users have in common
    Mutual {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        other_id: UserId,
    },

    /// Make two users friends, then show the first user's friends
    Befriend {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        friend_id: UserId,
    },

    /// End a friendship, then show the first user's friends
    Unfriend {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        friend_id: UserId,
    },

    /// Mark a film (1-10), then show the user's fresh recommendations
    Rate {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        film_id: FilmId,

        #[arg(long)]
        mark: i64,
    },

    /// Show the most rated films
    Popular {
        /// Number of films (defaults to the configured popular count)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show a user profile and the films they rated
    User {
        #[arg(long)]
        user_id: UserId,
    },

    /// Search films by title and/or director name
    Search {
        /// Case-insensitive substring to look for
        #[arg(long)]
        query: String,

        /// Fields to match: title, director or title,director
        #[arg(long, default_value = "title,director")]
        by: SearchBy,
    },

    /// List a director's films
    Director {
        #[arg(long)]
        director_id: DirectorId,

        /// likes or year
        #[arg(long, default_value = "likes")]
        sort: DirectorSort,
    },

    /// Run benchmark to test recommendation latency
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
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
    let config = load_config(cli.config.as_deref())?;

    println!("Loading dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let dataset = Dataset::load_from_dir(&cli.data_dir).context("Failed to load dataset")?;
    let app = Arc::new(App::from_dataset(dataset, config));
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    match cli.command {
        Commands::Recommend { user_id, explain } => handle_recommend(&app, user_id, explain).await?,
        Commands::Friends { user_id } => handle_friends(&app, user_id).await?,
        Commands::Mutual { user_id, other_id } => handle_mutual(&app, user_id, other_id).await,
        Commands::Befriend { user_id, friend_id } => {
            let added = app.friends().add_friend(user_id, friend_id).await;
            report_friend_change(added, user_id, friend_id, "are now friends")?;
            handle_friends(&app, user_id).await?
        }
        Commands::Unfriend { user_id, friend_id } => {
            let removed = app.friends().remove_friend(user_id, friend_id).await;
            report_friend_change(removed, user_id, friend_id, "are no longer friends")?;
            handle_friends(&app, user_id).await?
        }
        Commands::Rate {
            user_id,
            film_id,
            mark,
        } => {
            let previous = app
                .recommendations()
                .rate(film_id, user_id, mark)
                .await
                .context("Failed to rate film")?;
            match previous {
                Some(old) => println!("{} Mark changed from {} to {}", "✓".green(), old.value(), mark),
                None => println!("{} Marked film {} as {}", "✓".green(), film_id, mark),
            }
            handle_recommend(&app, user_id, true).await?
        }
        Commands::Popular { count } => {
            let films = app.get_most_popular(count).await?;
            print_films("Most popular films:", &films);
        }
        Commands::User { user_id } => handle_user(&app, user_id).await?,
        Commands::Search { query, by } => {
            let films = app.films().search(&query, by).await;
            print_films(&format!("Search results for '{}' by {}:", query, by), &films);
        }
        Commands::Director { director_id, sort } => {
            let films = app.films().by_director(director_id, sort).await;
            print_films(&format!("Films by director {} ({:?} order):", director_id, sort), &films);
        }
        Commands::Benchmark { requests } => handle_benchmark(Arc::clone(&app), requests).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let Some(path) = path else {
        return Ok(ServiceConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ServiceConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    info!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

fn report_friend_change(
    outcome: server::Result<()>,
    user_id: UserId,
    friend_id: UserId,
    done: &str,
) -> Result<()> {
    match outcome {
        Ok(()) => {
            println!("{} {} and {} {}", "✓".green(), user_id, friend_id, done);
            Ok(())
        }
        Err(e) if e.is_partial_failure() => {
            println!("{} Only one side was written; run the command again to finish", "!".yellow());
            Err(e.into())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("Friend change for {} and {} failed", user_id, friend_id))),
    }
}

/// Handle the 'recommend' command
async fn handle_recommend(app: &App, user_id: UserId, explain: bool) -> Result<()> {
    let recommendations = app
        .get_recommendations(user_id)
        .await
        .with_context(|| format!("Failed to get recommendations for user {}", user_id))?;

    print_recommendations(&recommendations, explain);
    Ok(())
}

/// Handle the 'friends' command
async fn handle_friends(app: &App, user_id: UserId) -> Result<()> {
    let friends = app
        .friends()
        .get_friends(user_id)
        .await
        .with_context(|| format!("Failed to list friends of user {}", user_id))?;

    print_users(&format!("Friends of user {}:", user_id), &friends);
    Ok(())
}

/// Handle the 'mutual' command
async fn handle_mutual(app: &App, user_id: UserId, other_id: UserId) {
    let common = app.friends().get_mutual_friends(user_id, other_id).await;
    print_users(
        &format!("Friends shared by users {} and {}:", user_id, other_id),
        &common,
    );
}

/// Handle the 'user' command
async fn handle_user(app: &App, user_id: UserId) -> Result<()> {
    let user = app
        .accounts()
        .get(user_id)
        .await
        .with_context(|| format!("Failed to load user {}", user_id))?;
    let rated = app.films().liked_by(user_id).await?;

    println!("{}", format!("User ID: {}", user.id).bold().blue());
    println!("{}Login: {}", "• ".green(), user.login);
    println!("{}Name: {}", "• ".green(), user.name);
    println!("{}Email: {}", "• ".green(), user.email);
    println!("{}Birthday: {}", "• ".green(), user.birthday);
    println!("{}Friends: {}", "• ".cyan(), user.friend_ids.len());

    let marks: Vec<u32> = rated
        .iter()
        .filter_map(|film| film.mark_by(user_id))
        .map(|mark| u32::from(mark.value()))
        .collect();
    let average = if marks.is_empty() {
        0.0
    } else {
        marks.iter().sum::<u32>() as f64 / marks.len() as f64
    };
    println!("{}Number of marks: {}", "• ".cyan(), marks.len());
    println!("{}Average mark: {:.2}", "• ".cyan(), average);

    let mut top_rated: Vec<&Film> = rated.iter().collect();
    top_rated.sort_by_key(|film| std::cmp::Reverse(film.mark_by(user_id)));
    println!("Top rated films:");
    for film in top_rated.iter().take(5) {
        if let Some(mark) = film.mark_by(user_id) {
            println!("  - {} ({}) mark {}", film.name, film.release_year(), mark.value());
        }
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(app: Arc<App>, requests: usize) -> Result<()> {
    let users: Vec<UserId> = app.accounts().all().await.iter().map(|u| u.id).collect();
    if users.is_empty() || requests == 0 {
        println!("Nothing to benchmark");
        return Ok(());
    }

    // Build the model up front so the first request isn't an outlier
    app.recommendations().model().await?;

    let wall_clock = Instant::now();
    let mut handles = vec![];
    for _ in 0..requests {
        let user_id = users[rand::random_range(0..users.len())];
        let app = Arc::clone(&app);
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            app.get_recommendations(user_id).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let average = timings.iter().sum::<Duration>() / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {}", requests);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", average);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f64 / total_time.as_secs_f64()
    );
    Ok(())
}

fn genres(film: &Film) -> String {
    film.genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_recommendations(recommendations: &[Recommendation], explain: bool) {
    println!("{}", "Film Recommendations:".bold().blue());
    if recommendations.is_empty() {
        println!("  (nothing to recommend yet)");
    }
    for (idx, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} ({}) [{}] - Predicted mark: {:.2}",
            (idx + 1).to_string().green(),
            rec.film.name,
            rec.film.release_year(),
            genres(&rec.film),
            rec.predicted_mark
        );
        if explain {
            println!(
                "   Based on {} co-rating(s); {} people rated it",
                rec.support,
                rec.film.rating_count()
            );
        }
    }
}

fn print_films(header: &str, films: &[Film]) {
    println!("{}", header.bold().blue());
    for film in films {
        let directors = film
            .directors
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let average = film
            .average_mark()
            .map_or_else(|| "no marks".to_string(), |avg| format!("avg {:.1}", avg));
        println!(
            "{}: {} ({}) [{}] {} - {} rater(s), {}",
            film.id.to_string().green(),
            film.name,
            film.release_year(),
            genres(film),
            directors,
            film.rating_count(),
            average
        );
    }
}

fn print_users(header: &str, users: &[User]) {
    println!("{}", header.bold().blue());
    if users.is_empty() {
        println!("  (none)");
    }
    for user in users {
        println!("{}: {} ({})", user.id.to_string().green(), user.name, user.login);
    }
}
