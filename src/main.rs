//! SmartMarket CLI
//!
//! Commands:
//! - `smartmarket submit <input>` - analyze a URL or search a product name
//! - `smartmarket analyze <url>` - submit an analysis and wait for it
//! - `smartmarket search <name>` - cross-platform price search
//! - `smartmarket recent` / `show` / `delete` / `clear` - saved analyses
//! - `smartmarket practice` - analyze a Trustpilot / Rotten Tomatoes / Goodreads page
//! - `smartmarket upload <file>` - analyze a reviews dataset
//! - `smartmarket health` - backend status
//! - `smartmarket login` / `register` / `logout` / `whoami` / `profile`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use smartmarket_client_lib::application::{
    AnalysisOrchestrator, AnalysisState, AnalysisStatus, AuthService, HealthMonitor,
    PracticeService, RecentAnalysesCache, SearchFlow, SubmitOutcome, UploadFile, UploadService,
};
use smartmarket_client_lib::domain::{
    AnalysisResult, LoginCredentials, PracticeSentimentSummary, PracticeSource, Product,
    ProfileUpdate, RegistrationForm, SearchResult, SentimentBreakdown, SentimentLabel,
};
use smartmarket_client_lib::infrastructure::config::SessionConfig;
use smartmarket_client_lib::infrastructure::{
    init_logging_with_config, ApiClient, AppConfig, ConfigManager, FileSessionStore, Session,
};

/// SmartMarket - product sentiment analysis from the command line
#[derive(Parser)]
#[command(name = "smartmarket")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, global = true, env = "SMARTMARKET_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a product URL, or search when the input is a product name
    Submit(SubmitArgs),

    /// Submit a product URL for analysis and wait for the result
    Analyze(AnalyzeArgs),

    /// Search a product across platforms
    Search(SearchArgs),

    /// List recent analyses
    Recent(LimitArgs),

    /// Show the analysis of a product
    Show { product_id: i64 },

    /// Delete one analysis
    Delete { analysis_id: i64 },

    /// Delete every analysis
    Clear,

    /// Analyze reviews from an alternate source
    Practice(PracticeArgs),

    /// Upload a reviews file (.json, .csv, .xlsx)
    Upload { file: PathBuf },

    /// Show one product
    Product { product_id: i64 },

    /// List products
    Products(LimitArgs),

    /// Check backend status
    Health {
        /// Keep checking until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Log in and store the session token
    Login(LoginArgs),

    /// Create an account and log in
    Register(RegisterArgs),

    /// Forget the stored session token
    Logout,

    /// Show the logged in user
    Whoami,

    /// Update the profile of the logged in user
    Profile {
        #[arg(long)]
        full_name: String,
    },
}

#[derive(Args)]
struct SubmitArgs {
    input: String,
    /// Platform hint for URL submissions
    #[arg(short, long)]
    platform: Option<String>,
}

#[derive(Args)]
struct AnalyzeArgs {
    url: String,
    #[arg(short, long)]
    platform: Option<String>,
}

#[derive(Args)]
struct SearchArgs {
    name: String,
    /// Restrict to these platforms (repeatable)
    #[arg(short, long = "platform")]
    platforms: Vec<String>,
}

#[derive(Args)]
struct LimitArgs {
    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct PracticeArgs {
    /// trustpilot, rottentomatoes or goodreads
    #[arg(short, long)]
    source: PracticeSource,
    /// Title, slug or page URL
    input: String,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "SMARTMARKET_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    full_name: String,
    #[arg(long, env = "SMARTMARKET_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    confirm_password: String,
}

struct Context {
    config: AppConfig,
    client: ApiClient,
    json: bool,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let manager = cli
            .config
            .as_ref()
            .map_or_else(ConfigManager::new, ConfigManager::with_path);
        let mut config = manager.load_config().context("Failed to load configuration")?;

        if let Some(api_url) = &cli.api_url {
            config.api.base_url.clone_from(api_url);
            config.validate()?;
        }
        if cli.verbose {
            config.logging.level = "debug".to_string();
        }
        init_logging_with_config(&config.logging)?;

        let session = open_session(&config.session)?;
        let client = ApiClient::from_config(&config.api, session)
            .context("Failed to create HTTP client")?;
        debug!("Using backend {}", client.base_url());

        Ok(Self {
            config,
            client,
            json: cli.json,
        })
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn open_session(config: &SessionConfig) -> Result<Session> {
    let path = match &config.file {
        Some(file) => PathBuf::from(file),
        None => FileSessionStore::default_path()?,
    };
    Ok(Session::new(Arc::new(FileSessionStore::open(path)), config.token_key.as_str()))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Context::load(&cli) {
        Ok(ctx) => run(cli.command, &ctx).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Submit(args) => submit(args, ctx).await,
        Commands::Analyze(args) => analyze(&args.url, args.platform.as_deref(), ctx).await,
        Commands::Search(args) => {
            let flow = search_flow(ctx);
            let results = flow.search(&args.name, &args.platforms).await?;
            print_search_results(&results, ctx)
        }
        Commands::Recent(args) => {
            let cache = RecentAnalysesCache::new(
                ctx.client.clone(),
                args.limit.unwrap_or(ctx.config.recent.limit),
            );
            let analyses = cache.refresh().await?;
            print_recent(&analyses, ctx)
        }
        Commands::Show { product_id } => {
            let result = ctx.client.get_analysis(product_id).await?;
            print_analysis(&result, ctx)
        }
        Commands::Delete { analysis_id } => {
            let cache = RecentAnalysesCache::new(ctx.client.clone(), ctx.config.recent.limit);
            cache.delete(analysis_id).await?;
            println!("🗑️ Deleted analysis {analysis_id}");
            Ok(())
        }
        Commands::Clear => {
            let cache = RecentAnalysesCache::new(ctx.client.clone(), ctx.config.recent.limit);
            cache.clear_all().await?;
            println!("🧹 All analyses cleared");
            Ok(())
        }
        Commands::Practice(args) => {
            let practice = PracticeService::new(ctx.client.clone());
            let analysis = practice.analyze(args.source, &args.input).await?;
            if ctx.json {
                return ctx.print_json(&analysis.summary);
            }
            println!("🎯 {} - \"{}\"", analysis.source, analysis.query);
            print_practice_summary(&analysis.summary);
            Ok(())
        }
        Commands::Upload { file } => {
            let upload = UploadService::new(ctx.client.clone());
            let file = UploadFile::from_path(&file).await?;
            let response = upload.upload(Some(file)).await?;
            if ctx.json {
                return ctx.print_json(&response);
            }
            println!("📊 {} (product #{})", response.product_name, response.product_id);
            print_breakdown(&response, response.sentiment_label);
            println!("   {}", response.opinion_summary);
            Ok(())
        }
        Commands::Product { product_id } => {
            let product = ctx.client.get_product(product_id).await?;
            print_products(std::slice::from_ref(&product), ctx)
        }
        Commands::Products(args) => {
            let products = ctx
                .client
                .list_products(args.limit.unwrap_or(ctx.config.recent.limit))
                .await?;
            print_products(&products, ctx)
        }
        Commands::Health { watch } => health(watch, ctx).await,
        Commands::Login(args) => {
            let auth = AuthService::new(ctx.client.clone());
            auth.login(&LoginCredentials {
                email: args.email,
                password: args.password,
            })
            .await?;
            println!("🔓 Logged in");
            Ok(())
        }
        Commands::Register(args) => {
            let auth = AuthService::new(ctx.client.clone());
            let user = auth
                .register(RegistrationForm {
                    email: args.email,
                    username: args.username,
                    password: args.password,
                    confirm_password: args.confirm_password,
                    full_name: args.full_name,
                })
                .await?;
            println!("👤 Welcome, {}", user.full_name);
            Ok(())
        }
        Commands::Logout => {
            AuthService::new(ctx.client.clone()).logout()?;
            println!("👋 Logged out");
            Ok(())
        }
        Commands::Whoami => {
            let auth = AuthService::new(ctx.client.clone());
            match auth.restore().await {
                Some(user) if ctx.json => ctx.print_json(&user),
                Some(user) => {
                    println!("👤 {} <{}> ({})", user.username, user.email, user.full_name);
                    Ok(())
                }
                None => {
                    println!("Not logged in");
                    Ok(())
                }
            }
        }
        Commands::Profile { full_name } => {
            let auth = AuthService::new(ctx.client.clone());
            let user = auth.update_profile(&ProfileUpdate { full_name }).await?;
            println!("✏️ Profile updated: {}", user.full_name);
            Ok(())
        }
    }
}

fn search_flow(ctx: &Context) -> SearchFlow {
    let orchestrator = Arc::new(AnalysisOrchestrator::new(ctx.client.clone(), ctx.config.polling));
    SearchFlow::new(ctx.client.clone(), orchestrator, ctx.config.analysis.default_platform.as_str())
}

async fn submit(args: SubmitArgs, ctx: &Context) -> Result<()> {
    let flow = search_flow(ctx);
    match flow.submit(&args.input, args.platform.as_deref()).await? {
        SubmitOutcome::Search(results) => print_search_results(&results, ctx),
        SubmitOutcome::Analysis(handle) => {
            let state = follow(flow.orchestrator(), handle).await?;
            finish_analysis(&state, ctx)
        }
    }
}

async fn analyze(url: &str, platform: Option<&str>, ctx: &Context) -> Result<()> {
    let orchestrator = AnalysisOrchestrator::new(ctx.client.clone(), ctx.config.polling);
    let platform = platform.unwrap_or(&ctx.config.analysis.default_platform);
    let handle = orchestrator.start(url, Some(platform));
    let state = follow(&orchestrator, handle).await?;
    finish_analysis(&state, ctx)
}

/// Print progress until the chain stops; Ctrl-C cancels it
async fn follow(
    orchestrator: &AnalysisOrchestrator,
    handle: smartmarket_client_lib::AnalysisHandle,
) -> Result<AnalysisState> {
    let mut updates = orchestrator.subscribe();
    let max_attempts = orchestrator.polling().max_attempts;
    let mut wait = Box::pin(handle.wait());

    loop {
        tokio::select! {
            state = &mut wait => return Ok(state?),
            changed = updates.changed() => {
                if changed.is_err() {
                    continue;
                }
                let status = updates.borrow_and_update().status;
                match status {
                    AnalysisStatus::Submitting => eprintln!("📨 Submitting..."),
                    AnalysisStatus::Polling { attempt } => {
                        eprintln!("🔄 Waiting for results ({attempt}/{max_attempts})");
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                orchestrator.reset();
                anyhow::bail!("Analysis cancelled");
            }
        }
    }
}

fn finish_analysis(state: &AnalysisState, ctx: &Context) -> Result<()> {
    match (&state.status, &state.result, &state.error) {
        (AnalysisStatus::Succeeded, Some(result), _) => print_analysis(result, ctx),
        (_, _, Some(error)) => Err(error.clone().into()),
        (status, _, _) => anyhow::bail!("Analysis stopped while {status:?}"),
    }
}

async fn health(watch: bool, ctx: &Context) -> Result<()> {
    if !watch {
        let status = smartmarket_client_lib::application::health_monitor::check(&ctx.client).await;
        println!("🩺 Backend {} is {}", ctx.client.base_url(), status);
        return Ok(());
    }

    let monitor = HealthMonitor::spawn(ctx.client.clone(), ctx.config.health.interval());
    let mut updates = monitor.subscribe();
    println!("🩺 Watching {} (Ctrl-C to stop)", ctx.client.base_url());
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *updates.borrow_and_update();
                println!("{} backend is {}", chrono::Local::now().format("%H:%M:%S"), status);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    monitor.stop();
    Ok(())
}

fn print_analysis(result: &AnalysisResult, ctx: &Context) -> Result<()> {
    if ctx.json {
        return ctx.print_json(result);
    }

    println!("📊 {} (product #{})", result.product_name, result.product_id);
    if let Some(price) = result.product_price {
        println!("   Price: ${price:.2}");
    }
    print_breakdown(result, result.sentiment_label);
    if !result.keywords.is_empty() {
        println!("   Keywords: {}", result.keywords.join(", "));
    }
    if let Some(comparison) = result.price_comparison() {
        println!("   Price comparison:");
        for entry in &comparison.entries {
            println!("     {:<14} ${:.2}", entry.platform, entry.price);
        }
        if comparison.entries.len() > 1 {
            println!("     Save up to ${:.2}", comparison.savings());
        }
    }
    println!("   Analyzed at {}", result.analyzed_at.format("%Y-%m-%d %H:%M"));
    Ok(())
}

fn print_breakdown(breakdown: &impl SentimentBreakdown, label: SentimentLabel) {
    println!(
        "   Sentiment: {} ({:.1}/5) over {} reviews",
        label,
        breakdown.scaled_score(),
        breakdown.total_reviews()
    );
    println!(
        "   👍 {}  😐 {}  👎 {}",
        breakdown.format_percentage(SentimentLabel::Positive),
        breakdown.format_percentage(SentimentLabel::Neutral),
        breakdown.format_percentage(SentimentLabel::Negative)
    );
}

fn print_practice_summary(summary: &PracticeSentimentSummary) {
    println!("   ⭐ {:.1}", summary.stars);
    print_breakdown(summary, summary.sentiment_label);
    if !summary.keywords.is_empty() {
        println!("   Keywords: {}", summary.keywords.join(", "));
    }
    println!("   {}", summary.opinion_summary);
}

fn print_search_results(results: &[SearchResult], ctx: &Context) -> Result<()> {
    if ctx.json {
        return ctx.print_json(&results);
    }
    if results.is_empty() {
        println!("No products found");
        return Ok(());
    }
    for result in results {
        let rating = result.rating.map_or_else(String::new, |r| format!(" ⭐ {r:.1}"));
        println!("🛒 [{}] {} - ${:.2}{}", result.platform, result.name, result.price, rating);
        println!("   {}", result.url);
    }
    Ok(())
}

fn print_recent(analyses: &[AnalysisResult], ctx: &Context) -> Result<()> {
    if ctx.json {
        return ctx.print_json(&analyses);
    }
    if analyses.is_empty() {
        println!("No analyses yet");
        return Ok(());
    }
    for analysis in analyses {
        println!(
            "#{:<5} {:<40} {:<8} {:>5.1}/5  {} reviews",
            analysis.id,
            analysis.product_name,
            analysis.sentiment_label,
            analysis.scaled_score(),
            analysis.total_reviews
        );
    }
    Ok(())
}

fn print_products(products: &[Product], ctx: &Context) -> Result<()> {
    if ctx.json {
        return ctx.print_json(&products);
    }
    for product in products {
        let price = product.price.map_or_else(|| "-".to_string(), |p| format!("${p:.2}"));
        println!("#{:<5} [{}] {} {}", product.id, product.platform, product.name, price);
        println!("   {}", product.url);
    }
    Ok(())
}
