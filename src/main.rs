use anyhow::{Context, Result};
use card_catalog_sync::catalog_store::{CardFilter, CatalogFamily, SqliteCardStore};
use card_catalog_sync::config::{AppConfig, CliConfig, FileConfig, SyncSettings};
use card_catalog_sync::http::{RateLimitedClient, ReqwestTransport, RequestThrottle};
use card_catalog_sync::sync::{watch, Locale, MarkerStore, SyncJob, SyncOutcome};
use card_catalog_sync::ygoprodeck::CatalogFetcher;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;
use cli_style::{
    get_styles, print_empty_list, print_error, print_key_value, print_section_footer,
    print_section_header, print_success, print_warning, Align, TableBuilder,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Could not resolve current directory")?;
    Ok(cwd.join(path))
}

#[derive(Parser, Debug)]
#[command(
    name = "card-sync",
    version = concat!(env!("APP_VERSION"), "-", env!("GIT_HASH")),
    about = "Keeps a local SQLite copy of the YGOPRODeck card catalog in sync",
    styles = get_styles()
)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the flags below.
    #[clap(long, value_parser = parse_path)]
    config: Option<PathBuf>,

    /// Directory holding catalog.db.
    #[clap(long, value_parser = parse_path)]
    db_dir: Option<PathBuf>,

    /// Directory for version marker files. Defaults to the db directory.
    #[clap(long, value_parser = parse_path)]
    marker_dir: Option<PathBuf>,

    /// Base URL of the card API.
    #[clap(long)]
    api_base_url: Option<String>,

    /// Default log level (error, warn, info, debug, trace). LOG_LEVEL wins if set.
    #[clap(long)]
    logging_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync the localized catalog.
    Sync {
        /// Download and apply even if the upstream version is unchanged.
        #[clap(long)]
        force: bool,
        /// Language code to fetch. Defaults to the configured language.
        /// Switching languages needs --force unless the upstream version changed.
        #[clap(long)]
        language: Option<String>,
    },
    /// Sync the English catalog.
    SyncEn {
        #[clap(long)]
        force: bool,
    },
    /// Sync both catalogs now and then periodically until interrupted.
    Watch {
        #[clap(long)]
        interval_hours: Option<u64>,
    },
    /// Search cards by a single field, e.g. `search name dragon` or `search atk_gte 2500`.
    Search {
        /// Search the English catalog instead of the localized one.
        #[clap(long)]
        en: bool,
        field: String,
        query: String,
        #[clap(long, default_value_t = 25)]
        limit: usize,
    },
    /// Show one card and its printings.
    Show {
        #[clap(long)]
        en: bool,
        id: i64,
    },
    /// List recent sync runs.
    History {
        #[clap(long)]
        en: bool,
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },
}

fn family(en: bool) -> CatalogFamily {
    if en {
        CatalogFamily::English
    } else {
        CatalogFamily::Localized
    }
}

fn build_fetcher(settings: &SyncSettings) -> Result<Arc<CatalogFetcher>> {
    let transport = ReqwestTransport::new(&settings.transport_settings())
        .context("Failed to build HTTP client")?;
    let throttle = Arc::new(RequestThrottle::new(settings.max_requests_per_sec));
    let http = RateLimitedClient::new(Box::new(transport), throttle, settings.retry_policy());
    Ok(Arc::new(CatalogFetcher::new(
        Arc::new(http),
        &settings.api_base_url,
    )))
}

fn print_outcome(locale: &Locale, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::UpToDate { remote_version } => {
            print_success(&format!(
                "{} catalog already at {}",
                locale, remote_version
            ));
        }
        SyncOutcome::Done(report) => {
            print_section_header(&format!("{} sync", locale));
            print_key_value("Version", &report.remote_version.to_string());
            print_key_value("Forced", if report.forced { "yes" } else { "no" });
            print_key_value(
                "Cards",
                &format!(
                    "{} ({} new, {} updated)",
                    report.cards(),
                    report.cards_created,
                    report.cards_updated
                ),
            );
            print_key_value(
                "Printings",
                &format!(
                    "{} ({} new, {} updated, {} skipped)",
                    report.printings(),
                    report.printings_created,
                    report.printings_updated,
                    report.printings_skipped
                ),
            );
            print_section_footer();
            if report.marker_persisted {
                print_success("Catalog synced");
            } else {
                print_warning(
                    "Catalog synced, but the version marker could not be saved. The next run will sync again.",
                );
            }
        }
    }
}

fn run_sync(
    config: &AppConfig,
    store: Arc<SqliteCardStore>,
    locale: Locale,
    force: bool,
) -> Result<()> {
    let fetcher = build_fetcher(&config.sync)?;
    let job = SyncJob::new(
        locale.clone(),
        fetcher,
        store,
        MarkerStore::new(&config.marker_dir),
    );
    let outcome = job.run(force)?;
    print_outcome(&locale, &outcome);
    Ok(())
}

fn run_watch(config: &AppConfig, store: Arc<SqliteCardStore>, interval: Duration) -> Result<()> {
    let fetcher = build_fetcher(&config.sync)?;
    let markers = MarkerStore::new(&config.marker_dir);
    let jobs = vec![
        Arc::new(SyncJob::new(
            Locale::localized(config.sync.default_language.clone()),
            fetcher.clone(),
            store.clone(),
            markers.clone(),
        )),
        Arc::new(SyncJob::new(Locale::English, fetcher, store, markers)),
    ];

    // Declared after `jobs` so the runtime is dropped first. The blocking
    // HTTP client must not be dropped from inside the runtime.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let stats = runtime.block_on(watch::run_periodically(
        jobs.clone(),
        interval,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        },
    ));
    drop(runtime);

    print_success(&format!(
        "Stopped after {} round(s), {} failed run(s)",
        stats.rounds, stats.failures
    ));
    Ok(())
}

fn run_search(
    store: &SqliteCardStore,
    family: CatalogFamily,
    field: &str,
    query: &str,
    limit: usize,
) -> Result<()> {
    let filter = CardFilter::parse(field, query)?;
    let cards = store.search_cards(family, &filter, limit)?;

    print_section_header(&format!("{} cards matching {} = {:?}", family, field, query));
    if cards.is_empty() {
        print_empty_list("No cards found");
    } else {
        let mut table = TableBuilder::new(&["ID", "Name", "Type", "ATK", "DEF", "Level"])
            .align(0, Align::Right)
            .align(3, Align::Right)
            .align(4, Align::Right)
            .align(5, Align::Right);
        let stat = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        for card in &cards {
            table.add_row(vec![
                card.id.to_string(),
                card.name.clone(),
                card.card_type.clone(),
                stat(card.atk),
                stat(card.def_stat),
                stat(card.level),
            ]);
        }
        table.print();
    }
    print_section_footer();
    Ok(())
}

fn run_show(store: &SqliteCardStore, family: CatalogFamily, id: i64) -> Result<()> {
    let Some(entry) = store.get_card(family, id)? else {
        print_warning(&format!("No {} card with id {}", family, id));
        return Ok(());
    };
    let card = &entry.card;

    print_section_header(&card.name);
    print_key_value("ID", &card.id.to_string());
    print_key_value("Type", &card.card_type);
    print_key_value("Frame", &card.frame_type);
    if !card.race.is_empty() {
        print_key_value("Race", &card.race);
    }
    if !card.attribute.is_empty() {
        print_key_value("Attribute", &card.attribute);
    }
    if let Some(level) = card.level {
        print_key_value("Level", &level.to_string());
    }
    if let (Some(atk), Some(def)) = (card.atk, card.def_stat) {
        print_key_value("ATK / DEF", &format!("{} / {}", atk, def));
    }
    print_key_value("Text", &card.description);
    print_section_footer();

    if entry.printings.is_empty() {
        print_empty_list("No printings");
        return Ok(());
    }
    let mut table =
        TableBuilder::new(&["Set code", "Set", "Rarity", "Price"]).align(3, Align::Right);
    for printing in &entry.printings {
        table.add_row(vec![
            printing.set_code.clone(),
            printing.set_name.clone(),
            printing.set_rarity.clone(),
            printing
                .set_price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.print();
    Ok(())
}

fn run_history(store: &SqliteCardStore, family: CatalogFamily, limit: usize) -> Result<()> {
    let runs = store.sync_history(family, limit)?;
    print_section_header(&format!("{} sync history", family));
    if runs.is_empty() {
        print_empty_list("No sync has completed yet");
    } else {
        let mut table = TableBuilder::new(&["Finished", "Version", "Forced", "Cards", "Printings", "Skipped"])
            .max_cell_width(32)
            .align(3, Align::Right)
            .align(4, Align::Right)
            .align(5, Align::Right);
        for run in &runs {
            let finished = Utc
                .timestamp_opt(run.finished_at, 0)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| run.finished_at.to_string());
            table.add_row(vec![
                finished,
                run.remote_version.clone(),
                if run.forced { "yes" } else { "no" }.to_string(),
                run.cards.to_string(),
                run.printings.to_string(),
                run.skipped_printings.to_string(),
            ]);
        }
        table.print();
    }
    print_section_footer();
    Ok(())
}

fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir.clone(),
        marker_dir: cli_args.marker_dir.clone(),
        api_base_url: cli_args.api_base_url.clone(),
        logging_level: cli_args.logging_level.clone(),
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(config.logging_level.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    info!(
        "card-sync {}-{} using {:?}",
        env!("APP_VERSION"),
        env!("GIT_HASH"),
        config.catalog_db_path()
    );
    let store = Arc::new(SqliteCardStore::open(config.catalog_db_path())?);

    match cli_args.command {
        Command::Sync { force, language } => {
            let language = language.unwrap_or_else(|| config.sync.default_language.clone());
            run_sync(&config, store, Locale::localized(language), force)
        }
        Command::SyncEn { force } => run_sync(&config, store, Locale::English, force),
        Command::Watch { interval_hours } => {
            let interval = match interval_hours {
                Some(0) => anyhow::bail!("--interval-hours must be at least 1"),
                Some(hours) => Duration::from_secs(hours.saturating_mul(60 * 60)),
                None => config.sync.watch_interval,
            };
            run_watch(&config, store, interval)
        }
        Command::Search {
            en,
            field,
            query,
            limit,
        } => run_search(&store, family(en), &field, &query, limit),
        Command::Show { en, id } => run_show(&store, family(en), id),
        Command::History { en, limit } => run_history(&store, family(en), limit),
    }
}

fn main() {
    let cli_args = CliArgs::parse();
    if let Err(e) = run(cli_args) {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
