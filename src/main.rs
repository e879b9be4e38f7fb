use std::sync::Arc;

use log::{LevelFilter, info};
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};

use cricket_persistence_sqlite::{
    create_db_pool, init_schema, matches::SqliteMatchRepository,
    standings::SqlitePointsTableRepository, stats::SqliteStatisticsRepository,
    tournaments::{SqliteTournamentRepository, SqliteVenueRepository},
};
use cricket_server_domain::{
    fixture::FixtureSchedulerImpl,
    r#match::MatchResultServiceImpl,
    standings::{FlatNetRunRate, StandingsServiceImpl},
    stats::CareerStatsServiceImpl,
};

mod api;

const LOG_SIZE_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

const LOG_FILE_COUNT: u32 = 3;

fn init_logger() {
    let file_path = std::env::var("LOG_FILE_PATH").expect("LOG_FILE_PATH must be set");
    let archive_pattern =
        std::env::var("LOG_ARCHIVE_PATTERN").expect("LOG_ARCHIVE_PATTERN must be set");

    let stderr_level = LevelFilter::Info;
    let file_level = LevelFilter::Debug;

    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();

    let trigger = SizeTrigger::new(LOG_SIZE_LIMIT);
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern, LOG_FILE_COUNT)
        .unwrap();
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = log4rs::append::rolling_file::RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build(file_path, Box::new(policy))
        .unwrap();

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(file_level)))
                .build("logfile", Box::new(logfile)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(stderr_level)))
                .build("stderr", Box::new(stderr)),
        )
        .build(
            Root::builder()
                .appender("logfile")
                .appender("stderr")
                .build(LevelFilter::Trace),
        )
        .unwrap();

    let _handle = log4rs::init_config(config).expect("Failed to initialize logger");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().expect("Failed to load .env file");

    init_logger();

    let pool = create_db_pool();
    init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    let tournament_repository = Arc::new(SqliteTournamentRepository::new(pool.clone()));
    let venue_repository = Arc::new(SqliteVenueRepository::new(pool.clone()));
    let match_repository = Arc::new(SqliteMatchRepository::new(pool.clone()));
    let points_table_repository = Arc::new(SqlitePointsTableRepository::new(pool.clone()));
    let statistics_repository = Arc::new(SqliteStatisticsRepository::new(pool.clone()));

    let standings_service = Arc::new(StandingsServiceImpl::new(
        points_table_repository.clone(),
        Arc::new(FlatNetRunRate),
    ));
    let fixture_scheduler = Arc::new(FixtureSchedulerImpl::new(
        tournament_repository.clone(),
        venue_repository.clone(),
        match_repository.clone(),
    ));
    let match_result_service = Arc::new(MatchResultServiceImpl::new(
        match_repository.clone(),
        standings_service.clone(),
    ));
    let career_stats_service = Arc::new(CareerStatsServiceImpl::new(statistics_repository.clone()));

    let state = api::AppState {
        fixture_scheduler,
        match_result_service,
        career_stats_service,
        points_table_repository,
        statistics_repository,
    };

    info!("Cricket server starting");
    api::run(state, shutdown_signal()).await;
}
