use roster_match::config::{LoggingSettings, Settings};
use roster_match::services::notifier;
use roster_match::run_session;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // Initialize logging (RUST_LOG wins over the configured level)
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded, {} passes configured", settings.matching.passes.len());

    if let Err(e) = run(&settings) {
        error!("Matching run failed: {}", e);
        std::process::exit(1);
    }
}

fn run(settings: &Settings) -> roster_match::Result<()> {
    let notifier = notifier::from_settings(&settings.notify)?;
    let report = run_session(settings, notifier.as_ref())?;
    println!("{}", report.to_json()?);
    Ok(())
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}
