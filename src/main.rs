use cfip_ranker::output::print_ranked;
use cfip_ranker::{pipeline, Config};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::process::ExitCode;

const LOG_CONFIG_FILE: &str = "log4rs.yml";

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    init_logging()?;
    log::info!("#Start main()");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return Ok(ExitCode::from(2));
        }
    };
    log::debug!("{config:?}");

    let report = pipeline::run(&config).await;
    for family in &report.families {
        print_ranked(family.family, &family.ranked);
    }

    if report.is_success() {
        log::info!("#End main()");
        Ok(ExitCode::SUCCESS)
    } else {
        for family in report.families.iter().filter(|f| !f.is_success()) {
            log::warn!(
                "{}: {} ranked, output {}",
                family.family,
                family.ranked.len(),
                match &family.written {
                    Ok(_) => "written".to_string(),
                    Err(e) => e.to_string(),
                }
            );
        }
        Ok(ExitCode::FAILURE)
    }
}

/// Initialise log4rs from `log4rs.yml`, or log to the console at info level
/// when that file is missing or invalid.
fn init_logging() -> Result<(), Box<dyn Error>> {
    if let Err(file_error) = log4rs::init_file(LOG_CONFIG_FILE, Default::default()) {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%H:%M:%S)} {h({l:5})} {t} - {m}{n}",
            )))
            .build();
        let config = LogConfig::builder()
            .appender(Appender::builder().build("stdout", Box::new(stdout)))
            .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
        log4rs::init_config(config)?;
        log::warn!("{LOG_CONFIG_FILE} not loaded ({file_error}), logging to console");
    }
    Ok(())
}
