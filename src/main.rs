//! Stepwright - declarative web-UI test runner.
//!
//! Main entry point: loads configuration, then either runs a JSON test case
//! or autonomously explores a site.

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stepwright_browser::Browser;
use stepwright_classify::SentimentClassifier;
use stepwright_config::{Config, ConfigLoader};
use stepwright_core::driver::SessionProvider;
use stepwright_core::{LeadData, Runner, TestCase, VariableMap};
use stepwright_explore::{ExplorationState, Explorer};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Run {
            test_case,
            var,
            keep_open,
            generate_lead,
        } => {
            config.validate()?;
            run_test_case(config, test_case, var, keep_open, generate_lead).await
        }
        Commands::Explore {
            url,
            max_depth,
            headless,
        } => {
            if let Some(depth) = max_depth {
                config.max_depth = depth;
            }
            if headless {
                config.headless = true;
            }
            config.validate()?;
            explore_site(config, url).await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn run_test_case(
    config: Config,
    test_case: PathBuf,
    var: Vec<String>,
    keep_open: bool,
    generate_lead: bool,
) -> anyhow::Result<()> {
    let case = TestCase::from_path(&test_case)
        .with_context(|| format!("loading test case from {}", test_case.display()))?;

    let mut variables = parse_vars(&var)?;
    if generate_lead {
        let lead = LeadData::generate(&mut rand::thread_rng());
        info!("Generated lead: {} {}", lead.first_name, lead.last_name);
        for (key, value) in lead.into_vars() {
            // Explicit --var values win over generated ones.
            variables.entry(key).or_insert(value);
        }
    }

    let config = Arc::new(config);
    let session = Arc::new(Browser::new(&config));
    let mut runner = Runner::new(config, session)?;

    runner.run(&case, &variables, !keep_open).await?;
    info!("Test case completed successfully");
    Ok(())
}

async fn explore_site(config: Config, url: String) -> anyhow::Result<()> {
    let browser = Browser::new(&config);
    let classifier = SentimentClassifier::new(
        config.ai_model.clone(),
        config.classifier_endpoint.clone(),
    );

    info!("Starting test exploration of {}", url);
    let page = browser.open().await?;
    let explorer = Explorer::new(page.as_ref(), &classifier, &config);
    let mut state = ExplorationState::new(config.max_depth);

    let result = explorer.explore(url, &mut state).await;
    info!("Visited {} pages", state.visited().len());

    // Teardown happens before the walk result is surfaced.
    if let Err(e) = browser.close().await {
        warn!("Error closing browser: {}", e);
    }

    result?;
    info!("Exploration completed successfully");
    Ok(())
}

fn parse_vars(pairs: &[String]) -> anyhow::Result<VariableMap> {
    let mut vars = VariableMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                vars.insert(key.to_string(), value.to_string());
            }
            _ => bail!("invalid variable '{}', expected KEY=VALUE", pair),
        }
    }
    Ok(vars)
}
