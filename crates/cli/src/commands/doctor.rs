//! `surveyor doctor` diagnoses configuration, data files and the provider.

use std::sync::Arc;

use surveyor_config::AppConfig;
use surveyor_core::error::SearchError;
use surveyor_core::provider::Provider;
use surveyor_core::search::SurveySearch;
use surveyor_providers::ProviderRouter;
use surveyor_surveys::{EmbeddedIndex, SurveyStore};

use super::CliResult;

pub async fn run() -> CliResult {
    println!("Surveyor Doctor: System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  [!!] No config file, run `surveyor onboard` (using defaults)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok] Config valid");
            config
        }
        Err(e) => {
            println!("  [!!] Config invalid: {e}");
            println!("\n  1 blocking issue found.");
            return Ok(());
        }
    };

    match SurveyStore::from_path(&config.data.survey_csv) {
        Ok(store) => println!("  [ok] Survey table: {} rows", store.len()),
        Err(e) => {
            println!("  [!!] Survey table: {e}");
            issues += 1;
        }
    }

    let router = surveyor_providers::build_from_config(&config);
    println!("  [ok] Providers: {}", provider_summary(&router));

    match router.default() {
        Some(embedder) => match index_documents(&config, embedder).await {
            Ok(0) => {
                println!("  [!!] Survey index is empty: {}", config.data.index_path.display());
                issues += 1;
            }
            Ok(n) => println!("  [ok] Survey index: {n} documents"),
            Err(e) => {
                println!("  [!!] Survey index: {e}");
                issues += 1;
            }
        },
        None => {
            println!("  [!!] No default provider configured");
            issues += 1;
        }
    }

    if config.has_api_key() {
        println!("  [ok] API key configured");
        match router.default() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  [ok] Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  [!!] Provider '{}' answered but is unhealthy", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  [!!] Provider '{}': {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  [!!] No default provider configured");
                issues += 1;
            }
        }
    } else {
        println!("  [!!] No API key configured, add api_key to config.toml");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Registered provider names, default first.
fn provider_summary(router: &ProviderRouter) -> String {
    let default = router.default_name();
    let mut names = vec![format!("{default} (default)")];
    names.extend(
        router
            .list()
            .into_iter()
            .filter(|name| *name != default)
            .map(str::to_string),
    );
    names.join(", ")
}

async fn index_documents(
    config: &AppConfig,
    embedder: Arc<dyn Provider>,
) -> Result<usize, SearchError> {
    let index = EmbeddedIndex::load(
        &config.data.index_path,
        embedder,
        &config.data.embedding_model,
    )?;
    index.count().await
}
