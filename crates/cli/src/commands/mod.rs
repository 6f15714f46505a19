pub mod analyze;
pub mod ask;
pub mod chat;
pub mod compare;
pub mod doctor;
pub mod onboard;

use std::sync::Arc;

use surveyor_agent::Orchestrator;
use surveyor_config::AppConfig;
use surveyor_tools::ToolCatalog;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn load_config() -> CliResult<AppConfig> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// Wire provider, tools and orchestrator from configuration.
pub fn build_orchestrator(config: &AppConfig) -> CliResult<Orchestrator> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    SURVEYOR_API_KEY=sk-...     (generic)");
        eprintln!("    OPENAI_API_KEY=sk-...       (OpenAI direct)");
        eprintln!("    OPENROUTER_API_KEY=sk-or-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = surveyor_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    let catalog = Arc::new(ToolCatalog::from_config(config, provider.clone()));

    Ok(Orchestrator::from_config(config, provider, catalog))
}
