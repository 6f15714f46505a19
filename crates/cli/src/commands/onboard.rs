//! `surveyor onboard` is the first-time setup.

use surveyor_config::AppConfig;

use super::CliResult;

pub async fn run() -> CliResult {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let data_dir = AppConfig::data_dir();

    println!("Surveyor: First-Time Setup");
    println!("==========================\n");

    for dir in [&config_dir, &data_dir] {
        if dir.exists() {
            println!("  Directory exists: {}", dir.display());
        } else {
            tokio::fs::create_dir_all(dir).await?;
            println!("  Created {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
    } else {
        tokio::fs::write(&config_path, AppConfig::default_toml()).await?;
        println!("  Created config.toml at: {}", config_path.display());
        println!("\n  Next steps:");
        println!("   1. Add your API key to {}", config_path.display());
        println!(
            "   2. Place the survey table at {}",
            data_dir.join("survey_questions.csv").display()
        );
        println!(
            "   3. Place the prebuilt index at {}",
            data_dir.join("survey_index.jsonl").display()
        );
        println!("   4. Run: surveyor chat\n");
    }

    println!("Setup complete. Run `surveyor doctor` to check everything.\n");
    Ok(())
}
