use anyhow::Result;
use kek_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    println!(
        "File exists: {}\n",
        if path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  database_path: {}", config.database_path.display());
    println!("  repository_path: {}", config.repository_path.display());
    println!("  data_subdir: {}", config.data_subdir.display());
    println!("  identity_policy: {:?}", config.identity_policy);
    println!("  progress_interval: {}", config.progress_interval);

    println!("\nPriority: CLI args > ENV vars (KEK_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure kek-archive.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
