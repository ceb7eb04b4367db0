//! `autochat onboard` — First-time setup.

use std::path::Path;

use autochat_config::AppConfig;

/// Write the default config to `config_path` unless one exists. Returns whether it wrote.
fn write_default_config(config_path: &Path) -> std::io::Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(config_path, AppConfig::default_toml())?;
    Ok(true)
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");

    println!("autochat — First-Time Setup");
    println!("===========================\n");

    if write_default_config(&config_path)? {
        println!("Created config.toml at: {}", config_path.display());
        println!("\nNext steps:");
        println!("  1. Add your API key:");
        println!("     export OPENAI_API_KEY='sk-...'");
        println!("     or set api_key in {}", config_path.display());
        println!("  2. For the agent, add a Todoist token:");
        println!("     export TODOIST_API_KEY='...'");
        println!("  3. Try it:");
        println!("     autochat chat -m 'Hello!'");
        println!("     autochat agent --dry-run 'Sort my inbox into projects'");
    } else {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or delete and re-run onboard.");
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_parseable_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(write_default_config(&path).unwrap());
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");

        std::fs::write(&path, "default_model = \"mine\"\n").unwrap();
        assert!(!write_default_config(&path).unwrap());
        assert_eq!(AppConfig::load_from(&path).unwrap().default_model, "mine");
    }
}
