use anyhow::{Context, Result};
use taskfarm_config::{ConfigLoader, FarmConfig};

use crate::cli::ConfigCommands;

pub fn execute(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Sample => {
            print!("{}", FarmConfig::generate_sample());
            Ok(())
        }
        ConfigCommands::Validate { path } => {
            let config = ConfigLoader::new()
                .from_file(&path)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
            println!(
                "Configuration is valid: {} workers, {} result order",
                config.worker.count, config.master.ordering
            );
            Ok(())
        }
    }
}
