use crate::core::settings::{config_dir, SETTINGS_FILE};
use crate::core::Settings;
use crate::ui;
use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let path = config_dir()?.join(SETTINGS_FILE);
    let mut settings = Settings::load_from(&path);

    match matches.subcommand() {
        Some(("show", _)) => {
            println!("{}", format!("Settings file: {}", path.display()).dimmed());
            println!("defaultStart: {}", settings.default_start.to_string().cyan());
        }
        Some(("default-start", sub_matches)) => {
            let enabled = *sub_matches
                .get_one::<bool>("enabled")
                .context("Value argument is required")?;
            settings.default_start = enabled;
            settings
                .save_to(&path)
                .with_context(|| format!("Failed to write settings file: {:?}", path))?;
            ui::success(&format!("defaultStart set to {}", enabled));
        }
        _ => {
            println!("Use 'osc-watch settings --help' for more information.");
        }
    }

    Ok(())
}
