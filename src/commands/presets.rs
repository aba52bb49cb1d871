use crate::core::settings::{config_dir, CHAT_PRESETS_FILE};
use crate::core::ChatPresets;
use crate::error::WatchError;
use crate::ui;
use anyhow::{Context, Result};
use clap::ArgMatches;

/// Presets are numbered from 1 for the user. `None` for 0.
pub fn preset_index(number: usize) -> Option<usize> {
    number.checked_sub(1)
}

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut presets = ChatPresets::load_from(config_dir()?.join(CHAT_PRESETS_FILE));

    match matches.subcommand() {
        Some(("list", _)) => {
            println!("{}", ui::format_preset_list(presets.list()));
        }
        Some(("add", sub_matches)) => {
            let text = sub_matches
                .get_one::<String>("text")
                .context("Text argument is required")?;
            match presets.add(text) {
                Ok(()) => ui::success("Preset saved"),
                Err(WatchError::Preset(msg)) => ui::warn(&msg),
                Err(e) => return Err(e.into()),
            }
        }
        Some(("remove", sub_matches)) => {
            let text = sub_matches
                .get_one::<String>("text")
                .context("Text argument is required")?;
            if !presets.list().iter().any(|p| p == text) {
                ui::warn(&format!("No preset named '{}'", text));
                return Ok(());
            }
            if !sub_matches.get_flag("yes")
                && !ui::confirm(&format!("Delete preset '{}'?", text))?
            {
                ui::dimmed("Cancelled");
                return Ok(());
            }
            if presets.remove(text)? {
                ui::success("Preset removed");
            } else {
                ui::warn(&format!("No preset named '{}'", text));
            }
        }
        Some((direction @ ("up" | "down"), sub_matches)) => {
            let number = *sub_matches
                .get_one::<usize>("number")
                .context("Number argument is required")?;
            let Some(index) = preset_index(number) else {
                ui::warn("Preset numbers start at 1");
                return Ok(());
            };
            let moved = if direction == "up" {
                presets.move_up(index)?
            } else {
                presets.move_down(index)?
            };
            if !moved {
                ui::dimmed("Nothing to move");
            }
            println!("{}", ui::format_preset_list(presets.list()));
        }
        _ => {
            println!("Use 'osc-watch presets --help' for more information.");
        }
    }

    Ok(())
}
