use crate::core::{GpuSample, GpuVendor, SchedulerConfig, StatusSummary};
use colored::Colorize;

/// Status block shown after start/stop and on `status`
pub fn format_status(summary: StatusSummary, config: Option<&SchedulerConfig>) -> String {
    if !summary.running {
        return format!("Status: {}", "Stop".red().bold());
    }

    let mut sending = vec!["clock"];
    if summary.sending_chat {
        sending.push("chat");
    }

    let mut out = format!(
        "Status: {}\nSending: {}",
        "Start".green().bold(),
        sending.join(", ")
    );
    if let Some(config) = config {
        out.push_str(&format!(
            "\nTarget: {}:{} every {}s",
            config.host, config.port, config.interval_secs
        ));
    }
    out
}

pub fn format_sample(vendor: GpuVendor, name: &str, sample: &GpuSample) -> String {
    format!(
        "GPU: {} [{}]\nUsage: {}%  VRAM: {}%",
        name.blue(),
        vendor,
        sample.usage_percent,
        sample.memory_percent
    )
}

/// Numbered list, 1-based as typed by the user
pub fn format_preset_list(presets: &[String]) -> String {
    if presets.is_empty() {
        return "No presets saved".dimmed().to_string();
    }
    presets
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:>3}. {}", i + 1, p))
        .collect::<Vec<_>>()
        .join("\n")
}
