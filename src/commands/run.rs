//! Interactive console for a transmission session.
//!
//! Plays the part of the main window: endpoint fields, Start/Stop, the chat
//! toggle, chat text and the preset list. Input is read on a separate thread
//! and handed to the loop below, which is the only place that touches the
//! controller.

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::core::scheduler::{DEFAULT_HOST, DEFAULT_INTERVAL_SECS, DEFAULT_PORT};
use crate::core::settings::{self, CHAT_PRESETS_FILE, SETTINGS_FILE};
use crate::commands::presets::preset_index;
use crate::core::{ChatPresets, SchedulerConfig, Settings, WatchController};
use crate::error::WatchError;
use crate::platform::detect_gpu_provider;
use crate::platform::gpu::DRIVER_REMEDIATION;
use crate::ui;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    Status,
    Help,
    Quit,
    Gpu,
    SetHost(String),
    SetPort(String),
    SetInterval(String),
    SetSyncInterval(String),
    ChatOn,
    ChatOff,
    ChatClear,
    ChatText(String),
    PresetList,
    PresetUse(usize),
    PresetSave,
    PresetDelete(usize),
    PresetUp(usize),
    PresetDown(usize),
    DefaultStart(bool),
    Empty,
    Unknown(String),
}

/// Parse one line. Preset numbers are 1-based on input and 0-based here.
pub fn parse_command(line: &str) -> ConsoleCommand {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match (head.to_ascii_lowercase().as_str(), rest) {
        ("", _) => ConsoleCommand::Empty,
        ("start", "") => ConsoleCommand::Start,
        ("stop", "") => ConsoleCommand::Stop,
        ("status", "") => ConsoleCommand::Status,
        ("help", "") | ("?", "") => ConsoleCommand::Help,
        ("quit", "") | ("exit", "") => ConsoleCommand::Quit,
        ("gpu", "") => ConsoleCommand::Gpu,
        ("set", rest) => {
            parse_set(rest).unwrap_or_else(|| ConsoleCommand::Unknown(line.to_string()))
        }
        ("chat", rest) => {
            parse_chat(rest).unwrap_or_else(|| ConsoleCommand::Unknown(line.to_string()))
        }
        ("preset", rest) => {
            parse_preset(rest).unwrap_or_else(|| ConsoleCommand::Unknown(line.to_string()))
        }
        ("default-start", "on") => ConsoleCommand::DefaultStart(true),
        ("default-start", "off") => ConsoleCommand::DefaultStart(false),
        _ => ConsoleCommand::Unknown(line.to_string()),
    }
}

/// `on`, `off` and `clear` are keywords in any case. `say <text>` sets text
/// verbatim, so a message can be one of the keywords.
fn parse_chat(rest: &str) -> Option<ConsoleCommand> {
    if rest.is_empty() {
        return None;
    }
    if rest.eq_ignore_ascii_case("on") {
        return Some(ConsoleCommand::ChatOn);
    }
    if rest.eq_ignore_ascii_case("off") {
        return Some(ConsoleCommand::ChatOff);
    }
    if rest.eq_ignore_ascii_case("clear") {
        return Some(ConsoleCommand::ChatClear);
    }

    let text = match rest.split_once(char::is_whitespace) {
        Some((word, text)) if word.eq_ignore_ascii_case("say") => text.trim(),
        _ => rest,
    };
    Some(ConsoleCommand::ChatText(text.to_string()))
}

fn parse_set(rest: &str) -> Option<ConsoleCommand> {
    let (field, value) = rest.split_once(char::is_whitespace)?;
    let value = value.trim().to_string();
    match field {
        "host" => Some(ConsoleCommand::SetHost(value)),
        "port" => Some(ConsoleCommand::SetPort(value)),
        "interval" => Some(ConsoleCommand::SetInterval(value)),
        "sync" => Some(ConsoleCommand::SetSyncInterval(value)),
        _ => None,
    }
}

fn parse_preset(rest: &str) -> Option<ConsoleCommand> {
    let mut parts = rest.split_whitespace();
    let action = parts.next().unwrap_or("list");
    let index = parts
        .next()
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(preset_index);

    match (action, index) {
        ("list", None) => Some(ConsoleCommand::PresetList),
        ("save", None) => Some(ConsoleCommand::PresetSave),
        ("use", Some(i)) => Some(ConsoleCommand::PresetUse(i)),
        ("delete", Some(i)) => Some(ConsoleCommand::PresetDelete(i)),
        ("up", Some(i)) => Some(ConsoleCommand::PresetUp(i)),
        ("down", Some(i)) => Some(ConsoleCommand::PresetDown(i)),
        _ => None,
    }
}

enum ConsoleInput {
    Line(String),
    Interrupt,
    Closed,
}

/// Raw endpoint fields, validated only when starting
struct EndpointFields {
    host: String,
    port: String,
    interval: String,
    sync_interval: Option<String>,
}

impl EndpointFields {
    fn to_config(&self) -> crate::Result<SchedulerConfig> {
        SchedulerConfig::parse(
            &self.host,
            &self.port,
            &self.interval,
            self.sync_interval.as_deref(),
        )
    }
}

struct Console {
    controller: WatchController,
    fields: EndpointFields,
    settings: Settings,
    settings_path: PathBuf,
    presets: ChatPresets,
}

impl Console {
    fn start(&mut self) {
        let result = self
            .fields
            .to_config()
            .and_then(|config| self.controller.start(config));

        match result {
            Ok(true) => self.print_status(),
            Ok(false) => ui::dimmed("Already running"),
            Err(e) => {
                log::error!("Start error: {}", e);
                ui::error(&format!("Error: {}", e));
            }
        }
    }

    fn print_status(&self) {
        println!(
            "{}",
            ui::format_status(self.controller.status(), self.controller.active_config())
        );
    }

    /// Returns `false` when the console should exit
    fn handle(&mut self, command: ConsoleCommand) -> bool {
        match command {
            ConsoleCommand::Empty => {}
            ConsoleCommand::Quit => return false,
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Start => self.start(),
            ConsoleCommand::Stop => {
                self.controller.stop();
                self.print_status();
            }
            ConsoleCommand::Status => self.print_status(),
            ConsoleCommand::Gpu => println!(
                "GPU: {} [{}]",
                self.controller.gpu_name().blue(),
                self.controller.gpu_vendor()
            ),
            ConsoleCommand::SetHost(host) => self.set_field(|f| f.host = host),
            ConsoleCommand::SetPort(port) => self.set_field(|f| f.port = port),
            ConsoleCommand::SetInterval(interval) => self.set_field(|f| f.interval = interval),
            ConsoleCommand::SetSyncInterval(sync) => {
                self.set_field(|f| f.sync_interval = Some(sync))
            }
            ConsoleCommand::ChatOn => {
                self.controller.set_chat_enabled(true);
                ui::info("Chat sending ON");
            }
            ConsoleCommand::ChatOff => {
                self.controller.set_chat_enabled(false);
                ui::info("Chat sending OFF");
            }
            ConsoleCommand::ChatClear => self.controller.set_chat_text(""),
            ConsoleCommand::ChatText(text) => {
                if !self.require_chat() {
                    return true;
                }
                self.controller.set_chat_text(text);
                self.print_status();
            }
            ConsoleCommand::PresetList => {
                println!("{}", ui::format_preset_list(self.presets.list()))
            }
            ConsoleCommand::PresetUse(index) => self.use_preset(index),
            ConsoleCommand::PresetSave => self.save_preset(),
            ConsoleCommand::PresetDelete(index) => {
                let Some(text) = self.presets.get(index).map(str::to_string) else {
                    ui::warn("No preset with that number");
                    return true;
                };
                let removed = self.presets.remove(&text).map(|_| ());
                self.report(removed, "Preset deleted");
            }
            ConsoleCommand::PresetUp(index) => {
                let moved = self.presets.move_up(index);
                self.report_move(moved);
            }
            ConsoleCommand::PresetDown(index) => {
                let moved = self.presets.move_down(index);
                self.report_move(moved);
            }
            ConsoleCommand::DefaultStart(enabled) => {
                self.settings.default_start = enabled;
                let saved = self.settings.save_to(&self.settings_path);
                self.report(saved, "Setting saved");
            }
            ConsoleCommand::Unknown(line) => {
                ui::warn(&format!("Unknown command '{}'. Type 'help'.", line))
            }
        }
        true
    }

    fn set_field<F: FnOnce(&mut EndpointFields)>(&mut self, update: F) {
        update(&mut self.fields);
        if self.controller.is_running() {
            ui::dimmed("Applies on next start");
        }
    }

    fn require_chat(&self) -> bool {
        if !self.controller.chat_enabled() {
            ui::warn("Chat sending is OFF. Use 'chat on' first.");
        }
        self.controller.chat_enabled()
    }

    fn use_preset(&mut self, index: usize) {
        if !self.require_chat() {
            return;
        }
        match self.presets.get(index).map(str::to_string) {
            Some(text) => {
                self.controller.set_chat_text(text);
                self.print_status();
            }
            None => ui::warn("No preset with that number"),
        }
    }

    fn save_preset(&mut self) {
        if !self.require_chat() {
            return;
        }
        let message = self.controller.chat_text().to_string();
        match self.presets.add(&message) {
            Ok(()) => {
                self.controller.set_chat_text("");
                ui::success("Preset saved");
            }
            Err(WatchError::Preset(msg)) => ui::warn(&msg),
            Err(e) => {
                log::error!("Error saving chat presets: {}", e);
                ui::error(&format!("Error: {}", e));
            }
        }
    }

    fn report_move(&self, moved: crate::Result<bool>) {
        match moved {
            Ok(true) => println!("{}", ui::format_preset_list(self.presets.list())),
            Ok(false) => ui::dimmed("Nothing to move"),
            Err(e) => ui::error(&format!("Error: {}", e)),
        }
    }

    fn report(&self, result: crate::Result<()>, done: &str) {
        match result {
            Ok(()) => ui::success(done),
            Err(e) => {
                log::error!("{}", e);
                ui::error(&format!("Error: {}", e));
            }
        }
    }
}

fn print_help() {
    ui::bold("Commands:");
    let lines = [
        ("start | stop | status", "control transmission"),
        ("set host|port|interval|sync <value>", "endpoint fields, used on next start"),
        ("chat on | chat off", "toggle chat sending"),
        ("chat <text> | chat clear", "set the chat message"),
        ("chat say <text>", "set the message verbatim (e.g. 'on')"),
        ("preset list|save", "show presets / save current message"),
        ("preset use|delete|up|down <n>", "act on preset n"),
        ("default-start on|off", "start automatically on launch"),
        ("gpu", "show the detected GPU"),
        ("quit", "stop and exit"),
    ];
    for (cmd, about) in lines {
        println!("  {:<38} {}", cmd.cyan(), about.dimmed());
    }
}

/// Show a fatal error, wait for the user to acknowledge it, then end the process.
///
/// The acknowledgement is read from the console's own input channel, since
/// the stdin thread already owns the terminal.
fn exit_on_fatal(error: WatchError, input: &Receiver<ConsoleInput>) -> ! {
    let message = match &error {
        WatchError::DriverMissing(reason) => format!("{}\n\n{}", DRIVER_REMEDIATION, reason),
        other => other.to_string(),
    };
    ui::error_banner("Error", &message);
    ui::dimmed("Press Enter to close.");
    wait_for_acknowledgement(input);
    std::process::exit(1);
}

/// Block until any console input arrives: a line, Ctrl+C, or closed input.
fn wait_for_acknowledgement(input: &Receiver<ConsoleInput>) {
    // A disconnected channel means no one can answer
    let _ = input.recv();
}

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let arg = |name: &str| matches.get_one::<String>(name).cloned();

    let fields = EndpointFields {
        host: arg("host").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: arg("port").unwrap_or_else(|| DEFAULT_PORT.to_string()),
        interval: arg("interval").unwrap_or_else(|| DEFAULT_INTERVAL_SECS.to_string()),
        sync_interval: arg("sync-interval"),
    };

    let dir = settings::config_dir()?;
    let settings_path = dir.join(SETTINGS_FILE);
    let settings = Settings::load_from(&settings_path);
    let presets = ChatPresets::load_from(dir.join(CHAT_PRESETS_FILE));

    let mut controller = WatchController::new(detect_gpu_provider());
    if let Some(chat) = arg("chat") {
        controller.set_chat_text(chat);
        controller.set_chat_enabled(true);
    }

    let mut console = Console {
        controller,
        fields,
        settings,
        settings_path,
        presets,
    };

    ui::bold("OSC Watch");
    println!(
        "GPU: {} [{}]",
        console.controller.gpu_name().blue(),
        console.controller.gpu_vendor()
    );
    ui::dimmed("Type 'help' for commands, Ctrl+C to quit.");

    if console.settings.default_start {
        console.start();
    } else {
        console.print_status();
    }

    let (tx, rx) = mpsc::channel::<ConsoleInput>();

    let interrupt_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(ConsoleInput::Interrupt);
    })
    .context("Failed to set Ctrl+C handler")?;

    thread::Builder::new()
        .name("osc-watch-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(ConsoleInput::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = tx.send(ConsoleInput::Closed);
        })
        .context("Failed to spawn input thread")?;

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(ConsoleInput::Line(line)) => {
                if !console.handle(parse_command(&line)) {
                    break;
                }
            }
            Ok(ConsoleInput::Interrupt) => {
                println!();
                ui::dimmed("Stopping...");
                break;
            }
            Ok(ConsoleInput::Closed) => {
                ui::dimmed("Input closed, running until Ctrl+C");
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Some(fatal) = console.controller.poll_fatal() {
            exit_on_fatal(fatal, &rx);
        }
    }

    console.controller.stop();
    Ok(())
}
