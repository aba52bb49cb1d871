use anyhow::Result;
use clap::{Arg, Command};

use osc_watch::commands;

fn main() -> Result<()> {
    let matches = Command::new("osc-watch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Send the clock and GPU usage to a VRChat avatar over OSC")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Open the interactive console and send parameters")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("OSC receiver address (default 127.0.0.1)"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("OSC receiver port (default 9000)"),
                )
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Seconds between ticks (default 5)"),
                )
                .arg(
                    Arg::new("sync-interval")
                        .long("sync-interval")
                        .value_name("SECONDS")
                        .help("Resend unchanged values at least this often (default: every tick)"),
                )
                .arg(
                    Arg::new("chat")
                        .long("chat")
                        .value_name("TEXT")
                        .help("Enable chat sending with this message"),
                ),
        )
        .subcommand(
            Command::new("presets")
                .about("Manage saved chat messages")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("list").about("List saved chat messages"))
                .subcommand(
                    Command::new("add")
                        .about("Save a chat message")
                        .arg(Arg::new("text").required(true).index(1)),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Delete a chat message")
                        .arg(Arg::new("text").required(true).index(1))
                        .arg(
                            Arg::new("yes")
                                .short('y')
                                .long("yes")
                                .help("Skip confirmation")
                                .action(clap::ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("up").about("Move preset N up").arg(
                        Arg::new("number")
                            .required(true)
                            .index(1)
                            .value_parser(clap::value_parser!(usize)),
                    ),
                )
                .subcommand(
                    Command::new("down").about("Move preset N down").arg(
                        Arg::new("number")
                            .required(true)
                            .index(1)
                            .value_parser(clap::value_parser!(usize)),
                    ),
                ),
        )
        .subcommand(
            Command::new("settings")
                .about("Show or change persisted settings")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print current settings"))
                .subcommand(
                    Command::new("default-start")
                        .about("Start sending automatically when the console opens")
                        .arg(
                            Arg::new("enabled")
                                .required(true)
                                .index(1)
                                .value_parser(clap::value_parser!(bool)),
                        ),
                ),
        )
        .subcommand(Command::new("gpu").about("Detect the GPU and print one sample"))
        .subcommand(
            Command::new("listen")
                .about("Print OSC messages received on a port")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .value_parser(clap::value_parser!(u16))
                        .default_value("9000"),
                )
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .value_name("ADDR")
                        .default_value("127.0.0.1"),
                )
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("N")
                        .help("Exit after N messages")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
        .get_matches();

    osc_watch::init_logging();

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run(sub_matches)?,
        Some(("presets", sub_matches)) => commands::presets::execute(sub_matches)?,
        Some(("settings", sub_matches)) => commands::settings::execute(sub_matches)?,
        Some(("gpu", _)) => commands::gpu()?,
        Some(("listen", sub_matches)) => commands::listen(sub_matches)?,
        Some(("version", _)) => commands::version()?,
        _ => {
            println!("Use 'osc-watch --help' for more information.");
        }
    }

    Ok(())
}
