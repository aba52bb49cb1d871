//! Diagnostics receiver: print every OSC message arriving on a port.

use anyhow::{Context, Result};
use chrono::Local;
use clap::ArgMatches;
use colored::Colorize;
use std::net::UdpSocket;

use crate::core::scheduler::DEFAULT_PORT;
use crate::osc::OscMessage;

/// Largest datagram we expect; chat messages are capped well below this
const MAX_DATAGRAM: usize = 8192;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .unwrap_or(DEFAULT_PORT);
    let bind = matches
        .get_one::<String>("bind")
        .map(String::as_str)
        .unwrap_or("127.0.0.1");
    let limit = matches.get_one::<usize>("count").copied();

    let socket = UdpSocket::bind((bind, port))
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;

    println!(
        "{}",
        format!("Listening for OSC on {}", socket.local_addr()?).cyan()
    );

    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut received = 0usize;

    while limit.map_or(true, |limit| received < limit) {
        let (len, from) = socket.recv_from(&mut buf)?;
        received += 1;

        let stamp = Local::now().format("%H:%M:%S");
        match OscMessage::decode(&buf[..len]) {
            Ok(msg) => println!("{} {} {}", stamp.to_string().dimmed(), from, msg),
            Err(e) => println!(
                "{} {} {}",
                stamp.to_string().dimmed(),
                from,
                e.to_string().red()
            ),
        }
    }

    Ok(())
}
