use std::net::SocketAddr;

use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use ramadan_core::{
    CalendarEntry, Config, Coordinate, calendar::to_calendar, provider::require_provider_from_config,
    relay,
};

use crate::schedule::{self, NextEvent};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ramadan", version, about = "Ramadan calendar relay")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP relay.
    Serve {
        /// Address to listen on; overrides config and RAMADAN_BIND_ADDR.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Store the provider API key (and optionally the bind address).
    Configure,

    /// Print the fasting calendar for a location.
    Show {
        /// Latitude, passed to the provider as given.
        #[arg(long, allow_hyphen_values = true)]
        lat: String,

        /// Longitude, passed to the provider as given.
        #[arg(long, allow_hyphen_values = true)]
        lon: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => {
                let mut config = Config::load_with_env()?;
                if let Some(addr) = bind {
                    config.bind_addr = addr;
                }
                relay::serve(config).await
            }
            Command::Configure => configure(),
            Command::Show { lat, lon } => show(Coordinate { lat, lon }).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("islamicapi.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let bind = Text::new("Listen address:")
        .with_default(&config.bind_addr.to_string())
        .prompt()
        .context("Failed to read listen address")?;
    config.bind_addr = bind
        .trim()
        .parse()
        .with_context(|| format!("'{bind}' is not a valid socket address"))?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

async fn show(coordinate: Coordinate) -> anyhow::Result<()> {
    let config = Config::load_with_env()?;
    let provider = require_provider_from_config(&config)?;

    let days = provider
        .fasting_days(&coordinate)
        .await
        .with_context(|| format!("Could not fetch Ramadan calendar for {}, {}", coordinate.lat, coordinate.lon))?;

    let entries = to_calendar(days);
    if entries.is_empty() {
        println!("No fasting days returned for {}, {}", coordinate.lat, coordinate.lon);
        return Ok(());
    }

    let now = Local::now().naive_local();
    let today = now.date().format("%Y-%m-%d").to_string();

    println!("Ramadan calendar for {}, {}", coordinate.lat, coordinate.lon);
    println!("{:<18} {:>8} {:>8}", "Date", "Sahur", "Iftar");
    for entry in &entries {
        println!("{}", format_row(entry, entry.date == today));
    }

    println!();
    println!("{}", format_next(schedule::next_event(&entries, now).as_ref(), now));

    Ok(())
}

/// Render one row, adding the weekday when the date is ISO `YYYY-MM-DD`.
fn format_row(entry: &CalendarEntry, is_today: bool) -> String {
    let date = match schedule::parse_date(&entry.date) {
        Some(d) => format!("{} ({})", entry.date, d.format("%a")),
        None => entry.date.clone(),
    };

    let row = format!("{:<18} {:>8} {:>8}", date, entry.sahur, entry.iftar);
    if is_today { format!("{row}  <- Today") } else { row }
}

fn format_next(next: Option<&NextEvent<'_>>, now: NaiveDateTime) -> String {
    match next {
        Some(event) => format!(
            "Next: {} {} (in {})",
            event.kind,
            event.at.format("%Y-%m-%d %H:%M"),
            schedule::format_countdown(event.at - now),
        ),
        None => "Next: none, the calendar has ended".to_string(),
    }
}
