//! Scheduling loop driving the fetch-classify-render pipeline.
//!
//! Timer ticks and stdin commands are turned into [`RefreshRequested`]
//! events and handled one at a time by a single loop that owns the
//! [`Dashboard`]. Ctrl-C or `q` stop it; a closed stdin leaves the timer
//! running.

use std::{future::Future, pin::pin, time::Duration};

use anyhow::Result;
use chrono::Utc;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, OutputFormat},
    dashboard::Dashboard,
    fetch::FeedClient,
    solar::SITE,
    time_range::TimeRange,
};

// ---

/// Why a refresh cycle was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshRequested {
    Timer,
    Manual,
    RangeSelected(TimeRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Refresh(RefreshRequested),
    Quit,
}

/// Parse one line of user input.
pub fn parse_command(line: &str) -> Option<Command> {
    // ---
    match line.trim() {
        "" => None,
        "r" | "refresh" => Some(Command::Refresh(RefreshRequested::Manual)),
        "q" | "quit" | "exit" => Some(Command::Quit),
        other => other
            .parse::<TimeRange>()
            .ok()
            .map(|r| Command::Refresh(RefreshRequested::RangeSelected(r))),
    }
}

/// Run one complete refresh cycle against the dashboard.
pub async fn refresh(client: &FeedClient, dashboard: &mut Dashboard, request: RefreshRequested) {
    // ---
    debug!(?request, "Refresh requested");
    if let RefreshRequested::RangeSelected(range) = request {
        dashboard.set_range(range);
    }

    dashboard.begin_refresh();
    match client.fetch(dashboard.range()).await {
        Ok(samples) => dashboard.apply_samples(&samples),
        Err(e) => {
            error!("Error loading data: {}", e);
            dashboard.apply_error(&e.to_string());
        }
    }
}

/// Run the dashboard until the user quits.
pub async fn run(config: Config) -> Result<()> {
    // ---
    let client = FeedClient::new(&config);
    let mut dashboard = Dashboard::new(config.default_range, SITE);

    let (tx, rx) = mpsc::channel::<Command>(16);
    tokio::spawn(read_commands(tx));

    info!(
        "Polling channel {} every {}s",
        config.channel_id,
        config.refresh_interval.as_secs()
    );

    drive(
        &client,
        &mut dashboard,
        rx,
        config.refresh_interval,
        config.output,
        tokio::signal::ctrl_c(),
    )
    .await;

    info!("Shutting down");
    Ok(())
}

/// Dispatch timer ticks and commands into refresh cycles until `shutdown`
/// resolves or a quit command arrives.
///
/// `shutdown` is polled as one future for the whole run, so a signal that
/// arrives while a refresh is in flight ends the loop right after it.
pub async fn drive<F: Future>(
    client: &FeedClient,
    dashboard: &mut Dashboard,
    mut commands: mpsc::Receiver<Command>,
    period: Duration,
    output: OutputFormat,
    shutdown: F,
) {
    // ---
    let mut shutdown = pin!(shutdown);
    let mut commands_open = true;

    // The first tick fires immediately and doubles as the startup load.
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let request = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => RefreshRequested::Timer,
            cmd = commands.recv(), if commands_open => match cmd {
                Some(Command::Refresh(request)) => request,
                Some(Command::Quit) => break,
                None => {
                    debug!("Command input closed, continuing on timer only");
                    commands_open = false;
                    continue;
                }
            },
        };

        refresh(client, dashboard, request).await;
        emit(dashboard, output);
    }
}

fn emit(dashboard: &Dashboard, output: OutputFormat) {
    // ---
    let now = Utc::now();
    match output {
        OutputFormat::Text => print!("{}", dashboard.render(now)),
        OutputFormat::Json => match dashboard.to_json(now) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to serialize dashboard: {}", e),
        },
    }
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    // ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_command(&line) {
                Some(cmd) => {
                    if tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => warn!("Unknown command '{}' (r, 24h, 7d, 30d, 1y, q)", line.trim()),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read command input: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_parse_commands() {
        // ---
        assert_eq!(
            parse_command(" r "),
            Some(Command::Refresh(RefreshRequested::Manual))
        );
        assert_eq!(
            parse_command("30d"),
            Some(Command::Refresh(RefreshRequested::RangeSelected(
                TimeRange::Month
            )))
        );
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("bogus"), None);
    }
}
