use std::time::Duration;

use barrage_room::{SubscriptionKind, DEFAULT_GROUP_ID, DEFAULT_SERVER_ADDR};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a live room and print its barrage messages.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Live room id.
    pub room_id: String,
    /// Barrage server address.
    #[arg(long, env = "BARRAGE_SERVER", default_value = DEFAULT_SERVER_ADDR)]
    pub server: String,
    /// Heartbeat interval (e.g. 30s, 500ms).
    #[arg(long, env = "BARRAGE_HEARTBEAT", default_value = "30s")]
    pub heartbeat: String,
    /// Give up dialing the server after this long (e.g. 10s).
    #[arg(long, value_name = "DURATION")]
    pub connect_timeout: Option<String>,
    /// Barrage group to join after login.
    #[arg(long, default_value = DEFAULT_GROUP_ID, allow_hyphen_values = true)]
    pub group: String,
    /// Streams to print (comma-separated).
    #[arg(long = "stream", value_enum, value_delimiter = ',', default_value = "chat,join")]
    pub streams: Vec<StreamArg>,
    /// Queue capacity per stream.
    #[arg(long, default_value = "64")]
    pub buffer: usize,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StreamArg {
    Chat,
    Join,
    All,
}

impl From<StreamArg> for SubscriptionKind {
    fn from(stream: StreamArg) -> Self {
        match stream {
            StreamArg::Chat => SubscriptionKind::Chat,
            StreamArg::Join => SubscriptionKind::Join,
            StreamArg::All => SubscriptionKind::All,
        }
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration(" 30 ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        for bad in ["", "0s", "0ms", "bad", "-1s", "1m"] {
            let err = parse_duration(bad).unwrap_err();
            assert_eq!(err.code, USAGE, "{bad:?}");
        }
    }

    #[test]
    fn stream_args_map_to_subscription_kinds() {
        assert_eq!(SubscriptionKind::from(StreamArg::Chat), SubscriptionKind::Chat);
        assert_eq!(SubscriptionKind::from(StreamArg::All), SubscriptionKind::All);
    }
}
