use std::sync::Arc;

use barrage_room::{Message, Room, RoomConfig, SubscriptionKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cmd::{parse_duration, WatchArgs};
use crate::exit::{io_error, room_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let config = room_config(&args)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start runtime", err))?;
    runtime.block_on(watch(args, config, format))
}

fn room_config(args: &WatchArgs) -> CliResult<RoomConfig> {
    if args.room_id.trim().is_empty() {
        return Err(CliError::new(USAGE, "room id must not be empty"));
    }
    let mut config = RoomConfig::default()
        .with_server_addr(args.server.clone())
        .with_heartbeat_interval(parse_duration(&args.heartbeat)?)
        .with_group_id(args.group.clone());
    if let Some(timeout) = &args.connect_timeout {
        config = config.with_connect_timeout(parse_duration(timeout)?);
    }
    Ok(config)
}

/// Requested streams in order, without repeats.
fn selected_streams(args: &WatchArgs) -> Vec<SubscriptionKind> {
    let mut kinds: Vec<SubscriptionKind> = Vec::new();
    for kind in args.streams.iter().copied().map(SubscriptionKind::from) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

async fn watch(args: WatchArgs, config: RoomConfig, format: OutputFormat) -> CliResult<i32> {
    let room = Arc::new(Room::with_config(args.room_id.clone(), config));

    // Each stream is forwarded into one queue so output keeps arrival order.
    let (tx, mut rx) = mpsc::channel::<(SubscriptionKind, Message)>(args.buffer.max(1));
    for kind in selected_streams(&args) {
        let mut stream = room.subscribe(kind, args.buffer);
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(message) = stream.recv().await {
                if tx.send((kind, message)).await.is_err() {
                    break;
                }
            }
            debug!(stream = %kind, "stream closed");
        });
    }
    drop(tx);

    let session = {
        let room = Arc::clone(&room);
        tokio::spawn(async move { room.run().await })
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut printed = 0usize;
    let mut output_error = None;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!(room_id = %room.room_id(), "interrupted");
                room.terminate();
                break;
            }
            next = rx.recv() => match next {
                Some((kind, message)) => {
                    if let Err(err) = print_message(&message, kind, room.room_id(), format) {
                        warn!(room_id = %room.room_id(), error = %err, "stdout closed; stopping");
                        room.terminate();
                        output_error = Some(err);
                        break;
                    }
                    printed += 1;
                    if args.count.is_some_and(|count| printed >= count) {
                        info!(room_id = %room.room_id(), printed, "message count reached");
                        room.terminate();
                        break;
                    }
                }
                // Every stream closed, so the session has ended.
                None => break,
            },
        }
    }

    session
        .await
        .map_err(|err| CliError::new(INTERNAL, format!("session task failed: {err}")))?
        .map_err(|err| room_error("session failed", err))?;
    match output_error {
        Some(err) => Err(io_error("failed to write output", err)),
        None => Ok(SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cmd::StreamArg;

    fn args(streams: Vec<StreamArg>) -> WatchArgs {
        WatchArgs {
            room_id: "288016".to_string(),
            server: "127.0.0.1:8601".to_string(),
            heartbeat: "45s".to_string(),
            connect_timeout: Some("500ms".to_string()),
            group: "-9999".to_string(),
            streams,
            buffer: 8,
            count: None,
        }
    }

    #[test]
    fn room_config_applies_flags() {
        let config = room_config(&args(vec![StreamArg::Chat])).unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:8601");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(45));
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.group_id, "-9999");
    }

    #[test]
    fn room_config_rejects_bad_input() {
        let mut bad = args(vec![StreamArg::Chat]);
        bad.heartbeat = "0s".to_string();
        assert_eq!(room_config(&bad).unwrap_err().code, USAGE);

        let mut blank = args(vec![StreamArg::Chat]);
        blank.room_id = "  ".to_string();
        assert_eq!(room_config(&blank).unwrap_err().code, USAGE);
    }

    #[test]
    fn selected_streams_drops_repeats() {
        let streams = selected_streams(&args(vec![
            StreamArg::Join,
            StreamArg::Chat,
            StreamArg::Join,
        ]));
        assert_eq!(streams, vec![SubscriptionKind::Join, SubscriptionKind::Chat]);
    }
}
