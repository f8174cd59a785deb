use std::io::{self, IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use barrage_frame::stt;
use barrage_room::{Message, SubscriptionKind};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    stream: &'static str,
    room_id: &'a str,
    #[serde(rename = "type")]
    msg_type: &'a str,
    fields: &'a Message,
    timestamp: String,
}

/// Print one message to stdout. Fails once stdout is gone (for example a
/// closed pipe), which the caller treats as a reason to stop watching.
pub fn print_message(
    message: &Message,
    stream: SubscriptionKind,
    room_id: &str,
    format: OutputFormat,
) -> io::Result<()> {
    let mut out = std::io::stdout().lock();
    write_message(&mut out, message, stream, room_id, format)?;
    out.flush()
}

fn write_message<W: Write>(
    out: &mut W,
    message: &Message,
    stream: SubscriptionKind,
    room_id: &str,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let record = MessageOutput {
                stream: stream.name(),
                room_id,
                msg_type: message.type_name(),
                fields: message,
                timestamp: now_unix_seconds(),
            };
            serde_json::to_writer(&mut *out, &record)?;
            writeln!(out)
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STREAM", "TYPE", "USER", "LEVEL", "TEXT"])
                .add_row(vec![
                    stream.name().to_string(),
                    message.type_name().to_string(),
                    message.get("nn").unwrap_or("-").to_string(),
                    message.get("level").unwrap_or("-").to_string(),
                    message.get("txt").unwrap_or("").to_string(),
                ]);
            writeln!(out, "{table}")
        }
        OutputFormat::Pretty => writeln!(out, "{}", render_pretty(message, stream)),
        OutputFormat::Raw => {
            let body = stt::encode(&message.to_fields());
            let end = body.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
            out.write_all(&body[..end])?;
            out.write_all(b"\n")
        }
    }
}

fn render_pretty(message: &Message, stream: SubscriptionKind) -> String {
    let user = message.get("nn").unwrap_or("?");
    let level = message.get("level").unwrap_or("0");
    match message {
        Message::Chat(_) => format!(
            "[{stream}] lv{level} {user}: {}",
            message.get("txt").unwrap_or("")
        ),
        Message::UserEnter(_) => format!("[{stream}] lv{level} {user} entered the room"),
        other => {
            let mut line = format!("[{stream}] {}", other.type_name());
            if let Some(fields) = other.fields() {
                for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != stt::TYPE_KEY) {
                    line.push_str(&format!(" {key}={value}"));
                }
            }
            line
        }
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use barrage_frame::Fields;

    use super::*;

    fn message(pairs: &[(&str, &str)]) -> Message {
        let fields: Fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Message::from_fields(fields)
    }

    #[test]
    fn pretty_chat_line() {
        let chat = message(&[("type", "chatmsg"), ("nn", "alice"), ("level", "7"), ("txt", "hi")]);
        assert_eq!(render_pretty(&chat, SubscriptionKind::Chat), "[chat] lv7 alice: hi");
    }

    #[test]
    fn pretty_join_line() {
        let join = message(&[("type", "uenter"), ("nn", "bob"), ("level", "12")]);
        assert_eq!(
            render_pretty(&join, SubscriptionKind::Join),
            "[join] lv12 bob entered the room"
        );
    }

    #[test]
    fn pretty_other_lists_fields_without_type() {
        let gift = message(&[("type", "dgb"), ("gfid", "824"), ("hits", "3")]);
        assert_eq!(
            render_pretty(&gift, SubscriptionKind::All),
            "[all] dgb gfid=824 hits=3"
        );
    }

    #[test]
    fn json_output_carries_stream_and_fields() {
        let chat = message(&[("type", "chatmsg"), ("txt", "a/b")]);
        let out = MessageOutput {
            stream: SubscriptionKind::Chat.name(),
            room_id: "288016",
            msg_type: chat.type_name(),
            fields: &chat,
            timestamp: "0".to_string(),
        };
        let value: serde_json::Value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["stream"], "chat");
        assert_eq!(value["type"], "chatmsg");
        assert_eq!(value["fields"]["txt"], "a/b");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_are_reported_in_every_format() {
        let chat = message(&[("type", "chatmsg"), ("txt", "hi")]);
        for format in [
            OutputFormat::Json,
            OutputFormat::Table,
            OutputFormat::Pretty,
            OutputFormat::Raw,
        ] {
            let err = write_message(&mut ClosedPipe, &chat, SubscriptionKind::Chat, "1", format)
                .expect_err("closed output should fail");
            assert_eq!(err.kind(), io::ErrorKind::BrokenPipe, "{format:?}");
        }
    }

    #[test]
    fn raw_line_is_stt_text_without_terminator() {
        let chat = message(&[("type", "chatmsg"), ("txt", "a/b")]);
        let mut out = Vec::new();
        write_message(&mut out, &chat, SubscriptionKind::Chat, "1", OutputFormat::Raw).unwrap();
        assert_eq!(out, b"type@=chatmsg/txt@=a@Sb/\n");
    }
}
