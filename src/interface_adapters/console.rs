// Line-oriented input device: one event per stdin line.
//
//   down ArrowLeft | up ArrowLeft | pointer 120 340 | blur | start

use crate::use_cases::{InputEvent, Key};
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    UnknownCommand(String),
    UnknownKey(String),
    InvalidPointer,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::UnknownCommand(cmd) => write!(f, "unknown command `{cmd}`"),
            ConsoleError::UnknownKey(key) => write!(f, "unknown key `{key}`"),
            ConsoleError::InvalidPointer => f.write_str("pointer needs two numeric coordinates"),
        }
    }
}

/// Parses one line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_input_line(line: &str) -> Result<Option<InputEvent>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let key = |name: &str| {
        Key::from_dom(name).ok_or_else(|| ConsoleError::UnknownKey(name.to_string()))
    };

    let event = match command {
        "down" => InputEvent::KeyDown(key(rest)?),
        "up" => InputEvent::KeyUp(key(rest)?),
        "pointer" => {
            let mut coords = rest.split_whitespace().map(str::parse::<f32>);
            match (coords.next(), coords.next(), coords.next()) {
                (Some(Ok(x)), Some(Ok(y)), None) if x.is_finite() && y.is_finite() => {
                    InputEvent::PointerMove { x, y }
                }
                _ => return Err(ConsoleError::InvalidPointer),
            }
        }
        "blur" => InputEvent::FocusLost,
        "start" => InputEvent::StartPressed,
        other => return Err(ConsoleError::UnknownCommand(other.to_string())),
    };
    Ok(Some(event))
}

/// Reads events from `reader` until EOF or until the receiver is gone.
pub async fn read_input_events<R>(reader: R, input_tx: mpsc::Sender<InputEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("input stream ended");
                break;
            }
            Err(e) => {
                warn!(error = %e, "failed to read input line");
                break;
            }
        };

        match parse_input_line(&line) {
            Ok(Some(event)) => {
                if input_tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring input line"),
        }
    }
}
