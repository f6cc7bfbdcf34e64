//! Operator thread: keyboard commands from stdin.

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use crate::commands::{CommandSender, OperatorCommand};
use crate::error::Result;

/// Forward commands read from `input` until it ends, `q` is read or the
/// receiver goes away. Returns the number of commands sent.
pub fn forward_commands<R: BufRead>(input: R, commands: &CommandSender) -> usize {
    let mut sent = 0;
    for line in input.lines() {
        let Ok(line) = line else { break };
        let Some(command) = OperatorCommand::parse_line(&line) else {
            if !line.trim().is_empty() {
                tracing::warn!("Unknown command {:?} (keys: p, l, i, r, q)", line.trim());
            }
            continue;
        };
        if commands.send(command).is_err() {
            break;
        }
        sent += 1;
        if command == OperatorCommand::Quit {
            break;
        }
    }
    sent
}

/// Spawn the stdin reader.
///
/// Blocking reads cannot be interrupted, so the handle is not meant to be
/// joined.
pub fn spawn_operator(commands: CommandSender) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("operator".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            forward_commands(stdin.lock(), &commands);
        })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create_command_channel;
    use std::io::Cursor;

    #[test]
    fn test_forwards_until_quit() {
        let (tx, rx) = create_command_channel();
        let input = Cursor::new("r\n\nbogus\ni\nq\np\n");
        assert_eq!(forward_commands(input, &tx), 3);
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                OperatorCommand::Run,
                OperatorCommand::Info,
                OperatorCommand::Quit
            ]
        );
    }

    #[test]
    fn test_stops_when_receiver_is_gone() {
        let (tx, rx) = create_command_channel();
        drop(rx);
        assert_eq!(forward_commands(Cursor::new("r\ni\n"), &tx), 0);
    }
}
