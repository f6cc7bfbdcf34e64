//! Operator commands for inter-thread communication.
//!
//! Commands are parsed by the operator thread from single keys and sent to
//! the coverage thread over a crossbeam channel.

use crossbeam_channel::{Receiver, Sender};

/// Keyboard commands understood by the coverage thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Turn the drive motors on or off (`p`).
    TogglePower,
    /// Turn sensed-obstacle reporting on or off (`l`).
    ToggleLogging,
    /// Log pose, obstacles and planner progress (`i`).
    Info,
    /// Start covering (`r`).
    Run,
    /// Stop the robot and shut down (`q`).
    Quit,
}

impl OperatorCommand {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'p' => Some(Self::TogglePower),
            'l' => Some(Self::ToggleLogging),
            'i' => Some(Self::Info),
            'r' => Some(Self::Run),
            'q' => Some(Self::Quit),
            _ => None,
        }
    }

    /// Parse one input line: its first non-blank character is the key.
    pub fn parse_line(line: &str) -> Option<Self> {
        line.trim().chars().next().and_then(Self::from_key)
    }
}

/// Sender end of command channel (held by the operator thread).
pub type CommandSender = Sender<OperatorCommand>;

/// Receiver end of command channel (held by the coverage thread).
pub type CommandReceiver = Receiver<OperatorCommand>;

/// Create a new command channel pair.
pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    crossbeam_channel::unbounded()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(OperatorCommand::from_key('p'), Some(OperatorCommand::TogglePower));
        assert_eq!(OperatorCommand::from_key('L'), Some(OperatorCommand::ToggleLogging));
        assert_eq!(OperatorCommand::from_key('i'), Some(OperatorCommand::Info));
        assert_eq!(OperatorCommand::from_key('r'), Some(OperatorCommand::Run));
        assert_eq!(OperatorCommand::from_key('q'), Some(OperatorCommand::Quit));
        assert_eq!(OperatorCommand::from_key('x'), None);
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(OperatorCommand::parse_line("  r\n"), Some(OperatorCommand::Run));
        assert_eq!(OperatorCommand::parse_line(""), None);
        assert_eq!(OperatorCommand::parse_line("quit"), Some(OperatorCommand::Quit));
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (tx, rx) = create_command_channel();
        tx.send(OperatorCommand::Run).unwrap();
        tx.send(OperatorCommand::Quit).unwrap();
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received, vec![OperatorCommand::Run, OperatorCommand::Quit]);
    }
}
