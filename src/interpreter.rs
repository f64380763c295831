//! Boundary to the command interpreter.
//!
//! The interpreter owns the command language. The gateway hands it one
//! [`NormalizedCommand`] at a time together with a [`ResponseSink`] and
//! forwards whatever it writes to the client that sent the command.

use crate::domain::NormalizedCommand;

/// Byte sink the interpreter writes its reply into.
pub trait ResponseSink {
    /// Accepts one byte of output.
    fn write_byte(&mut self, byte: u8);

    /// Accepts a block of output; equivalent to writing each byte in turn.
    fn write_block(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// Pushes out anything still buffered.
    fn flush(&mut self);
}

/// A synchronous, single-threaded command interpreter.
///
/// `execute` runs to completion on the bridge task; it must not block on
/// I/O. Nothing it returns is inspected.
pub trait CommandInterpreter: Send + 'static {
    /// Executes `command`, writing any reply into `out`.
    fn execute(&mut self, command: &NormalizedCommand, out: &mut dyn ResponseSink);
}

impl<F> CommandInterpreter for F
where
    F: FnMut(&NormalizedCommand, &mut dyn ResponseSink) + Send + 'static,
{
    fn execute(&mut self, command: &NormalizedCommand, out: &mut dyn ResponseSink) {
        self(command, out);
    }
}

/// Interpreter that answers every command with the command itself.
///
/// Lets the gateway run without a command station attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackInterpreter;

impl CommandInterpreter for LoopbackInterpreter {
    fn execute(&mut self, command: &NormalizedCommand, out: &mut dyn ResponseSink) {
        out.write_block(command.as_bytes());
        out.write_byte(b'\n');
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::normalize;

    #[derive(Debug, Default)]
    struct VecSink(Vec<u8>);

    impl ResponseSink for VecSink {
        fn write_byte(&mut self, byte: u8) {
            self.0.push(byte);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn loopback_echoes_with_newline() {
        let Some(cmd) = normalize(b"s", 128) else {
            panic!("expected command");
        };
        let mut sink = VecSink::default();
        LoopbackInterpreter.execute(&cmd, &mut sink);
        assert_eq!(sink.0, b"<s>\n");
    }

    #[test]
    fn closures_are_interpreters() {
        let Some(cmd) = normalize(b"<1>", 128) else {
            panic!("expected command");
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut interp = move |c: &NormalizedCommand, out: &mut dyn ResponseSink| {
            counter.fetch_add(1, Ordering::Relaxed);
            out.write_block(c.as_bytes());
        };
        let mut sink = VecSink::default();
        CommandInterpreter::execute(&mut interp, &cmd, &mut sink);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(sink.0, b"<1>");
    }
}
