use crate::runtime::Host;
use colored::Colorize;
use std::io::Write;
use tracing::{info, warn};

/// Host that reports to the terminal. Diagnostics go to stderr so stdout
/// stays machine-readable.
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl Host for ConsoleHost {
    fn exit(&mut self, code: u32) {
        eprintln!("{} program exited with code {}", "exit:".bold(), code);
    }

    fn on_window_changed(&mut self) {}

    fn show_tab(&mut self, name: &str) {
        info!("Host asked to show the {} view", name);
    }

    fn on_error(&mut self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    fn on_stdout(&mut self, text: &str) {
        forward_output(&mut std::io::stderr().lock(), text);
    }
}

/// Copy guest output to `out`. A failed write is logged, never fatal to the
/// run. Returns whether the text was written.
fn forward_output(out: &mut dyn Write, text: &str) -> bool {
    match out.write_all(text.as_bytes()) {
        Ok(()) => true,
        Err(e) => {
            warn!("Dropped {} bytes of program output: {}", text.len(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

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
    fn forwards_program_output() {
        let mut out = Vec::new();
        assert!(forward_output(&mut out, "hello\n"));
        assert_eq!(out, b"hello\n");
    }

    #[test]
    fn failed_output_write_is_reported_not_fatal() {
        assert!(!forward_output(&mut ClosedPipe, "hello\n"));
    }
}
