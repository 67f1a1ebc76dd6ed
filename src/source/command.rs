use anyhow::{anyhow, Context, Result};
use crossbeam::channel::{self, Sender};
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use tracing::debug;

use crate::event::{Clock, SourceTag};
use crate::event_log::{Run, ARMING_MILESTONE};
use crate::source::EventSource;

const READ_BUFFER_SIZE: usize = 4096;

type Chunk = (SourceTag, Vec<u8>);

/// Launches a command once per pass and records its output
///
/// Standard output is recorded as appliance output, standard error as
/// library messages. Two reader threads forward raw chunks over a channel;
/// the calling thread timestamps and records them in arrival order, so the
/// event log itself is only ever touched by one thread.
///
/// Lifecycle events of a pass:
/// - `launch` (trace): just before spawning, arms the log
/// - `launch done callback`: both output streams have closed
/// - `subprocess quit callback`: the command has exited
/// - `close callback`: terminal event
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    clock: Clock,
}

impl CommandSource {
    /// Create a source for `command` (program followed by its arguments)
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("Command array is empty"))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            clock: Clock::new(),
        })
    }
}

impl EventSource for CommandSource {
    fn run(&mut self, run: &mut Run) -> Result<()> {
        run.record(SourceTag::Trace, self.clock.now(), ARMING_MILESTONE.as_bytes());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.program))?;
        debug!(pass = run.pass(), pid = child.id(), "launched {}", self.program);

        let stdout = child.stdout.take().context("stdout was not captured")?;
        let stderr = child.stderr.take().context("stderr was not captured")?;

        let (tx, rx) = channel::unbounded();
        let readers = [
            spawn_reader(stdout, SourceTag::Appliance, tx.clone()),
            spawn_reader(stderr, SourceTag::Library, tx),
        ];

        // Ends once both readers have hung up
        for (source, chunk) in rx {
            run.record(source, self.clock.now(), &chunk);
        }
        for reader in readers {
            reader
                .join()
                .map_err(|_| anyhow!("output reader thread panicked"))?
                .context("Failed to read command output")?;
        }
        run.record(SourceTag::LaunchDone, self.clock.now(), b"launch done callback");

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {}", self.program))?;
        run.record(
            SourceTag::SubprocessQuit,
            self.clock.now(),
            b"subprocess quit callback",
        );

        if !status.success() {
            anyhow::bail!("{} failed: {}", self.program, status);
        }

        run.record(SourceTag::Close, self.clock.now(), b"close callback");
        Ok(())
    }
}

/// Forward everything read from `pipe` until EOF
fn spawn_reader<R>(mut pipe: R, source: SourceTag, tx: Sender<Chunk>) -> JoinHandle<io::Result<()>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            let n = match pipe.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if tx.send((source, buf[..n].to_vec())).is_err() {
                // Receiver gone, nobody wants the rest
                return Ok(());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSource {
        CommandSource::new(&["sh".to_string(), "-c".to_string(), script.to_string()]).unwrap()
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandSource::new(&[]).is_err());
    }

    #[test]
    fn test_records_output_and_lifecycle() {
        let mut source = sh("echo hello; echo oops >&2; echo world");
        let mut run = Run::new(0);
        source.run(&mut run).unwrap();

        let messages: Vec<&str> = run.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages.first(), Some(&"launch"));
        assert_eq!(messages.last(), Some(&"close callback"));
        assert!(messages.contains(&"hello"));
        assert!(messages.contains(&"world"));
        assert!(messages.contains(&"launch done callback"));

        let oops = run.events().iter().find(|e| e.message == "oops").unwrap();
        assert_eq!(oops.source, SourceTag::Library);
        assert!(run.elapsed_ns().is_some());
    }

    #[test]
    fn test_failing_command_is_fatal() {
        let mut source = sh("exit 3");
        let mut run = Run::new(0);
        let err = source.run(&mut run).unwrap_err();
        assert!(err.to_string().contains("sh failed"));
        assert_eq!(run.end(), None);
    }

    #[test]
    fn test_missing_program_is_fatal() {
        let mut source = CommandSource::new(&["/nonexistent/bootline-test".to_string()]).unwrap();
        let mut run = Run::new(0);
        let err = source.run(&mut run).unwrap_err();
        assert!(err.to_string().contains("Failed to launch"));
    }
}
