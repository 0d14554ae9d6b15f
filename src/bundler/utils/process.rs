//! Running external tools with streamed output.

use crate::bundler::{
    error::{Error, Result},
    install::{OutputSink, OutputStream},
};
use std::{collections::VecDeque, process::ExitStatus, process::Stdio};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    process::Command,
};

/// Number of trailing stderr lines kept for error reports.
pub const STDERR_TAIL: usize = 20;

/// What a finished tool run left behind.
#[derive(Debug)]
pub struct ToolOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Full stdout, when requested.
    pub stdout: String,
    /// Last [`STDERR_TAIL`] lines of stderr.
    pub stderr_tail: Vec<String>,
}

/// Spawns `command`, streams both pipes into `sink` and waits for exit.
///
/// With `keep_stdout`, stdout is collected into [`ToolOutput::stdout`]
/// instead of being forwarded. No timeout is applied.
pub async fn run_streamed(
    mut command: Command,
    tool: &str,
    sink: &dyn OutputSink,
    keep_stdout: bool,
) -> Result<ToolOutput> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::CommandFailed {
            command: tool.to_string(),
            error: e,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (captured, stderr_tail) = tokio::join!(
        async {
            let mut captured = String::new();
            if let Some(stdout) = stdout {
                let mut reader = BufReader::new(stdout);
                let mut buf = Vec::new();
                while let Some(line) = next_line(&mut reader, &mut buf, tool).await {
                    if keep_stdout {
                        captured.push_str(&line);
                        captured.push('\n');
                    } else {
                        sink.line(tool, OutputStream::Stdout, &line);
                    }
                }
            }
            captured
        },
        async {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL);
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr);
                let mut buf = Vec::new();
                while let Some(line) = next_line(&mut reader, &mut buf, tool).await {
                    sink.line(tool, OutputStream::Stderr, &line);
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            tail
        }
    );

    let status = child.wait().await.map_err(|e| Error::CommandFailed {
        command: tool.to_string(),
        error: e,
    })?;

    Ok(ToolOutput {
        status,
        stdout: captured,
        stderr_tail: stderr_tail.into(),
    })
}

/// Reads one line without its terminator, decoding invalid UTF-8 lossily.
///
/// Returns `None` at end of stream or on a read error, which is logged.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>, tool: &str) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    match reader.read_until(b'\n', buf).await {
        Ok(0) => None,
        Ok(_) => Some(
            String::from_utf8_lossy(buf)
                .trim_end_matches(['\n', '\r'])
                .to_string(),
        ),
        Err(e) => {
            log::warn!("Stopped reading {} output: {}", tool, e);
            None
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::bundler::install::CaptureSink;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[tokio::test]
    async fn forwards_lines_to_sink() {
        let sink = CaptureSink::new();
        let output = run_streamed(sh("echo out; echo err >&2"), "sh", &sink, false)
            .await
            .unwrap();
        assert!(output.status.success());
        assert!(output.stdout.is_empty());
        assert_eq!(output.stderr_tail, vec!["err"]);

        let lines = sink.lines();
        assert!(lines.contains(&("sh".into(), OutputStream::Stdout, "out".into())));
        assert!(lines.contains(&("sh".into(), OutputStream::Stderr, "err".into())));
    }

    #[tokio::test]
    async fn keeps_stdout_and_trims_stderr_tail() {
        let sink = CaptureSink::new();
        let output = run_streamed(
            sh("echo '{\"errors\":[]}'; for i in $(seq 1 30); do echo $i >&2; done; exit 3"),
            "sh",
            &sink,
            true,
        )
        .await
        .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout, "{\"errors\":[]}\n");
        assert_eq!(output.stderr_tail.len(), STDERR_TAIL);
        assert_eq!(output.stderr_tail.last().map(String::as_str), Some("30"));
    }

    #[tokio::test]
    async fn missing_program_is_command_failed() {
        let err = run_streamed(
            Command::new("/nonexistent/tool"),
            "tool",
            &crate::bundler::install::NullSink,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_stop_draining() {
        let sink = CaptureSink::new();
        let output = run_streamed(
            sh("printf 'a\\377b\\nnext\\n' >&2; printf 'x\\376\\ny\\n'"),
            "sh",
            &sink,
            true,
        )
        .await
        .unwrap();
        assert_eq!(output.stderr_tail, vec!["a\u{FFFD}b", "next"]);
        assert_eq!(output.stdout, "x\u{FFFD}\ny\n");
    }
}
