//! Duplex byte stream through one transcoder subprocess
//!
//! A `ConversionStream` owns exactly one child process and is never reused.
//! Bytes written to the input side are forwarded to the child's stdin with
//! backpressure: a write suspends while the pipe is saturated, and `&mut`
//! receivers keep a second write from starting before the first completes.
//! Every chunk the child emits on stdout is forwarded verbatim and in order
//! on the output side.
//!
//! A broken input pipe means the child stopped wanting input and is a normal
//! end of the stream, not a failure. Any other pipe error is fatal. After
//! both pipes have closed, a non-zero exit status fails the conversion.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};

use super::{ConversionSpec, Transcoder};
use crate::error::{IngestError, Result};

/// Result of a single write to the conversion input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The chunk was accepted by the subprocess input pipe
    Accepted,
    /// The subprocess closed its input early and wants no more bytes.
    /// Normal termination, not a failure.
    InputClosed,
}

/// One subprocess with both pipes wired.
///
/// Lifecycle: spawned (both pipes open) → draining (input closed, output
/// still flowing) → reaped via [`finish`](Self::finish) or
/// [`abort`](Self::abort). The child is killed on drop, so a pipeline that
/// errors out or is cancelled cannot leak the process.
pub struct ConversionStream {
    child: Child,
    input: Option<ChildStdin>,
    output: Option<ChildStdout>,
}

impl ConversionStream {
    /// Spawn the transcoder for `spec` and wire its pipes
    pub fn spawn(transcoder: &Transcoder, spec: &ConversionSpec) -> Result<Self> {
        Self::spawn_with_args(transcoder, &spec.to_args())
    }

    pub(crate) fn spawn_with_args(transcoder: &Transcoder, args: &[String]) -> Result<Self> {
        let mut child = transcoder.spawn(args)?;
        let input = child
            .stdin
            .take()
            .ok_or_else(|| IngestError::SubprocessIo("input pipe not connected".into()))?;
        let output = child
            .stdout
            .take()
            .ok_or_else(|| IngestError::SubprocessIo("output pipe not connected".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr));
        }
        Ok(Self {
            child,
            input: Some(input),
            output: Some(output),
        })
    }

    /// Take the output side of the stream.
    ///
    /// The caller drains it concurrently with writes; the conversion is only
    /// complete once this pipe reaches end of file.
    pub fn take_output(&mut self) -> Result<ChildStdout> {
        self.output
            .take()
            .ok_or_else(|| IngestError::SubprocessIo("output side already taken".into()))
    }

    /// Write one chunk to the subprocess input.
    ///
    /// Suspends while the pipe is saturated. Once the input side has closed
    /// (by [`close_input`](Self::close_input) or a broken pipe), further
    /// writes report [`WriteOutcome::InputClosed`] without consuming bytes.
    pub async fn write(&mut self, chunk: &[u8]) -> Result<WriteOutcome> {
        let Some(input) = self.input.as_mut() else {
            return Ok(WriteOutcome::InputClosed);
        };
        match input.write_all(chunk).await {
            Ok(()) => Ok(WriteOutcome::Accepted),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                // The child stopped reading; the consumer has all it needs.
                self.input = None;
                Ok(WriteOutcome::InputClosed)
            }
            Err(e) => Err(IngestError::SubprocessIo(format!("input pipe: {e}"))),
        }
    }

    /// Close the input pipe, signalling end of input to the child. Idempotent.
    pub async fn close_input(&mut self) -> Result<()> {
        if let Some(mut input) = self.input.take() {
            match input.shutdown().await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(IngestError::SubprocessIo(format!("input pipe: {e}"))),
            }
        }
        Ok(())
    }

    /// Feed every chunk of `input` through the stream, then close the input.
    ///
    /// Stops early (still successfully) when the child closes its input.
    pub async fn feed_from<S>(&mut self, mut input: S) -> Result<()>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        while let Some(chunk) = input.next().await {
            let chunk = chunk?;
            if self.write(&chunk).await? == WriteOutcome::InputClosed {
                break;
            }
        }
        self.close_input().await
    }

    /// Reap the child after both pipes are done; non-zero exit is fatal.
    pub async fn finish(mut self) -> Result<()> {
        self.close_input().await?;
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| IngestError::SubprocessIo(format!("wait: {e}")))?;
        if !status.success() {
            return Err(IngestError::SubprocessIo(format!(
                "transcoder exited with {status}"
            )));
        }
        Ok(())
    }

    /// Terminate the child and reap it. Used on pipeline abort.
    pub async fn abort(mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

/// Route child stderr lines to diagnostic logging, never to the output pipe
async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(target: "transcoder", "{}", line);
    }
}
