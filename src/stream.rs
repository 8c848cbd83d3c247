//! Streaming decode pipeline
//!
//! Turns the one-pass forward decode of an AUD container into a pull-based
//! byte stream. [`AudStream::open`] parses the file header eagerly, then
//! spawns a single worker thread that walks the chunk sequence, decodes
//! each chunk with the carried codec state, and hands whole decoded chunks
//! to the caller through a bounded channel. The channel is the only
//! synchronization boundary between the worker and the caller:
//!
//! - the worker blocks on `send` when the channel is full (backpressure)
//!   and on source reads during I/O;
//! - the caller blocks on `recv` inside [`Read::read`] when the channel is
//!   empty.
//!
//! Chunks are delivered strictly in file order. Decoder state is
//! sequentially dependent across chunks, so there is no parallel chunk
//! decode. Closing or dropping the stream disconnects the channel, which
//! unblocks a pending worker send and makes the worker exit without
//! completing outstanding chunks.

use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::codec::Decoder;
use crate::error::{AudError, AudResult};
use crate::header::{ChunkHeader, FileHeader, SampleFormat, CHUNK_HEADER_SIZE, FILE_HEADER_SIZE};

/// Decoded chunks buffered between the worker and the caller. Each chunk
/// is at most 65535 bytes, so this bounds the bytes in flight.
const CHANNEL_CAPACITY: usize = 4;

/// Lifecycle of an open stream. `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// The worker is producing decoded chunks.
    Running,
    /// Clean end of stream, or the stream was closed by the caller.
    Closed,
    /// A chunk-level error terminated the decode.
    Failed,
}

/// An open AUD container being decoded in the background.
///
/// Reading from the stream is the caller's only suspension point; the
/// `Read` implementation yields raw PCM in exact production order. One
/// consumer per stream (`read` takes `&mut self`).
pub struct AudStream {
    header: FileHeader,
    receiver: Option<Receiver<AudResult<Vec<u8>>>>,
    worker: Option<JoinHandle<()>>,
    /// Unread remainder of the chunk most recently pulled off the channel.
    pending: Vec<u8>,
    pending_pos: usize,
    state: StreamState,
}

impl AudStream {
    /// Open an AUD container positioned at the start of its file header.
    ///
    /// Parses the header and resolves the compression type before any
    /// worker is spawned, so a short header fails with
    /// [`AudError::MalformedHeader`] and an unknown compression type with
    /// [`AudError::UnsupportedCodec`] without a stream object ever being
    /// returned.
    pub fn open<R>(mut source: R) -> AudResult<Self>
    where
        R: Read + Send + 'static,
    {
        let mut header_bytes = [0u8; FILE_HEADER_SIZE];
        if read_full(&mut source, &mut header_bytes)? < FILE_HEADER_SIZE {
            return Err(AudError::MalformedHeader("file header truncated"));
        }
        let header = FileHeader::parse(&header_bytes)?;
        let codec = header.codec()?;
        let decoder = Decoder::new(codec);

        log::debug!(
            "aud stream open: {} Hz, {}-bit, {} channel(s), {:?}",
            header.sample_rate(),
            header.bitrate(),
            header.channels(),
            codec,
        );

        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        let worker = thread::Builder::new()
            .name("aud-decode".to_string())
            .spawn(move || decode_loop(source, decoder, sender))?;

        Ok(Self {
            header,
            receiver: Some(receiver),
            worker: Some(worker),
            pending: Vec::new(),
            pending_pos: 0,
            state: StreamState::Running,
        })
    }

    /// The file header parsed at open.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Sample frequency in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate()
    }

    /// Bits per sample of the decoded output.
    pub fn bitrate(&self) -> u32 {
        self.header.bitrate()
    }

    /// Channel count of the decoded output.
    pub fn channels(&self) -> u32 {
        self.header.channels()
    }

    /// Sample layout of the decoded output.
    pub fn sample_format(&self) -> SampleFormat {
        self.header.sample_format()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Close the stream, cancelling any in-flight decode.
    ///
    /// Disconnects the channel so a worker parked on a full channel exits
    /// promptly, then joins it. Idempotent; buffered but unread output is
    /// discarded.
    pub fn close(&mut self) {
        if self.state == StreamState::Running {
            self.state = StreamState::Closed;
        }
        self.pending.clear();
        self.pending_pos = 0;
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the receiver breaks the channel for the worker
        self.receiver = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("aud decode worker panicked");
            }
        }
    }
}

impl Read for AudStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.pending_pos < self.pending.len() {
                let n = (self.pending.len() - self.pending_pos).min(buf.len());
                buf[..n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                self.pending_pos += n;
                return Ok(n);
            }

            let receiver = match &self.receiver {
                Some(receiver) => receiver,
                None => return Ok(0),
            };
            match receiver.recv() {
                Ok(Ok(chunk)) => {
                    // Zero-length chunks just loop for the next one
                    self.pending = chunk;
                    self.pending_pos = 0;
                }
                Ok(Err(err)) => {
                    self.state = StreamState::Failed;
                    self.shutdown();
                    return Err(err.into());
                }
                Err(_) => {
                    // Worker dropped the sender: clean end of stream
                    self.state = StreamState::Closed;
                    self.shutdown();
                    return Ok(0);
                }
            }
        }
    }
}

impl Drop for AudStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Worker loop: chunk header, payload, decode, send, repeat.
///
/// Exits when a chunk-header read returns zero bytes (clean end of
/// stream), when the receiver disconnects (cancellation), or after
/// sending the first error. Dropping the sender is what closes the
/// caller-visible stream.
fn decode_loop<R: Read>(mut source: R, mut decoder: Decoder, sender: Sender<AudResult<Vec<u8>>>) {
    loop {
        let mut header_bytes = [0u8; CHUNK_HEADER_SIZE];
        let got = match read_full(&mut source, &mut header_bytes) {
            Ok(got) => got,
            Err(err) => return fail(&sender, AudError::Io(err)),
        };
        if got == 0 {
            log::debug!("aud stream reached end of chunks");
            return;
        }
        if got < CHUNK_HEADER_SIZE {
            return fail(&sender, AudError::MalformedHeader("chunk header truncated"));
        }

        let chunk = match ChunkHeader::parse(&header_bytes) {
            Ok(chunk) => chunk,
            Err(err) => return fail(&sender, err),
        };

        let mut encoded = vec![0u8; chunk.encoded_size as usize];
        match read_full(&mut source, &mut encoded) {
            Ok(got) if got < encoded.len() => {
                return fail(
                    &sender,
                    AudError::TruncatedChunk {
                        expected: encoded.len(),
                        actual: got,
                    },
                );
            }
            Ok(_) => {}
            Err(err) => return fail(&sender, AudError::Io(err)),
        }

        let decoded = decoder.decode_chunk(&encoded, chunk.decoded_size as usize);
        if sender.send(Ok(decoded)).is_err() {
            // Receiver dropped; the stream was closed under us
            return;
        }
    }
}

fn fail(sender: &Sender<AudResult<Vec<u8>>>, err: AudError) {
    log::warn!("aud decode failed: {}", err);
    let _ = sender.send(Err(err));
}

/// Read until `buf` is full or the source is exhausted, returning the
/// number of bytes read. Unlike `read_exact`, a clean EOF short of the
/// buffer length is not an error here; callers decide what a short read
/// means at their point in the container.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
