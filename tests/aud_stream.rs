//! End-to-end tests for the AUD streaming pipeline
//!
//! These tests build synthetic AUD containers, write them to disk, and
//! decode them through the full worker/channel pipeline, comparing the
//! output against a direct sequential decode.

use std::fs::File;
use std::io::{Read, Write};

use wsaud::{AudStream, Compression, Decoder, StreamState, FileHeader};

const CHUNK_MAGIC: u32 = 0x0000_DEAF;

fn file_header(frequency: u16, flags: u8, compression: u8, output_size: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&frequency.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&output_size.to_le_bytes());
    bytes.push(flags);
    bytes.push(compression);
    bytes
}

fn chunk(encoded: &[u8], decoded_size: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(encoded.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&decoded_size.to_le_bytes());
    bytes.extend_from_slice(&CHUNK_MAGIC.to_le_bytes());
    bytes.extend_from_slice(encoded);
    bytes
}

/// A deterministic but uneven spread of chunk payloads.
fn synthetic_payloads(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let len = 1 + (i * 7) % 40;
            (0..len).map(|j| ((i * 31 + j * 13) % 256) as u8).collect()
        })
        .collect()
}

#[test]
fn test_file_backed_stream_matches_reference() {
    let payloads = synthetic_payloads(24);

    let mut container = file_header(22050, 0x02, 99, 0);
    let mut reference = Decoder::new(Compression::ImaAdpcm);
    let mut expected = Vec::new();
    for payload in &payloads {
        let decoded_size = (payload.len() * 4) as u16;
        container.extend(chunk(payload, decoded_size));
        expected.extend(reference.decode_chunk(payload, decoded_size as usize));
    }

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&container).unwrap();
    file.flush().unwrap();

    let source = File::open(file.path()).unwrap();
    let mut stream = AudStream::open(source).unwrap();
    assert_eq!(stream.sample_rate(), 22050);
    assert_eq!(stream.bitrate(), 16);

    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert_eq!(out, expected);
    assert_eq!(stream.state(), StreamState::Closed);
}

#[test]
fn test_ws_stream_matches_reference() {
    let payloads = synthetic_payloads(16);

    let mut container = file_header(11025, 0x00, 1, 0);
    let mut reference = Decoder::new(Compression::WsAdpcm);
    let mut expected = Vec::new();
    for payload in &payloads {
        // Generous decoded size: holds and deltas both fit
        let decoded_size = (payload.len() * 2) as u16;
        container.extend(chunk(payload, decoded_size));
        expected.extend(reference.decode_chunk(payload, decoded_size as usize));
    }

    let mut stream = AudStream::open(std::io::Cursor::new(container)).unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn test_chunk_ordering_under_small_reads() {
    // Pull one byte at a time to force many channel round-trips; the
    // output must still be in exact production order
    let payloads = synthetic_payloads(8);

    let mut container = file_header(11025, 0x00, 99, 0);
    let mut reference = Decoder::new(Compression::ImaAdpcm);
    let mut expected = Vec::new();
    for payload in &payloads {
        let decoded_size = (payload.len() * 4) as u16;
        container.extend(chunk(payload, decoded_size));
        expected.extend(reference.decode_chunk(payload, decoded_size as usize));
    }

    let mut stream = AudStream::open(std::io::Cursor::new(container)).unwrap();
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    while stream.read(&mut byte).unwrap() == 1 {
        out.push(byte[0]);
    }
    assert_eq!(out, expected);
}

#[test]
fn test_two_streams_do_not_share_state() {
    // Decoding the same container twice in parallel must give identical
    // output; each stream owns an independent decoder state and worker
    let mut container = file_header(11025, 0x00, 1, 0);
    for payload in synthetic_payloads(12) {
        let decoded_size = (payload.len() * 2) as u16;
        container.extend(chunk(&payload, decoded_size));
    }

    let mut a = AudStream::open(std::io::Cursor::new(container.clone())).unwrap();
    let mut b = AudStream::open(std::io::Cursor::new(container)).unwrap();

    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    a.read_to_end(&mut out_a).unwrap();
    b.read_to_end(&mut out_b).unwrap();
    assert_eq!(out_a, out_b);
}

#[test]
fn test_header_accessors_from_scenario_bytes() {
    let bytes = [
        0x11, 0x2B, 0x10, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x02, 0x01,
    ];
    let header = FileHeader::parse(&bytes).unwrap();
    assert_eq!(header.sample_rate(), 11025);
    assert_eq!(header.data_size, 16);
    assert_eq!(header.output_size, 32);
    assert_eq!(header.bitrate(), 16);
    assert_eq!(header.channels(), 1);
    assert_eq!(header.codec().unwrap(), Compression::WsAdpcm);
}

#[test]
fn test_unsupported_codec_never_produces_output() {
    let container = file_header(11025, 0x00, 5, 0);
    match AudStream::open(std::io::Cursor::new(container)) {
        Err(wsaud::AudError::UnsupportedCodec(5)) => {}
        other => panic!("expected UnsupportedCodec, got {:?}", other.map(|_| ())),
    }
}

/// Wraps a source and counts how many bytes the worker has pulled.
struct CountingReader {
    inner: std::io::Cursor<Vec<u8>>,
    read: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read
            .fetch_add(n, std::sync::atomic::Ordering::SeqCst);
        Ok(n)
    }
}

#[test]
fn test_backpressure_bounds_worker_progress() {
    // 64 equal chunks, but a channel that only holds a handful: with no
    // reader pulling, the worker must park well short of the file end
    let encoded = [0x90u8; 8]; // hold 16 samples
    let chunk_bytes = chunk(&encoded, 16);
    let mut container = file_header(11025, 0x00, 1, 0);
    for _ in 0..64 {
        container.extend(chunk_bytes.clone());
    }
    let total = container.len();

    let read = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let source = CountingReader {
        inner: std::io::Cursor::new(container),
        read: read.clone(),
    };

    let mut stream = AudStream::open(source).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(100));

    let consumed = read.load(std::sync::atomic::Ordering::SeqCst);
    assert!(
        consumed < total,
        "worker consumed the whole source ({} bytes) with no reader attached",
        consumed
    );

    // Draining the stream releases the worker chunk by chunk; nothing is
    // lost and every byte arrives
    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert_eq!(out.len(), 64 * 16);
    assert!(out.iter().all(|&b| b == 0x80));
    assert_eq!(read.load(std::sync::atomic::Ordering::SeqCst), total);
}

#[test]
fn test_truncated_file_surfaces_error_not_hang() {
    let mut container = file_header(11025, 0x00, 1, 0);
    container.extend(chunk(&[0x83, 0x83], 6));
    container.extend(chunk(&[0x83, 0x83], 6));
    container.truncate(container.len() - 1); // clip the last payload byte

    let mut stream = AudStream::open(std::io::Cursor::new(container)).unwrap();
    let mut out = Vec::new();
    let err = stream.read_to_end(&mut out).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    // The first, intact chunk was still delivered before the failure
    assert_eq!(out, vec![0x80; 6]);
    assert_eq!(stream.state(), StreamState::Failed);
}
