//! AUD container header parsing
//!
//! The AUD files used by Tiberian Dawn and Red Alert start with a fixed
//! 12-byte file header, followed by a sequence of size-prefixed chunks of
//! compressed audio. All multi-byte fields are little-endian:
//!
//! ```text
//! File header (12 bytes):
//!   [2 bytes] sample frequency in Hz (u16)
//!   [4 bytes] total compressed payload size (u32)
//!   [4 bytes] total decompressed size (u32, informational)
//!   [1 byte]  flags (bit 0 = stereo, bit 1 = 16-bit samples)
//!   [1 byte]  compression type (1 = WS ADPCM, 99 = IMA ADPCM)
//!
//! Chunk header (8 bytes):
//!   [2 bytes] compressed chunk size (u16)
//!   [2 bytes] decompressed chunk size (u16)
//!   [4 bytes] chunk marker, always 0x0000DEAF (u32)
//! ```

use crate::error::{AudError, AudResult};

/// File header length in bytes.
pub const FILE_HEADER_SIZE: usize = 12;

/// Chunk header length in bytes.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Structural marker carried by every chunk header.
pub const CHUNK_MAGIC: u32 = 0x0000_DEAF;

const FLAG_STEREO: u8 = 0x01;
const FLAG_16BIT: u8 = 0x02;

const TYPE_WS_ADPCM: u8 = 1;
const TYPE_IMA_ADPCM: u8 = 99;

/// Compression scheme selected by the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Westwood proprietary 8-bit ADPCM (type 1).
    WsAdpcm,
    /// IMA ADPCM, 4 bits per sample (type 99).
    ImaAdpcm,
}

impl TryFrom<u8> for Compression {
    type Error = AudError;

    fn try_from(value: u8) -> AudResult<Self> {
        match value {
            TYPE_WS_ADPCM => Ok(Compression::WsAdpcm),
            TYPE_IMA_ADPCM => Ok(Compression::ImaAdpcm),
            other => Err(AudError::UnsupportedCodec(other)),
        }
    }
}

/// Output sample layout derived from the header flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit mono (1 byte per frame)
    Mono8,
    /// 16-bit mono (2 bytes per frame)
    Mono16,
    /// 8-bit stereo (2 bytes per frame)
    Stereo8,
    /// 16-bit stereo (4 bytes per frame)
    Stereo16,
}

impl SampleFormat {
    /// Derive the sample format from the header flags byte.
    pub fn from_flags(flags: u8) -> Self {
        match (flags & FLAG_STEREO != 0, flags & FLAG_16BIT != 0) {
            (false, false) => SampleFormat::Mono8,
            (false, true) => SampleFormat::Mono16,
            (true, false) => SampleFormat::Stereo8,
            (true, true) => SampleFormat::Stereo16,
        }
    }

    /// Number of channels (1 or 2).
    pub fn channels(&self) -> u32 {
        match self {
            SampleFormat::Mono8 | SampleFormat::Mono16 => 1,
            SampleFormat::Stereo8 | SampleFormat::Stereo16 => 2,
        }
    }

    /// Bits per sample (8 or 16).
    pub fn bitrate(&self) -> u32 {
        match self {
            SampleFormat::Mono8 | SampleFormat::Stereo8 => 8,
            SampleFormat::Mono16 | SampleFormat::Stereo16 => 16,
        }
    }

    /// Bytes per sample frame across all channels.
    pub fn bytes_per_frame(&self) -> usize {
        match self {
            SampleFormat::Mono8 => 1,
            SampleFormat::Mono16 | SampleFormat::Stereo8 => 2,
            SampleFormat::Stereo16 => 4,
        }
    }
}

/// Parsed AUD file header.
///
/// Parsed once at stream open and immutable for the stream's lifetime.
/// `output_size` is informational; the chunk headers drive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Sample frequency in Hz.
    pub frequency: u16,
    /// Declared total compressed payload length.
    pub data_size: u32,
    /// Declared total decompressed length (informational).
    pub output_size: u32,
    /// Flags byte (bit 0 = stereo, bit 1 = 16-bit).
    pub flags: u8,
    /// Raw compression type byte.
    pub compression: u8,
}

impl FileHeader {
    /// Parse from little-endian bytes.
    ///
    /// Fails with [`AudError::MalformedHeader`] if fewer than
    /// [`FILE_HEADER_SIZE`] bytes are given.
    pub fn parse(data: &[u8]) -> AudResult<Self> {
        if data.len() < FILE_HEADER_SIZE {
            return Err(AudError::MalformedHeader("file header truncated"));
        }
        Ok(Self {
            frequency: u16::from_le_bytes([data[0], data[1]]),
            data_size: u32::from_le_bytes([data[2], data[3], data[4], data[5]]),
            output_size: u32::from_le_bytes([data[6], data[7], data[8], data[9]]),
            flags: data[10],
            compression: data[11],
        })
    }

    /// Resolve the compression type byte into a decoder selection.
    ///
    /// Fails with [`AudError::UnsupportedCodec`] for anything other than
    /// the two known schemes; there is no pass-through fallback.
    pub fn codec(&self) -> AudResult<Compression> {
        Compression::try_from(self.compression)
    }

    /// Sample frequency in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.frequency as u32
    }

    /// Bits per sample, from flags bit 1.
    pub fn bitrate(&self) -> u32 {
        SampleFormat::from_flags(self.flags).bitrate()
    }

    /// Channel count, from flags bit 0.
    pub fn channels(&self) -> u32 {
        SampleFormat::from_flags(self.flags).channels()
    }

    /// Output sample layout, from the flags byte.
    pub fn sample_format(&self) -> SampleFormat {
        SampleFormat::from_flags(self.flags)
    }
}

/// Parsed AUD chunk header.
///
/// One instance per chunk-loop iteration; discarded after the chunk is
/// decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Compressed payload length of this chunk.
    pub encoded_size: u16,
    /// Decompressed output length of this chunk.
    pub decoded_size: u16,
    /// Chunk marker, expected to be [`CHUNK_MAGIC`].
    pub magic: u32,
}

impl ChunkHeader {
    /// Parse from little-endian bytes.
    ///
    /// Fails with [`AudError::MalformedHeader`] if fewer than
    /// [`CHUNK_HEADER_SIZE`] bytes are given or the marker does not match
    /// [`CHUNK_MAGIC`]. The caller distinguishes an empty read (clean end
    /// of stream) before calling this.
    pub fn parse(data: &[u8]) -> AudResult<Self> {
        if data.len() < CHUNK_HEADER_SIZE {
            return Err(AudError::MalformedHeader("chunk header truncated"));
        }
        let header = Self {
            encoded_size: u16::from_le_bytes([data[0], data[1]]),
            decoded_size: u16::from_le_bytes([data[2], data[3]]),
            magic: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        };
        if header.magic != CHUNK_MAGIC {
            return Err(AudError::MalformedHeader("bad chunk marker"));
        }
        Ok(header)
    }
}
