//! Streaming decoder for Westwood AUD audio containers
//!
//! AUD is the sound format used by Tiberian Dawn and Red Alert. A file is
//! a 12-byte header followed by a sequence of size-prefixed chunks, each
//! compressed with one of two schemes: IMA ADPCM or Westwood's own 8-bit
//! ADPCM. Decoding is strictly forward and single-pass; the codec state
//! carries across chunk boundaries.
//!
//! [`AudStream`] runs the chunk decode on a background worker and exposes
//! the PCM output through [`std::io::Read`], with a bounded channel
//! providing backpressure between the two.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::Read;
//!
//! use wsaud::AudStream;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("sounds/await_r.aud")?;
//! let mut stream = AudStream::open(file)?;
//!
//! let mut pcm = Vec::new();
//! stream.read_to_end(&mut pcm)?;
//! println!("{} Hz, {}-bit: {} bytes", stream.sample_rate(), stream.bitrate(), pcm.len());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod header;
pub mod stream;

pub use codec::Decoder;
pub use error::{AudError, AudResult};
pub use header::{ChunkHeader, Compression, FileHeader, SampleFormat};
pub use stream::{AudStream, StreamState};
