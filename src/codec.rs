//! ADPCM decompression for AUD chunk payloads
//!
//! Two predictive codecs appear in AUD files:
//!
//! - **IMA ADPCM** (compression type 99): 4 bits per sample, standard
//!   step-size and index-adjustment tables, 16-bit output. Nibbles are
//!   consumed low-first from each input byte.
//! - **WS ADPCM** (compression type 1): Westwood's proprietary 8-bit
//!   scheme. A byte with the high bit set is a hold command (the low 7
//!   bits count how many times to repeat the current sample); a byte with
//!   the high bit clear packs two 4-bit delta codes, high nibble first,
//!   each a lookup into a signed delta table.
//!
//! Both decoders carry their predictor state across chunk boundaries, so
//! chunks must be decoded strictly in file order.

use crate::header::Compression;

/// Standard IMA ADPCM step-size table.
#[rustfmt::skip]
static IMA_STEP: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17,
    19, 21, 23, 25, 28, 31, 34, 37, 41, 45,
    50, 55, 60, 66, 73, 80, 88, 97, 107, 118,
    130, 143, 157, 173, 190, 209, 230, 253, 279, 307,
    337, 371, 408, 449, 494, 544, 598, 658, 724, 796,
    876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358,
    5894, 6484, 7132, 7845, 8630, 9493, 10442, 11487, 12635, 13899,
    15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767,
];

/// IMA ADPCM index-adjustment table.
#[rustfmt::skip]
static IMA_INDEX: [i32; 16] = [
    -1, -1, -1, -1, 2, 4, 6, 8,
    -1, -1, -1, -1, 2, 4, 6, 8,
];

/// Westwood 4-bit signed delta table.
#[rustfmt::skip]
static WS_DELTA: [i16; 16] = [
    -9, -8, -6, -5, -4, -3, -2, -1,
    0, 1, 2, 3, 4, 5, 6, 8,
];

/// Mid-scale unsigned 8-bit sample, i.e. silence.
const WS_SILENCE: u8 = 0x80;

/// IMA ADPCM decoder state, carried across chunk boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImaState {
    /// Step-table index, kept within `[0, 88]`.
    index: i32,
    /// Running reconstructed sample, kept within `[-32768, 32767]`.
    predictor: i32,
}

impl ImaState {
    /// Decode one chunk of 4-bit codes into little-endian 16-bit PCM.
    ///
    /// Produces exactly `decoded_size` bytes. Never reads past `encoded`;
    /// if the input runs short the remaining output stays zeroed.
    pub fn decode(&mut self, encoded: &[u8], decoded_size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(decoded_size);
        let samples = decoded_size / 2;

        for i in 0..samples {
            let Some(&byte) = encoded.get(i / 2) else {
                break;
            };
            // Low nibble first, then high
            let code = (if i % 2 == 0 { byte & 0x0F } else { byte >> 4 }) as i32;

            let step = IMA_STEP[self.index as usize];
            let magnitude = code & 7;
            let mut diff = step >> 3;
            if magnitude & 4 != 0 {
                diff += step;
            }
            if magnitude & 2 != 0 {
                diff += step >> 1;
            }
            if magnitude & 1 != 0 {
                diff += step >> 2;
            }
            if code & 8 != 0 {
                diff = -diff;
            }

            self.predictor = (self.predictor + diff).clamp(-32768, 32767);
            self.index = (self.index + IMA_INDEX[code as usize]).clamp(0, 88);

            out.extend_from_slice(&(self.predictor as i16).to_le_bytes());
        }

        out.resize(decoded_size, 0);
        out
    }
}

/// WS ADPCM decoder state, carried across chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsState {
    /// Running reconstructed sample, kept within `[0, 255]`.
    predictor: u8,
}

impl WsState {
    /// Create a fresh decoder state positioned at silence.
    pub fn new() -> Self {
        Self {
            predictor: WS_SILENCE,
        }
    }

    /// Decode one chunk of WS ADPCM commands into unsigned 8-bit PCM.
    ///
    /// Produces exactly `decoded_size` bytes. A hold run that would
    /// overshoot the output is cut at the boundary; if the input runs
    /// short the remainder is filled with the current sample.
    pub fn decode(&mut self, encoded: &[u8], decoded_size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(decoded_size);

        for &byte in encoded {
            if out.len() >= decoded_size {
                break;
            }
            if byte & 0x80 != 0 {
                // Hold command: repeat the current sample
                let run = ((byte & 0x7F) as usize).min(decoded_size - out.len());
                out.resize(out.len() + run, self.predictor);
            } else {
                // Two delta codes, high nibble first
                for code in [byte >> 4, byte & 0x0F] {
                    if out.len() >= decoded_size {
                        break;
                    }
                    let next = self.predictor as i16 + WS_DELTA[code as usize];
                    self.predictor = next.clamp(0, 255) as u8;
                    out.push(self.predictor);
                }
            }
        }

        out.resize(decoded_size, self.predictor);
        out
    }
}

impl Default for WsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateful chunk decoder for one open stream.
///
/// Owns whichever codec state the stream's compression type needs.
/// Created once at stream open and never shared between streams.
#[derive(Debug, Clone, Copy)]
pub enum Decoder {
    /// 4-bit IMA ADPCM
    Ima(ImaState),
    /// 8-bit Westwood ADPCM
    Ws(WsState),
}

impl Decoder {
    /// Create a decoder with fresh state for the given compression type.
    pub fn new(compression: Compression) -> Self {
        match compression {
            Compression::ImaAdpcm => Decoder::Ima(ImaState::default()),
            Compression::WsAdpcm => Decoder::Ws(WsState::new()),
        }
    }

    /// Decode one chunk, mutating the carried state in place.
    ///
    /// Deterministic: identical input from identical state yields
    /// identical output. The result is always exactly `decoded_size`
    /// bytes.
    pub fn decode_chunk(&mut self, encoded: &[u8], decoded_size: usize) -> Vec<u8> {
        match self {
            Decoder::Ima(state) => state.decode(encoded, decoded_size),
            Decoder::Ws(state) => state.decode(encoded, decoded_size),
        }
    }
}
