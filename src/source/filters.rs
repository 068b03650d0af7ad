//! Decoders for the generic PDF stream filters.
//!
//! lopdf refuses to decompress image streams, so image payloads are
//! decoded here stage by stage. Only the filters that wrap bytes are
//! handled; image codecs (DCT, JPX, JBIG2, CCITT) are passed through by
//! the caller.

use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Object};
use weezl::{decode::Decoder as LzwDecoder, BitOrder};

/// Why a stage could not be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StageError {
    /// The filter or one of its parameters is not implemented
    Unsupported(String),
    /// The data does not decode
    Corrupt(String),
}

/// Canonical name of a generic filter, accepting inline-image abbreviations.
pub(crate) fn generic_filter(name: &str) -> Option<&'static str> {
    match name {
        "FlateDecode" | "Fl" => Some("FlateDecode"),
        "LZWDecode" | "LZW" => Some("LZWDecode"),
        "ASCII85Decode" | "A85" => Some("ASCII85Decode"),
        "ASCIIHexDecode" | "AHx" => Some("ASCIIHexDecode"),
        "RunLengthDecode" | "RL" => Some("RunLengthDecode"),
        _ => None,
    }
}

/// Undo one filter stage.
pub(crate) fn decode_stage(
    filter: &str,
    data: &[u8],
    params: Option<&Dictionary>,
) -> Result<Vec<u8>, StageError> {
    match generic_filter(filter) {
        Some("FlateDecode") => predict(inflate(data)?, params),
        Some("LZWDecode") => predict(lzw(data, params)?, params),
        Some("ASCII85Decode") => ascii85(data),
        Some("ASCIIHexDecode") => ascii_hex(data),
        Some("RunLengthDecode") => run_length(data),
        _ => Err(StageError::Unsupported(filter.to_string())),
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, StageError> {
    let mut out = Vec::with_capacity(data.len() * 2);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| StageError::Corrupt(e.to_string()))?;
    Ok(out)
}

fn lzw(data: &[u8], params: Option<&Dictionary>) -> Result<Vec<u8>, StageError> {
    // EarlyChange 1 (the default) widens codes one entry early, as TIFF does.
    let early_change = int_param(params, b"EarlyChange").unwrap_or(1) != 0;
    let mut decoder = if early_change {
        LzwDecoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        LzwDecoder::new(BitOrder::Msb, 8)
    };

    let mut out = Vec::new();
    decoder
        .into_vec(&mut out)
        .decode_all(data)
        .status
        .map_err(|e| StageError::Corrupt(e.to_string()))?;
    Ok(out)
}

fn ascii85(data: &[u8]) -> Result<Vec<u8>, StageError> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);
    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut len = 0;

    for &byte in data {
        match byte {
            b'~' => break,
            b if b.is_ascii_whitespace() || b == 0 => {}
            b'z' if len == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[len] = byte - b'!';
                len += 1;
                if len == 5 {
                    out.extend_from_slice(&ascii85_group(&group)?);
                    len = 0;
                }
            }
            other => {
                return Err(StageError::Corrupt(format!(
                    "invalid ASCII85 byte 0x{:02X}",
                    other
                )))
            }
        }
    }

    match len {
        0 => {}
        1 => return Err(StageError::Corrupt("truncated ASCII85 group".into())),
        _ => {
            // Pad with 'u' and keep one byte less than the characters given.
            group[len..].fill(b'u' - b'!');
            out.extend_from_slice(&ascii85_group(&group)?[..len - 1]);
        }
    }
    Ok(out)
}

fn ascii85_group(group: &[u8; 5]) -> Result<[u8; 4], StageError> {
    let value = group.iter().fold(0u64, |acc, &d| acc * 85 + u64::from(d));
    u32::try_from(value)
        .map(u32::to_be_bytes)
        .map_err(|_| StageError::Corrupt("ASCII85 group out of range".into()))
}

fn ascii_hex(data: &[u8]) -> Result<Vec<u8>, StageError> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &byte in data {
        if byte == b'>' {
            break;
        }
        if byte.is_ascii_whitespace() || byte == 0 {
            continue;
        }
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            other => {
                return Err(StageError::Corrupt(format!(
                    "invalid hex byte 0x{:02X}",
                    other
                )))
            }
        };
        match high.take() {
            Some(h) => out.push(h << 4 | nibble),
            None => high = Some(nibble),
        }
    }

    // An odd final digit is followed by an implied 0.
    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}

fn run_length(data: &[u8]) -> Result<Vec<u8>, StageError> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i] as usize;
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let run = data
                    .get(i..i + length + 1)
                    .ok_or_else(|| StageError::Corrupt("truncated literal run".into()))?;
                out.extend_from_slice(run);
                i += length + 1;
            }
            _ => {
                let byte = *data
                    .get(i)
                    .ok_or_else(|| StageError::Corrupt("truncated repeat run".into()))?;
                out.extend(std::iter::repeat(byte).take(257 - length));
                i += 1;
            }
        }
    }
    Ok(out)
}

fn int_param(params: Option<&Dictionary>, key: &[u8]) -> Option<i64> {
    match params?.get(key).ok()? {
        Object::Integer(n) => Some(*n),
        _ => None,
    }
}

/// Reverse a `/Predictor` applied before Flate or LZW compression.
fn predict(data: Vec<u8>, params: Option<&Dictionary>) -> Result<Vec<u8>, StageError> {
    let predictor = int_param(params, b"Predictor").unwrap_or(1);
    if predictor == 1 {
        return Ok(data);
    }

    let colors = int_param(params, b"Colors").unwrap_or(1).max(1) as usize;
    let bits = int_param(params, b"BitsPerComponent").unwrap_or(8).max(1) as usize;
    let columns = int_param(params, b"Columns").unwrap_or(1).max(1) as usize;

    match predictor {
        2 if bits == 8 => Ok(tiff_predictor(data, colors * columns, colors)),
        10..=15 => png_predictor(&data, (colors * columns * bits + 7) / 8, (colors * bits + 7) / 8),
        other => Err(StageError::Unsupported(format!(
            "Predictor {} with {} bits per component",
            other, bits
        ))),
    }
}

/// Horizontal differencing, one row at a time, for 8-bit samples.
fn tiff_predictor(mut data: Vec<u8>, row_bytes: usize, bpp: usize) -> Vec<u8> {
    for row in data.chunks_mut(row_bytes) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    data
}

/// PNG row filters; every row starts with its filter type byte.
fn png_predictor(data: &[u8], row_bytes: usize, bpp: usize) -> Result<Vec<u8>, StageError> {
    let bpp = bpp.max(1);
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_bytes];

    for chunk in data.chunks(row_bytes + 1) {
        if chunk.len() < row_bytes + 1 {
            break;
        }
        let (filter, row) = (chunk[0], &chunk[1..]);
        let mut cur = vec![0u8; row_bytes];
        for i in 0..row_bytes {
            let left = if i >= bpp { cur[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            cur[i] = row[i].wrapping_add(match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(StageError::Corrupt(format!("PNG row filter {}", other)));
                }
            });
        }
        out.extend_from_slice(&cur);
        prev = cur;
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let (pa, pb, pc) = (
        (p - i16::from(a)).abs(),
        (p - i16::from(b)).abs(),
        (p - i16::from(c)).abs(),
    );
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
