//! RGBE (Radiance `.hdr`) reader and writer.
//!
//! Format reference: <http://www.graphics.cornell.edu/online/formats/rgbe/>
//!
//! The reader handles both the flat 4-byte-per-pixel body and the adaptive
//! RLE body; the writer always emits the flat form.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use lumen_math::Vec3;
use thiserror::Error;

use crate::image::Image;

/// Errors that can occur while reading or writing Radiance files.
#[derive(Error, Debug)]
pub enum HdrError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("not a Radiance file (missing #? magic)")]
    BadMagic,

    #[error("header ended before the FORMAT line")]
    MissingFormat,

    #[error("malformed header line: {0:?}")]
    BadHeader(String),

    #[error("malformed resolution line: {0:?}")]
    BadResolution(String),

    #[error("RLE scanline length {actual} does not match image width {expected}")]
    ScanlineLength { expected: usize, actual: usize },

    #[error("malformed RLE run")]
    BadRle,

    #[error("truncated pixel data")]
    Truncated,
}

pub type HdrResult<T> = Result<T, HdrError>;

/// Read a Radiance file from disk.
pub fn read_hdr(path: impl AsRef<Path>) -> HdrResult<Image> {
    let file = File::open(path)?;
    read_hdr_from(&mut BufReader::new(file))
}

/// Read a Radiance image from any buffered stream.
pub fn read_hdr_from<R: BufRead>(reader: &mut R) -> HdrResult<Image> {
    let magic = read_header_line(reader)?.ok_or(HdrError::BadMagic)?;
    if !magic.starts_with("#?") {
        return Err(HdrError::BadMagic);
    }

    // Scan to the FORMAT line; GAMMA may appear anywhere before it.
    let mut gamma = 1.0f32;
    loop {
        let line = read_header_line(reader)?.ok_or(HdrError::MissingFormat)?;
        if line == "FORMAT=32-bit_rle_rgbe" {
            break;
        }
        if let Some(value) = line.strip_prefix("GAMMA=") {
            gamma = value
                .trim()
                .parse()
                .map_err(|_| HdrError::BadHeader(line.clone()))?;
        }
    }

    let blank = read_header_line(reader)?.ok_or(HdrError::Truncated)?;
    if !blank.is_empty() {
        return Err(HdrError::BadHeader(blank));
    }

    let resolution = read_header_line(reader)?.ok_or(HdrError::Truncated)?;
    let (width, height) = parse_resolution(&resolution)?;

    let mut image = Image::new(width, height);

    let mut record = read_record(reader)?;
    if is_rle_marker(record) {
        // Adaptive RLE: four channel planes per scanline.
        let mut planes = vec![[0u8; 4]; width];
        for y in 0..height {
            let length = ((record[2] as usize) << 8) | record[3] as usize;
            if length != width {
                return Err(HdrError::ScanlineLength {
                    expected: width,
                    actual: length,
                });
            }
            for channel in 0..4 {
                read_rle_channel(reader, &mut planes, channel)?;
            }
            for (x, rgbe) in planes.iter().enumerate() {
                image.set(x, y, rgbe_to_rgb(*rgbe, gamma));
            }
            if y + 1 < height {
                record = read_record(reader)?;
                if !is_rle_marker(record) {
                    return Err(HdrError::BadRle);
                }
            }
        }
    } else {
        // Flat body; the first record was already consumed.
        image.pixels[0] = rgbe_to_rgb(record, gamma);
        for i in 1..width * height {
            image.pixels[i] = rgbe_to_rgb(read_record(reader)?, gamma);
        }
    }

    Ok(image)
}

/// Write a Radiance file to disk (flat body).
pub fn write_hdr(path: impl AsRef<Path>, image: &Image) -> HdrResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_hdr_to(&mut writer, image)?;
    writer.flush()?;
    Ok(())
}

/// Write a Radiance image to any stream (flat body).
pub fn write_hdr_to<W: Write>(out: &mut W, image: &Image) -> HdrResult<()> {
    write!(out, "#?RADIANCE\n")?;
    write!(out, "GAMMA=1\n")?;
    write!(out, "EXPOSURE=1\n")?;
    write!(out, "FORMAT=32-bit_rle_rgbe\n")?;
    write!(out, "\n")?;
    write!(out, "-Y {} +X {}\n", image.height, image.width)?;

    for pixel in &image.pixels {
        out.write_all(&rgb_to_rgbe(*pixel))?;
    }
    Ok(())
}

/// Decode one shared-exponent record into linear RGB.
pub fn rgbe_to_rgb(rgbe: [u8; 4], gamma: f32) -> Vec3 {
    if rgbe[3] == 0 {
        return Vec3::ZERO;
    }
    let exponent = rgbe[3] as i32 - 128;
    let scale = (1.0 / 256.0) * (exponent as f32).exp2();
    Vec3::new(
        (scale * rgbe[0] as f32).powf(gamma),
        (scale * rgbe[1] as f32).powf(gamma),
        (scale * rgbe[2] as f32).powf(gamma),
    )
}

/// Encode linear RGB into a shared-exponent record.
pub fn rgb_to_rgbe(rgb: Vec3) -> [u8; 4] {
    let dominant = rgb.x.max(rgb.y).max(rgb.z);
    if dominant < 1e-32 {
        return [0; 4];
    }
    let (significand, exponent) = frexp(dominant);
    let scale = significand * 256.0 / dominant;
    [
        (rgb.x * scale) as u8,
        (rgb.y * scale) as u8,
        (rgb.z * scale) as u8,
        (exponent + 128) as u8,
    ]
}

/// Split a positive normal float into (significand in [0.5, 1), exponent).
///
/// The encoder filters out near-zero values before calling this, so the
/// subnormal and non-finite cases never reach it.
fn frexp(x: f32) -> (f32, i32) {
    let bits = x.to_bits();
    let exponent = ((bits >> 23) & 0xff) as i32 - 126;
    let significand = f32::from_bits((bits & 0x807f_ffff) | (126 << 23));
    (significand, exponent)
}

fn is_rle_marker(record: [u8; 4]) -> bool {
    record[0] == 2 && record[1] == 2 && record[2] & 0x80 == 0
}

/// Read one header line, without the trailing newline. `None` at EOF.
fn read_header_line<R: BufRead>(reader: &mut R) -> HdrResult<Option<String>> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn parse_resolution(line: &str) -> HdrResult<(usize, usize)> {
    let mut tokens = line.split_whitespace();
    let bad = || HdrError::BadResolution(line.to_string());

    if tokens.next() != Some("-Y") {
        return Err(bad());
    }
    let height: usize = tokens.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    if tokens.next() != Some("+X") {
        return Err(bad());
    }
    let width: usize = tokens.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;

    if width == 0 || height == 0 {
        return Err(bad());
    }
    Ok((width, height))
}

fn read_record<R: Read>(reader: &mut R) -> HdrResult<[u8; 4]> {
    let mut record = [0u8; 4];
    read_exact(reader, &mut record)?;
    Ok(record)
}

/// Decode one RLE channel plane into the given component of each record.
fn read_rle_channel<R: Read>(
    reader: &mut R,
    planes: &mut [[u8; 4]],
    channel: usize,
) -> HdrResult<()> {
    let mut i = 0;
    while i < planes.len() {
        let code = read_byte(reader)?;
        if code > 128 {
            // Run: repeat the next byte
            let count = (code & 0x7f) as usize;
            if i + count > planes.len() {
                return Err(HdrError::BadRle);
            }
            let value = read_byte(reader)?;
            for _ in 0..count {
                planes[i][channel] = value;
                i += 1;
            }
        } else {
            // Literal: copy the next `code` bytes
            let count = code as usize;
            if i + count > planes.len() {
                return Err(HdrError::BadRle);
            }
            for _ in 0..count {
                planes[i][channel] = read_byte(reader)?;
                i += 1;
            }
        }
    }
    Ok(())
}

fn read_byte<R: Read>(reader: &mut R) -> HdrResult<u8> {
    let mut byte = [0u8; 1];
    read_exact(reader, &mut byte)?;
    Ok(byte[0])
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> HdrResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            HdrError::Truncated
        } else {
            HdrError::Io(e)
        }
    })
}
