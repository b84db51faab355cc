use crate::{
  chunk::{RawChunk, RawChunkIter, RawChunkType},
  error::{PngError, PngResult},
};

/// The dimensions of a PNG, as probed by [`info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
  /// Width in pixels.
  pub width: u32,
  /// Height in pixels.
  pub height: u32,
}

/// Reads a PNG's dimensions without decoding anything.
///
/// This checks the signature and that the file leads with a well-formed
/// `IHDR`, then reads the two big-endian dimension fields. It deliberately
/// does *not* check whether the rest of the header describes an image this
/// crate can decode, so `info` can succeed where [`decode`](crate::decode)
/// would fail (an interlaced image, say).
///
/// ## Failure
/// * `BytesAreNotPng` / `IhdrIllegal` when even that much is wrong.
pub fn info(png: &[u8]) -> PngResult<Info> {
  let ihdr = first_chunk_as_ihdr(png)?;
  Ok(Info {
    width: u32::from_be_bytes(ihdr[0..4].try_into().unwrap()),
    height: u32::from_be_bytes(ihdr[4..8].try_into().unwrap()),
  })
}

fn first_chunk_as_ihdr(png: &[u8]) -> PngResult<&[u8]> {
  match RawChunkIter::new(png)?.next() {
    Some(RawChunk { ty: RawChunkType::IHDR, data }) if data.len() == 13 => Ok(data),
    _ => Err(PngError::IhdrIllegal),
  }
}

/// The pixel formats this decoder accepts.
///
/// This combines a color type with a bit depth per channel. The PNG formats
/// that pack several pixels into one byte (1/2/4-bit greyscale and indexed)
/// are not represented because the decoder rejects them outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PixelFormat {
  Y8,
  Y16,
  RGB8,
  RGB16,
  I8,
  YA8,
  YA16,
  RGBA8,
  RGBA16,
}
impl PixelFormat {
  /// Bytes per complete pixel.
  ///
  /// This is also the distance, in bytes, between a byte and its left
  /// neighbor during unfiltering.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self) -> usize {
    use PixelFormat::*;
    match self {
      Y8 | I8 => 1,
      Y16 | YA8 => 2,
      RGB8 => 3,
      YA16 | RGBA8 => 4,
      RGB16 => 6,
      RGBA16 => 8,
    }
  }

  /// Does this format look its pixels up in the palette?
  #[inline]
  #[must_use]
  pub const fn is_indexed(self) -> bool {
    matches!(self, Self::I8)
  }
}

/// A fully parsed and validated `IHDR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  /// Width in pixels, at least 1.
  pub width: u32,
  /// Height in pixels, at least 1.
  pub height: u32,
  /// Format of the pixels.
  pub format: PixelFormat,
}
impl Header {
  /// Parses the `IHDR` of the given PNG and checks every field against what
  /// this decoder supports.
  ///
  /// ## Failure
  /// * `BytesAreNotPng` / `IhdrIllegal` for a malformed prefix, or for
  ///   nonzero compression/filter method fields.
  /// * `InterlaceNotSupported` for Adam7 images.
  /// * `IllegalColorTypeBitDepthCombination` for sub-byte depths, unknown
  ///   color types, and 16-bit indexed color.
  /// * `IllegalWidthZero` / `IllegalHeightZero`.
  pub fn parse(png: &[u8]) -> PngResult<Self> {
    let data = first_chunk_as_ihdr(png)?;
    if data[10] != 0 || data[11] != 0 {
      return Err(PngError::IhdrIllegal);
    }
    if data[12] != 0 {
      return Err(PngError::InterlaceNotSupported);
    }
    let format = match (data[8], data[9]) {
      (8, 0) => PixelFormat::Y8,
      (16, 0) => PixelFormat::Y16,
      (8, 2) => PixelFormat::RGB8,
      (16, 2) => PixelFormat::RGB16,
      (8, 3) => PixelFormat::I8,
      (8, 4) => PixelFormat::YA8,
      (16, 4) => PixelFormat::YA16,
      (8, 6) => PixelFormat::RGBA8,
      (16, 6) => PixelFormat::RGBA16,
      _ => return Err(PngError::IllegalColorTypeBitDepthCombination),
    };
    let width = u32::from_be_bytes(data[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(data[4..8].try_into().unwrap());
    if width == 0 {
      return Err(PngError::IllegalWidthZero);
    }
    if height == 0 {
      return Err(PngError::IllegalHeightZero);
    }
    Ok(Self { width, height, format })
  }

  /// Bytes in one raw scanline, not counting the leading filter byte.
  ///
  /// ## Failure
  /// * `DimensionsTooLarge` if the multiply overflows `usize`. There is no
  ///   other width ceiling; wide images are limited only by what the
  ///   allocator will give [`Decoder::new`](crate::Decoder::new).
  #[inline]
  pub fn bytes_per_scanline(self) -> PngResult<usize> {
    (self.width as usize)
      .checked_mul(self.format.bytes_per_pixel())
      .ok_or(PngError::DimensionsTooLarge)
  }
}

#[test]
#[cfg(feature = "alloc")]
fn test_header_rejects_what_info_accepts() {
  // 2x2, 8-bit RGB, but interlaced: `info` reads the dimensions anyway,
  // `Header::parse` refuses.
  let mut png = alloc::vec::Vec::new();
  png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);
  png.extend_from_slice(&13_u32.to_be_bytes());
  png.extend_from_slice(b"IHDR");
  png.extend_from_slice(&2_u32.to_be_bytes());
  png.extend_from_slice(&2_u32.to_be_bytes());
  png.extend_from_slice(&[8, 2, 0, 0, 1]);
  png.extend_from_slice(&[0; 4]);
  assert_eq!(info(&png).unwrap(), Info { width: 2, height: 2 });
  assert_eq!(Header::parse(&png).unwrap_err(), PngError::InterlaceNotSupported);
}
