use core::fmt::{Debug, Write};

use crate::error::{PngError, PngResult};

/// The chunk type tag: four bytes that are supposed to be ASCII.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RawChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
#[allow(missing_docs)]
impl RawChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const tRNS: Self = Self(*b"tRNS");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
}
impl Debug for RawChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char(self.0[0] as char)?;
    f.write_char(self.0[1] as char)?;
    f.write_char(self.0[2] as char)?;
    f.write_char(self.0[3] as char)?;
    Ok(())
  }
}

/// An unparsed chunk from a PNG.
///
/// The trailing CRC field of each chunk is skipped during iteration and never
/// recorded: the decoder trusts its input, because a small panel showing a
/// garbled image is no worse than a small panel showing nothing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'b> {
  /// The chunk's type tag.
  pub ty: RawChunkType,
  /// The chunk's payload bytes.
  pub data: &'b [u8],
}
impl Debug for RawChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .finish()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// Iteration ends cleanly when a chunk header or payload would run past the
/// end of the input, so feeding this truncated or garbage data (with a valid
/// signature pasted on the front) gives you fewer chunks, never a panic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct RawChunkIter<'b>(&'b [u8]);
impl<'b> RawChunkIter<'b> {
  /// Makes an iterator over a PNG's chunks.
  ///
  /// ## Failure
  /// * If the input doesn't start with the 8-byte PNG signature you get
  ///   `BytesAreNotPng` instead of an iterator.
  #[inline]
  pub const fn new(png: &'b [u8]) -> PngResult<Self> {
    match png {
      [137, 80, 78, 71, 13, 10, 26, 10, rest @ ..] => Ok(Self(rest)),
      _ => Err(PngError::BytesAreNotPng),
    }
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = RawChunk<'b>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    let len: usize = if self.0.len() >= 4 {
      let (len_bytes, rest) = self.0.split_at(4);
      self.0 = rest;
      u32::from_be_bytes(len_bytes.try_into().unwrap()) as usize
    } else {
      return None;
    };
    let ty: RawChunkType = if self.0.len() >= 4 {
      let (ty_bytes, rest) = self.0.split_at(4);
      self.0 = rest;
      RawChunkType(ty_bytes.try_into().unwrap())
    } else {
      return None;
    };
    let data: &'b [u8] = if self.0.len() >= len {
      let (data, rest) = self.0.split_at(len);
      self.0 = rest;
      data
    } else {
      return None;
    };
    if self.0.len() >= 4 {
      // the declared CRC, which nothing wants
      self.0 = &self.0[4..];
    } else {
      return None;
    }
    Some(RawChunk { ty, data })
  }
}

/// Everything the scanning pass collects before decoding starts: the palette,
/// the palette transparency, and where each piece of the image data lives.
#[cfg(feature = "alloc")]
pub(crate) struct ChunkIndex<'b> {
  pub palette: [[u8; 3]; 256],
  pub alphas: [u8; 256],
  pub idat: alloc::vec::Vec<&'b [u8]>,
}
#[cfg(feature = "alloc")]
impl<'b> ChunkIndex<'b> {
  /// Walks the chunk sequence once and records the side data.
  ///
  /// * `PLTE` entries land in `palette`, silently truncated past 256.
  ///   Unfilled entries stay black, so an out-of-range pixel index reads as
  ///   black rather than anything worse.
  /// * `tRNS` is only meaningful for indexed color, and only the first 256
  ///   bytes; alphas past the chunk's length stay 255 (opaque).
  /// * Each `IDAT` payload is pushed onto an ordered list. The list is
  ///   unbounded; encoders that emit thousands of tiny `IDAT`s just cost a
  ///   few pointers each.
  /// * `IEND` stops the walk.
  ///
  /// ## Failure
  /// * `BytesAreNotPng` for a bad signature.
  /// * `IdatNotFound` when the walk ends with an empty `IDAT` list.
  pub fn scan(png: &'b [u8], indexed: bool) -> PngResult<Self> {
    let mut palette = [[0_u8; 3]; 256];
    let mut alphas = [0xFF_u8; 256];
    let mut idat = alloc::vec::Vec::new();
    for chunk in RawChunkIter::new(png)? {
      match chunk.ty {
        RawChunkType::PLTE => {
          let whole_triples = chunk.data.len() - (chunk.data.len() % 3);
          let triples: &[[u8; 3]] = bytemuck::cast_slice(&chunk.data[..whole_triples]);
          for (slot, rgb) in palette.iter_mut().zip(triples) {
            *slot = *rgb;
          }
        }
        RawChunkType::tRNS if indexed => {
          for (slot, a) in alphas.iter_mut().zip(chunk.data) {
            *slot = *a;
          }
        }
        RawChunkType::IDAT => idat.push(chunk.data),
        RawChunkType::IEND => break,
        _ => (),
      }
    }
    if idat.is_empty() {
      return Err(PngError::IdatNotFound);
    }
    Ok(Self { palette, alphas, idat })
  }
}

#[test]
fn test_raw_chunk_iter_stops_at_short_input() {
  // signature followed by a chunk header that promises more data than exists
  let bytes = [
    137, 80, 78, 71, 13, 10, 26, 10, // signature
    0, 0, 0, 99, b'I', b'D', b'A', b'T', 1, 2, 3,
  ];
  let mut it = RawChunkIter::new(&bytes).unwrap();
  assert!(it.next().is_none());
}

#[test]
fn test_raw_chunk_iter_rejects_bad_signature() {
  assert_eq!(RawChunkIter::new(b"GIF89a").unwrap_err(), PngError::BytesAreNotPng);
  assert_eq!(RawChunkIter::new(&[]).unwrap_err(), PngError::BytesAreNotPng);
}
