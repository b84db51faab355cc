//! Feeds the `IDAT` payloads through the zlib decompressor.

use alloc::{
  alloc::{alloc_zeroed, Layout},
  boxed::Box,
  vec::Vec,
};

use miniz_oxide::inflate::{
  core::{
    decompress,
    inflate_flags::{
      TINFL_FLAG_HAS_MORE_INPUT, TINFL_FLAG_IGNORE_ADLER32, TINFL_FLAG_PARSE_ZLIB_HEADER,
    },
    DecompressorOxide,
  },
  TINFLStatus,
};

use crate::error::{PngError, PngResult};

/// Size of the sliding dictionary the decompressed stream passes through.
pub(crate) const DICT_SIZE: usize = miniz_oxide::inflate::core::TINFL_LZ_DICT_SIZE;

/// Presents an ordered list of `IDAT` payloads as one continuous zlib
/// stream.
///
/// A single decompressor instance spans every `IDAT`; chunk boundaries fall
/// wherever the encoder felt like flushing and carry no meaning for the
/// DEFLATE stream inside. Output goes into a caller-owned dictionary buffer
/// of exactly [`DICT_SIZE`] bytes, used as a circular window: each step
/// writes a contiguous span starting at the caller's write offset, and the
/// caller wraps the offset back to zero when it reaches the end.
pub(crate) struct IdatStream<'b> {
  chunks: Vec<&'b [u8]>,
  ci: usize,
  in_ofs: usize,
  decomp: Box<DecompressorOxide>,
}
impl<'b> IdatStream<'b> {
  /// Wraps the `IDAT` list. `chunks` must be non-empty.
  ///
  /// ## Failure
  /// * `AllocationFailed` if there's no room for the decompressor state
  ///   (a bit over 10k).
  pub fn new(chunks: Vec<&'b [u8]>) -> PngResult<Self> {
    // The decompressor state is ~11k and must never transit the stack of a
    // small target, so it gets built directly on the heap. All-zero bytes
    // are its initial state.
    let layout = Layout::new::<DecompressorOxide>();
    let ptr = unsafe { alloc_zeroed(layout) };
    if ptr.is_null() {
      return Err(PngError::AllocationFailed);
    }
    let mut decomp = unsafe { Box::from_raw(ptr.cast::<DecompressorOxide>()) };
    decomp.init();
    Ok(Self { chunks, ci: 0, in_ofs: 0, decomp })
  }

  /// Runs one decompression step, writing into `dict` at `dict_ofs`.
  ///
  /// Returns the count of new bytes (always a contiguous span at
  /// `dict[dict_ofs..]`, never wrapping within one step) and whether the
  /// zlib stream has ended. The caller advances
  /// `dict_ofs = (dict_ofs + produced) % DICT_SIZE` before the next step.
  ///
  /// ## Failure
  /// * `UnexpectedEndOfImageData` when the stream wants input that no
  ///   remaining `IDAT` can supply.
  /// * `IdatDecompressionFailed` for a malformed stream, or if no forward
  ///   progress of any kind was possible.
  pub fn step(&mut self, dict: &mut [u8], dict_ofs: usize) -> PngResult<(usize, bool)> {
    let cur = self.chunks[self.ci];
    let has_more = self.in_ofs < cur.len() || self.ci + 1 < self.chunks.len();
    let flags = TINFL_FLAG_PARSE_ZLIB_HEADER
      | TINFL_FLAG_IGNORE_ADLER32
      | if has_more { TINFL_FLAG_HAS_MORE_INPUT } else { 0 };
    let (status, consumed, produced) =
      decompress(&mut self.decomp, &cur[self.in_ofs..], dict, dict_ofs, flags);
    self.in_ofs += consumed;
    let mut advanced = consumed > 0 || produced > 0;
    if self.in_ofs == cur.len() && self.ci + 1 < self.chunks.len() {
      self.ci += 1;
      self.in_ofs = 0;
      advanced = true;
    }
    match status {
      TINFLStatus::Done => Ok((produced, true)),
      // the stream wants bytes that no remaining IDAT can supply; miniz
      // reports this as FailedCannotMakeProgress once the has-more-input
      // flag goes away
      TINFLStatus::FailedCannotMakeProgress => Err(PngError::UnexpectedEndOfImageData),
      TINFLStatus::NeedsMoreInput if !has_more => Err(PngError::UnexpectedEndOfImageData),
      TINFLStatus::NeedsMoreInput | TINFLStatus::HasMoreOutput if advanced => {
        Ok((produced, false))
      }
      TINFLStatus::NeedsMoreInput | TINFLStatus::HasMoreOutput => {
        // the stream made no progress at all and never will
        Err(PngError::IdatDecompressionFailed)
      }
      _ => Err(PngError::IdatDecompressionFailed),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_idat_stream_decompresses_across_chunk_splits() {
    let raw = [7_u8; 100];
    let z = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
    // hand the stream over one byte at a time
    let chunks: Vec<&[u8]> = z.chunks(1).collect();
    let mut stream = IdatStream::new(chunks).unwrap();
    let mut dict = alloc::vec![0_u8; DICT_SIZE];
    let mut dict_ofs = 0;
    let mut out = Vec::new();
    loop {
      let (produced, done) = stream.step(&mut dict, dict_ofs).unwrap();
      out.extend_from_slice(&dict[dict_ofs..dict_ofs + produced]);
      dict_ofs = (dict_ofs + produced) % DICT_SIZE;
      if done {
        break;
      }
    }
    assert_eq!(out, raw);
  }

  #[test]
  fn test_idat_stream_reports_truncation() {
    let z = miniz_oxide::deflate::compress_to_vec_zlib(&[7_u8; 100], 6);
    let short = &z[..z.len() - 4];
    let mut stream = IdatStream::new(alloc::vec![short]).unwrap();
    let mut dict = alloc::vec![0_u8; DICT_SIZE];
    let mut dict_ofs = 0;
    let err = loop {
      match stream.step(&mut dict, dict_ofs) {
        Ok((produced, false)) => dict_ofs = (dict_ofs + produced) % DICT_SIZE,
        Ok((_, true)) => panic!("truncated stream finished cleanly"),
        Err(e) => break e,
      }
    };
    assert_eq!(err, PngError::UnexpectedEndOfImageData);
  }
}
