/// An error from the `png565` crate.
///
/// Every fatal condition maps to its own variant, but callers that only care
/// about pass/fail can treat any `Err` as "the panel shows the old frame".
/// When `decode` fails partway through an image, rows already handed to the
/// sink stay handed out; there is no rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PngError {
  /// The input doesn't begin with the 8-byte PNG signature.
  BytesAreNotPng,

  /// The first chunk wasn't an `IHDR` with the layout the PNG spec requires.
  IhdrIllegal,

  /// The bit depth / color type pair isn't one this decoder handles.
  ///
  /// Supported pairs are 8 or 16 bit channels in any of the five color
  /// types, except that 16-bit indexed color doesn't exist. The packed
  /// sub-byte depths (1/2/4-bit) are rejected.
  IllegalColorTypeBitDepthCombination,

  /// Interlaced (Adam7) images aren't supported.
  InterlaceNotSupported,

  /// The `IHDR` declared a width of zero.
  IllegalWidthZero,

  /// The `IHDR` declared a height of zero.
  IllegalHeightZero,

  /// The scanline byte count overflowed `usize`.
  DimensionsTooLarge,

  /// The requested downscale factor wasn't 1, 2, or 4.
  IllegalScaleFactor,

  /// Downscaling would leave zero output columns or rows.
  OutputDimensionsZero,

  /// The file contains no `IDAT` chunk.
  IdatNotFound,

  /// The allocator couldn't give us enough space for the working buffers.
  #[cfg(feature = "alloc")]
  AllocationFailed,

  /// The zlib stream inside the `IDAT` data is malformed.
  IdatDecompressionFailed,

  /// The zlib stream ended before the last scanline was complete.
  UnexpectedEndOfImageData,

  /// A scanline declared a filter type other than 0 through 4.
  IllegalFilterType,
}

#[cfg(feature = "alloc")]
impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::AllocationFailed
  }
}

/// Alias for a `Result` with [`PngError`] as the error type.
pub type PngResult<T> = Result<T, PngError>;
