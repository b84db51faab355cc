//! The streaming decode loop and its working buffers.

use alloc::vec::Vec;

use crate::{
  chunk::ChunkIndex,
  error::{PngError, PngResult},
  header::Header,
  inflate::{IdatStream, DICT_SIZE},
  pixels::{pixel_rgb, rgb565},
  unfilter::unfilter_scanline,
};

/// Integer downscale factor applied while rows are emitted.
///
/// Downscaling is a box filter: every input pixel of a `factor × factor`
/// block contributes equally, and the averaged row is emitted once the last
/// input row of the block has been decoded. Trailing input rows and columns
/// that don't fill a whole block are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scale {
  /// Emit every pixel.
  #[default]
  Full,
  /// Average 2×2 blocks.
  Half,
  /// Average 4×4 blocks.
  Quarter,
}
impl Scale {
  /// The box edge length: 1, 2, or 4.
  #[inline]
  #[must_use]
  pub const fn factor(self) -> u32 {
    match self {
      Self::Full => 1,
      Self::Half => 2,
      Self::Quarter => 4,
    }
  }
}
impl TryFrom<u32> for Scale {
  type Error = PngError;
  /// Accepts 1, 2, or 4; anything else is `IllegalScaleFactor`.
  #[inline]
  fn try_from(factor: u32) -> PngResult<Self> {
    match factor {
      1 => Ok(Self::Full),
      2 => Ok(Self::Half),
      4 => Ok(Self::Quarter),
      _ => Err(PngError::IllegalScaleFactor),
    }
  }
}

/// A single-use streaming PNG decoder.
///
/// The constructor validates the header, indexes the chunks, and makes every
/// allocation the decode will need: two scanline buffers, the 32k inflate
/// dictionary, one RGB565 output row, and (when downscaling) a row of
/// per-channel sums. [`run`](Self::run) then drives chunk data through
/// inflation, unfiltering, and pixel conversion in lockstep, handing each
/// finished row to the sink. Nothing is retained between decodes; drop the
/// decoder when `run` returns.
pub struct Decoder<'b> {
  header: Header,
  palette: [[u8; 3]; 256],
  alphas: [u8; 256],
  scale: Scale,
  out_w: u32,
  out_h: u32,
  bpp: usize,
  stride: usize,
  inflate: IdatStream<'b>,
  cur: Vec<u8>,
  prev: Vec<u8>,
  dict: Vec<u8>,
  out: Vec<u16>,
  acc: Vec<u16>,
}
impl core::fmt::Debug for Decoder<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Decoder")
      .field("header", &self.header)
      .field("scale", &self.scale)
      .field("out_w", &self.out_w)
      .field("out_h", &self.out_h)
      .finish_non_exhaustive()
  }
}
impl<'b> Decoder<'b> {
  /// Validates the image and gets every working buffer allocated.
  ///
  /// ## Failure
  /// * Anything [`Header::parse`] rejects.
  /// * `OutputDimensionsZero` when downscaling an image smaller than one
  ///   block.
  /// * `IdatNotFound` for an image with no `IDAT` chunks.
  /// * `AllocationFailed` when any buffer can't be allocated; partial
  ///   allocations are released on the way out.
  pub fn new(png: &'b [u8], scale: Scale) -> PngResult<Self> {
    let header = Header::parse(png)?;
    let factor = scale.factor();
    let out_w = header.width / factor;
    let out_h = header.height / factor;
    if out_w == 0 || out_h == 0 {
      return Err(PngError::OutputDimensionsZero);
    }
    let stride = header.bytes_per_scanline()?;
    let bpp = header.format.bytes_per_pixel();
    let index = ChunkIndex::scan(png, header.format.is_indexed())?;
    let inflate = IdatStream::new(index.idat)?;
    let acc_len = if factor > 1 { out_w as usize * 3 } else { 0 };
    Ok(Self {
      header,
      palette: index.palette,
      alphas: index.alphas,
      scale,
      out_w,
      out_h,
      bpp,
      stride,
      inflate,
      cur: try_zeroed(stride)?,
      prev: try_zeroed(stride)?,
      dict: try_zeroed(DICT_SIZE)?,
      out: try_zeroed(out_w as usize)?,
      acc: try_zeroed(acc_len)?,
    })
  }

  /// The validated image header.
  #[inline]
  #[must_use]
  pub const fn header(&self) -> Header {
    self.header
  }

  /// Width of the rows the sink will receive.
  #[inline]
  #[must_use]
  pub const fn output_width(&self) -> u32 {
    self.out_w
  }

  /// How many rows the sink will receive.
  #[inline]
  #[must_use]
  pub const fn output_height(&self) -> u32 {
    self.out_h
  }

  /// Alpha of palette entry `i`, from the `tRNS` chunk (255 when absent).
  ///
  /// The decoder itself emits opaque RGB565 and never applies these; they're
  /// here for callers that do their own color keying.
  #[inline]
  #[must_use]
  pub const fn palette_alpha(&self, i: u8) -> u8 {
    self.alphas[i as usize]
  }

  /// Decodes the image, handing each finished RGB565 row to `sink`.
  ///
  /// The sink is called once per output row, in order from row 0 with no
  /// gaps, on the calling thread. The row slice is only valid for the
  /// duration of the call; the same buffer is reused for the next row.
  ///
  /// ## Failure
  /// * `UnexpectedEndOfImageData` when the zlib stream runs out before the
  ///   last scanline.
  /// * `IdatDecompressionFailed` / `IllegalFilterType` for corrupt data.
  /// * Rows emitted before the error stay emitted.
  pub fn run<F: FnMut(u32, &[u16])>(&mut self, mut sink: F) -> PngResult<()> {
    let Self {
      header, palette, scale, out_w, out_h, bpp, stride, inflate, cur, prev, dict, out, acc, ..
    } = self;
    let height = header.height;
    let format = header.format;
    let factor = scale.factor();
    log::debug!(
      "png565: {}x{} {:?} -> {} rows of {}",
      header.width,
      height,
      format,
      out_h,
      out_w
    );

    let mut dict_ofs: usize = 0;
    // 0 = the filter byte is next; otherwise `sl_pos - 1` bytes of the
    // current scanline have been gathered
    let mut sl_pos: usize = 0;
    let mut filter: u8 = 0;
    let mut y: u32 = 0;
    let mut out_y: u32 = 0;
    let mut stream_done = false;

    while y < height {
      if stream_done {
        return Err(PngError::UnexpectedEndOfImageData);
      }
      let (produced, done) = inflate.step(dict, dict_ofs)?;
      stream_done = done;
      let mut span: &[u8] = &dict[dict_ofs..dict_ofs + produced];
      dict_ofs = (dict_ofs + produced) % DICT_SIZE;

      while !span.is_empty() && y < height {
        if sl_pos == 0 {
          filter = span[0];
          span = &span[1..];
          sl_pos = 1;
          continue;
        }
        let have = sl_pos - 1;
        let take = span.len().min(*stride - have);
        cur[have..have + take].copy_from_slice(&span[..take]);
        span = &span[take..];
        sl_pos += take;
        if sl_pos < *stride + 1 {
          continue;
        }

        // scanline complete
        unfilter_scanline(filter, cur, prev, *bpp)?;

        if factor == 1 {
          for (x, px) in out.iter_mut().enumerate() {
            let [r, g, b] = pixel_rgb(cur, x, format, palette);
            *px = rgb565(r, g, b);
          }
          sink(y, out.as_slice());
        } else if y < *out_h * factor {
          // fold this row's contribution into the running block sums
          for x in 0..(*out_w * factor) as usize {
            let [r, g, b] = pixel_rgb(cur, x, format, palette);
            let slot = (x / factor as usize) * 3;
            acc[slot] += r as u16;
            acc[slot + 1] += g as u16;
            acc[slot + 2] += b as u16;
          }
          if y % factor == factor - 1 {
            let div = (factor * factor) as u16;
            for (px, sums) in out.iter_mut().zip(acc.chunks_exact(3)) {
              *px = rgb565((sums[0] / div) as u8, (sums[1] / div) as u8, (sums[2] / div) as u8);
            }
            sink(out_y, out.as_slice());
            out_y += 1;
            acc.fill(0);
          }
        }

        core::mem::swap(cur, prev);
        cur.fill(0);
        y += 1;
        sl_pos = 0;
      }

      if y == height && !span.is_empty() {
        log::warn!("png565: {} stray bytes after the last scanline", span.len());
      }
    }
    Ok(())
  }
}

/// Decodes a PNG, handing each finished RGB565 row to `sink`.
///
/// One-shot wrapper: validate, allocate, decode, free. See [`Decoder`] for
/// the buffer story and [`Decoder::run`] for the sink contract.
///
/// ```no_run
/// # let png: Vec<u8> = vec![];
/// png565::decode(&png, png565::Scale::Half, |y, row| {
///   // push `row` to the panel at line `y`
///   let _ = (y, row);
/// })
/// .unwrap();
/// ```
pub fn decode<F: FnMut(u32, &[u16])>(png: &[u8], scale: Scale, sink: F) -> PngResult<()> {
  Decoder::new(png, scale)?.run(sink)
}

/// Fallibly allocates a zeroed buffer; the standard library has no one-step
/// way to do this, so reserve then resize.
fn try_zeroed<T: Clone + Default>(len: usize) -> PngResult<Vec<T>> {
  let mut v = Vec::new();
  v.try_reserve_exact(len)?;
  v.resize(len, T::default());
  Ok(v)
}
