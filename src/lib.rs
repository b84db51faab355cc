#![no_std]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

//! A streaming PNG decoder that hands out finished RGB565 rows.
//!
//! * [Portable Network Graphics (PNG) Specification][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png/
//!
//! This crate targets small devices that hold a whole PNG file in memory but
//! can't afford a full decoded frame: the decoder inflates the image data
//! through a 32k sliding dictionary, reconstructs one scanline at a time, and
//! passes each finished row to a caller closure as RGB565 pixels ready for an
//! LCD panel. Peak working memory is the dictionary plus two scanlines plus
//! one output row (about 35k for moderate widths), regardless of image height.
//!
//! ## Library Design Assumptions
//!
//! * The entire PNG encoded source data stream is a single byte slice.
//! * Rows are consumed as they're produced. The row slice passed to the sink
//!   is reused for the next row, so copy out anything you want to keep.
//! * The display can't do anything useful about corrupt data anyway, so
//!   checksums (chunk CRCs and the zlib Adler-32) are never verified.
//!
//! ## Usage
//!
//! ```no_run
//! let png = std::fs::read("some.png").unwrap();
//! let info = png565::info(&png).unwrap();
//! let w = info.width as usize;
//! let mut frame = vec![0u16; w * info.height as usize];
//! png565::decode(&png, png565::Scale::Full, |y, row| {
//!   frame[y as usize * w..][..row.len()].copy_from_slice(row);
//! })
//! .unwrap();
//! ```
//!
//! Pass [`Scale::Half`] or [`Scale::Quarter`] to box-filter the image down by
//! 2 or 4 while it decodes; the averaging happens row by row, so the memory
//! story doesn't change.
//!
//! ## Format Support
//!
//! Non-interlaced PNGs with 8 or 16 bit channels, in all five color types
//! (greyscale, RGB, indexed, greyscale+alpha, RGBA). 16 bit channels are
//! truncated to their high byte. Adam7 interlacing and the packed sub-byte
//! depths (1/2/4-bit) are rejected. Alpha never reaches the sink because
//! RGB565 has nowhere to put it.

#[cfg(feature = "alloc")]
extern crate alloc;

mod chunk;
mod error;
mod header;
mod pixels;
mod unfilter;

pub use chunk::*;
pub use error::*;
pub use header::*;
pub use pixels::rgb565;

#[cfg(feature = "alloc")]
mod inflate;

#[cfg(feature = "alloc")]
mod decoder;
#[cfg(feature = "alloc")]
pub use decoder::*;
