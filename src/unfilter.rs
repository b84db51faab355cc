use crate::error::{PngError, PngResult};

/// The Paeth predictor (PNG filter type 4).
///
/// Picks whichever of the left / up / upper-left neighbors is closest to
/// `a + b - c`. The PNG spec is emphatic that the three comparisons happen in
/// exactly this order, ties going to `a`, then `b`.
const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reconstructs one scanline in place.
///
/// `cur` holds the filtered bytes of the row being rebuilt, `prev` must be
/// the previous *reconstructed* row (all zeros above the first row), and
/// `bpp` is the filter distance in bytes. Every addition wraps mod 256, per
/// the PNG spec.
///
/// ## Failure
/// * `IllegalFilterType` for a filter byte outside 0 through 4.
pub(crate) fn unfilter_scanline(
  filter: u8, cur: &mut [u8], prev: &[u8], bpp: usize,
) -> PngResult<()> {
  match filter {
    0 => (), // None
    1 => {
      // Sub: the first `bpp` bytes have no left neighbor and stay as-is.
      for i in bpp..cur.len() {
        cur[i] = cur[i].wrapping_add(cur[i - bpp]);
      }
    }
    2 => {
      // Up
      for (p, b) in cur.iter_mut().zip(prev.iter().copied()) {
        *p = p.wrapping_add(b);
      }
    }
    3 => {
      // Average: the sum needs 9 bits before the halving.
      for i in 0..cur.len() {
        let a = if i >= bpp { cur[i - bpp] as u16 } else { 0 };
        let b = prev[i] as u16;
        cur[i] = cur[i].wrapping_add(((a + b) / 2) as u8);
      }
    }
    4 => {
      // Paeth
      for i in 0..cur.len() {
        let a = if i >= bpp { cur[i - bpp] } else { 0 };
        let b = prev[i];
        let c = if i >= bpp { prev[i - bpp] } else { 0 };
        cur[i] = cur[i].wrapping_add(paeth_predict(a, b, c));
      }
    }
    _ => return Err(PngError::IllegalFilterType),
  }
  Ok(())
}

#[test]
fn test_paeth_predict() {
  assert_eq!(paeth_predict(0, 0, 0), 0);
  assert_eq!(paeth_predict(10, 20, 10), 20);
  assert_eq!(paeth_predict(100, 50, 100), 50);
  assert_eq!(paeth_predict(200, 100, 50), 200);
  // p = 50 + 100 - 200 = -50, so `a` is nearest at distance 100
  assert_eq!(paeth_predict(50, 100, 200), 50);
}

#[test]
fn test_unfilter_sub_wraps() {
  let mut cur = [200, 200, 200];
  let prev = [0, 0, 0];
  unfilter_scanline(1, &mut cur, &prev, 1).unwrap();
  assert_eq!(cur, [200, 144, 88]);
}

#[test]
fn test_unfilter_average_uses_nine_bit_sum() {
  // a = 200 and b = 200 must average to 200, not to (144 / 2)
  let mut cur = [200, 0];
  let prev = [0, 200];
  unfilter_scanline(3, &mut cur, &prev, 1).unwrap();
  assert_eq!(cur, [200, 200]);
}

#[test]
fn test_unfilter_rejects_unknown_filter() {
  let mut cur = [0; 4];
  let prev = [0; 4];
  assert_eq!(unfilter_scanline(5, &mut cur, &prev, 1).unwrap_err(), PngError::IllegalFilterType);
}
