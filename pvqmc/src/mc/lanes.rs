//! Portable eight-lane integer vectors.
//!
//! The lane kernels are written against these types the way a SIMD kernel is
//! written against 128-bit registers: 16-bit lanes wrap on overflow, packs
//! saturate and products that need the headroom widen to 32-bit lanes.

use std::ops::{Add, Mul, Shr};

use super::PlaneRef;

pub const LANES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I16x8(pub [i16; LANES]);

impl I16x8 {
    pub const ZERO: Self = Self([0; LANES]);

    #[inline]
    pub fn splat(v: i16) -> Self {
        Self([v; LANES])
    }

    #[inline]
    pub fn load_u8(src: &PlaneRef<'_>, x: i32, y: i32, lanes: usize) -> Self {
        if lanes == 0 {
            return Self::ZERO;
        }
        Self::from_u8(src.row(x, y, lanes))
    }

    #[inline]
    pub fn from_u8(s: &[u8]) -> Self {
        let mut v = [0i16; LANES];
        for (lane, &p) in v.iter_mut().zip(s) {
            *lane = p as i16;
        }
        Self(v)
    }

    #[inline]
    pub fn from_slice(s: &[i16]) -> Self {
        let mut v = [0i16; LANES];
        let n = s.len().min(LANES);
        v[..n].copy_from_slice(&s[..n]);
        Self(v)
    }

    #[inline]
    pub fn widen(self) -> I32x8 {
        I32x8(self.0.map(i32::from))
    }

    #[inline]
    pub fn pack_u8(self) -> [u8; LANES] {
        self.0.map(|v| v.clamp(0, 255) as u8)
    }
}

impl Add for I16x8 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut v = self.0;
        for (a, &b) in v.iter_mut().zip(rhs.0.iter()) {
            *a = a.wrapping_add(b);
        }
        Self(v)
    }
}

impl Mul for I16x8 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut v = self.0;
        for (a, &b) in v.iter_mut().zip(rhs.0.iter()) {
            *a = a.wrapping_mul(b);
        }
        Self(v)
    }
}

impl Shr<u32> for I16x8 {
    type Output = Self;

    #[inline]
    fn shr(self, n: u32) -> Self {
        Self(self.0.map(|v| v >> n))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I32x8(pub [i32; LANES]);

impl I32x8 {
    pub const ZERO: Self = Self([0; LANES]);

    #[inline]
    pub fn splat(v: i32) -> Self {
        Self([v; LANES])
    }

    #[inline]
    pub fn pack_i16(self) -> I16x8 {
        I16x8(self.0.map(|v| v.clamp(i16::MIN as i32, i16::MAX as i32) as i16))
    }
}

impl Add for I32x8 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut v = self.0;
        for (a, &b) in v.iter_mut().zip(rhs.0.iter()) {
            *a = a.wrapping_add(b);
        }
        Self(v)
    }
}

impl Mul for I32x8 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut v = self.0;
        for (a, &b) in v.iter_mut().zip(rhs.0.iter()) {
            *a = a.wrapping_mul(b);
        }
        Self(v)
    }
}

impl Shr<u32> for I32x8 {
    type Output = Self;

    #[inline]
    fn shr(self, n: u32) -> Self {
        Self(self.0.map(|v| v >> n))
    }
}

#[inline]
pub fn store_u8(dst: &mut [u8], offset: usize, v: [u8; LANES], lanes: usize) {
    dst[offset..offset + lanes].copy_from_slice(&v[..lanes]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_bit_lanes_wrap() {
        let a = I16x8::splat(i16::MAX);
        assert_eq!((a + I16x8::splat(1)).0[0], i16::MIN);
        assert_eq!((I16x8::splat(300) * I16x8::splat(300)).0[3], (90000i32 as i16));
    }

    #[test]
    fn packs_saturate() {
        let v = I16x8([-5, 0, 128, 255, 256, 1000, -1000, 7]);
        assert_eq!(v.pack_u8(), [0, 0, 128, 255, 255, 255, 0, 7]);
        let w = I32x8([70000, -70000, 5, 0, 0, 0, 0, 0]).pack_i16();
        assert_eq!(&w.0[..3], &[i16::MAX, i16::MIN, 5]);
    }

    #[test]
    fn widened_products_do_not_wrap() {
        let a = I16x8::splat(255).widen() * I32x8::splat(128 * 111);
        assert_eq!(a.0[7], 255 * 128 * 111);
    }

    #[test]
    fn arithmetic_shift_floors() {
        assert_eq!((I16x8::splat(-1) >> 7).0[0], -1);
        assert_eq!((I32x8::splat(-8193) >> 14).0[0], -1);
    }

    #[test]
    fn partial_loads_zero_fill() {
        let data: Vec<u8> = (0..16).collect();
        let plane = PlaneRef::new(&data, 16, 0, 0);
        let v = I16x8::load_u8(&plane, 2, 0, 3);
        assert_eq!(v.0, [2, 3, 4, 0, 0, 0, 0, 0]);
        assert_eq!(I16x8::from_slice(&[1, 2]).0, [1, 2, 0, 0, 0, 0, 0, 0]);
        assert_eq!(I16x8::from_u8(&[9; 12]).0, [9; 8]);
    }
}
