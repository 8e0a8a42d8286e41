//! Fixed little-endian wire encoding for 32- and 64-bit integers.
//!
//! Byte `i` carries bits `[8i, 8i + 8)` of the value. The shifts below
//! work on the integer value, so the output is the same on every host.

use std::sync::OnceLock;

/// Packs `value` into `out`, least-significant byte first.
pub fn pack32(value: u32, out: &mut [u8; 4]) {
	for (i, byte) in out.iter_mut().enumerate() {
		*byte = (value >> (i * 8)) as u8;
	}
}

/// Inverse of [`pack32`].
pub fn unpack32(packed: &[u8; 4]) -> u32 {
	packed
		.iter()
		.enumerate()
		.fold(0, |acc, (i, &byte)| acc | (u32::from(byte) << (i * 8)))
}

/// Packs `value` into `out`, least-significant byte first.
pub fn pack64(value: u64, out: &mut [u8; 8]) {
	for (i, byte) in out.iter_mut().enumerate() {
		*byte = (value >> (i * 8)) as u8;
	}
}

/// Inverse of [`pack64`].
pub fn unpack64(packed: &[u8; 8]) -> u64 {
	packed
		.iter()
		.enumerate()
		.fold(0, |acc, (i, &byte)| acc | (u64::from(byte) << (i * 8)))
}

/// Packs into the first 4 bytes of `out`. Returns `None` if it is shorter.
pub fn pack32_into(value: u32, out: &mut [u8]) -> Option<()> {
	let head: &mut [u8; 4] = out.get_mut(..4)?.try_into().ok()?;
	pack32(value, head);
	Some(())
}

/// Packs into the first 8 bytes of `out`. Returns `None` if it is shorter.
pub fn pack64_into(value: u64, out: &mut [u8]) -> Option<()> {
	let head: &mut [u8; 8] = out.get_mut(..8)?.try_into().ok()?;
	pack64(value, head);
	Some(())
}

/// Reads a value from the first 4 bytes of `packed`.
pub fn unpack32_from(packed: &[u8]) -> Option<u32> {
	let head: &[u8; 4] = packed.get(..4)?.try_into().ok()?;
	Some(unpack32(head))
}

/// Reads a value from the first 8 bytes of `packed`.
pub fn unpack64_from(packed: &[u8]) -> Option<u64> {
	let head: &[u8; 8] = packed.get(..8)?.try_into().ok()?;
	Some(unpack64(head))
}

/// Reports whether the host stores integers most-significant byte first.
///
/// Computed once per process. The codec never consults it.
pub fn is_big_endian() -> bool {
	static BIG_ENDIAN: OnceLock<bool> = OnceLock::new();
	*BIG_ENDIAN.get_or_init(|| 1u32.to_ne_bytes()[0] == 0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use test_case::test_case;

	#[test_case(1, [1, 0, 0, 0]; "one")]
	#[test_case(0x0403_0201, [1, 2, 3, 4]; "ascending")]
	#[test_case(u32::MAX, [0xff; 4]; "max")]
	fn pack32_layout(value: u32, expected: [u8; 4]) {
		let mut out = [0u8; 4];
		pack32(value, &mut out);
		assert_eq!(out, expected);
		assert_eq!(out, value.to_le_bytes());
		assert_eq!(unpack32(&out), value);
	}

	#[test_case(256, [0, 1, 0, 0, 0, 0, 0, 0]; "two_fifty_six")]
	#[test_case(0x0807_0605_0403_0201, [1, 2, 3, 4, 5, 6, 7, 8]; "ascending")]
	#[test_case(1 << 63, [0, 0, 0, 0, 0, 0, 0, 0x80]; "top_bit")]
	fn pack64_layout(value: u64, expected: [u8; 8]) {
		let mut out = [0u8; 8];
		pack64(value, &mut out);
		assert_eq!(out, expected);
		assert_eq!(unpack64(&out), value);
	}

	#[test]
	fn high_bytes_do_not_sign_extend() {
		assert_eq!(unpack32(&[0x80, 0xff, 0x00, 0x00]), 0xff80);
		assert_eq!(unpack64(&[0xff, 0, 0, 0, 0, 0, 0, 0]), 0xff);
	}

	#[test]
	fn round_trip_spread() {
		let mut x: u64 = 0x9e37_79b9_7f4a_7c15;
		for _ in 0..1000 {
			x ^= x << 13;
			x ^= x >> 7;
			x ^= x << 17;
			let mut b8 = [0u8; 8];
			pack64(x, &mut b8);
			assert_eq!(unpack64(&b8), x);

			let v = x as u32;
			let mut b4 = [0u8; 4];
			pack32(v, &mut b4);
			assert_eq!(unpack32(&b4), v);
		}
	}

	#[test]
	fn slice_helpers() {
		let mut buf = [0u8; 12];
		pack32_into(7, &mut buf).unwrap();
		pack64_into(9, &mut buf[4..]).unwrap();
		assert_eq!(unpack32_from(&buf), Some(7));
		assert_eq!(unpack64_from(&buf[4..]), Some(9));

		assert_eq!(pack32_into(1, &mut [0u8; 3]), None);
		assert_eq!(unpack64_from(&buf[5..]), None);
	}

	#[test]
	fn endianness_matches_target() {
		assert_eq!(is_big_endian(), cfg!(target_endian = "big"));
		assert_eq!(is_big_endian(), is_big_endian());
	}
}
