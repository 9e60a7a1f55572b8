pub mod cursor;

#[cfg(feature = "io_ext")]
pub mod io_ext;

pub mod scene;

/// Converts a 4-byte string into a 32-bit little endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! rtag4 {
	($b4: literal) => {
		u32::from_le_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Converts a 4-byte string into a 32-bit big endian integer.
/// Byte strings longer than 4 bytes are truncated.
#[macro_export]
macro_rules! tag4 {
	($b4: literal) => {
		u32::from_be_bytes([$b4[0], $b4[1], $b4[2], $b4[3]])
	}
}

/// Renders a little endian four-character code, escaping anything unprintable
pub fn rtag4_str(tag: u32) -> String {
	tag.to_le_bytes()
		.iter()
		.flat_map(|b| std::ascii::escape_default(*b))
		.map(char::from)
		.collect()
}

#[cfg(test)]
mod tests {
	#[test]
	fn test_tags() {
		assert_eq!(0x20594850, rtag4!(b"PHY "));
		assert_eq!(0x50485920, tag4!(b"PHY "));
		assert_eq!("PHYS", super::rtag4_str(rtag4!(b"PHYS")));
		assert_eq!("\\x00\\x01AB", super::rtag4_str(u32::from_le_bytes([0, 1, b'A', b'B'])));
	}
}
