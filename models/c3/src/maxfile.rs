use rgk_core::{
	cursor::ByteCursor,
	rtag4,
	rtag4_str
};

use crate::import::C3ImportError;

pub static MAGIC: &[u8; 10] = b"MAXFILE C3";
/// Magic plus reserved padding (usually a version string such as `" 00001"`)
pub const HEADER_SIZE: usize = 16;
/// Tag and declared size preceding every chunk payload
pub const CHUNK_HEADER_SIZE: usize = 8;

pub const PHY: u32 = rtag4!(b"PHY ");
pub const PHYS: u32 = rtag4!(b"PHYS");
pub const PHY4: u32 = rtag4!(b"PHY4");
pub const MOTI: u32 = rtag4!(b"MOTI");
pub const MOTN: u32 = rtag4!(b"MOTN");
pub const PTCL: u32 = rtag4!(b"PTCL");
pub const MAXF: u32 = rtag4!(b"MAXF");

/// Cheap check for callers sorting buffers before handing them to the decoder
pub fn is_maxfile(buf: &[u8]) -> bool {
	buf.len() >= HEADER_SIZE && buf.starts_with(MAGIC)
}

/// How a chunk's declared size relates to its payload length
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeConvention {
	/// Size counts only the bytes after the tag and size fields
	PayloadOnly,
	/// Size counts the 8-byte tag and size fields as well
	HeaderInclusive,
}

impl Default for SizeConvention {
	fn default() -> Self {
		SizeConvention::PayloadOnly
	}
}

impl SizeConvention {
	/// Payload length for a declared size, if the size is valid under this convention
	pub fn payload_len(self, size: u32) -> Option<usize> {
		match self {
			SizeConvention::PayloadOnly => Some(size as usize),
			SizeConvention::HeaderInclusive => (size as usize).checked_sub(CHUNK_HEADER_SIZE),
		}
	}

	/// Declared size to write for a payload of the given length
	pub fn declared_size(self, payload_len: usize) -> Option<u32> {
		let size = match self {
			SizeConvention::PayloadOnly => payload_len,
			SizeConvention::HeaderInclusive => payload_len.checked_add(CHUNK_HEADER_SIZE)?,
		};

		u32::try_from(size).ok()
	}

	/// Resolves the convention from the data itself.
	///
	/// A convention is accepted when walking the chunk list with it lands on a
	/// printable ASCII tag at every step and ends exactly at the end of the buffer.
	/// Exactly one convention has to pass; an empty container defaults to
	/// [`SizeConvention::PayloadOnly`] since no chunk boundary depends on it.
	/// When neither passes, the payload-only walk's error is returned, so a cut-off
	/// file still fails as truncated.
	pub fn probe(buf: &[u8]) -> Result<SizeConvention, C3ImportError> {
		let payload_only = SizeConvention::PayloadOnly.walk(buf);
		let inclusive = SizeConvention::HeaderInclusive.walk(buf);

		match (payload_only, inclusive) {
			(Ok(()), Err(_)) => Ok(SizeConvention::PayloadOnly),
			(Err(_), Ok(())) => Ok(SizeConvention::HeaderInclusive),
			(Err(e), Err(_)) => Err(e),
			(Ok(()), Ok(())) if buf.len() == HEADER_SIZE => Ok(SizeConvention::PayloadOnly),
			(Ok(()), Ok(())) => Err(C3ImportError::AmbiguousConvention),
		}
	}

	fn walk(self, buf: &[u8]) -> Result<(), C3ImportError> {
		for chunk in Maxfile::read(buf, self)?.chunks() {
			if !chunk?.tag.to_le_bytes().iter().all(|b| (0x20..0x7f).contains(b)) {
				return Err(C3ImportError::UnresolvedConvention);
			}
		}

		Ok(())
	}
}

/// Fixed 16-byte container header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
	pub magic: [u8; HEADER_SIZE],
}

impl Header {
	pub fn read(cur: &mut ByteCursor) -> Result<Header, C3ImportError> {
		let prefix = cur.peek_bytes(cur.remaining().min(MAGIC.len()))?;
		if prefix != &MAGIC[..] {
			return Err(C3ImportError::Magic(String::from_utf8_lossy(prefix).into_owned()));
		}

		let mut magic = [0; HEADER_SIZE];
		magic.copy_from_slice(cur.read_bytes(HEADER_SIZE)?);

		Ok(Header {
			magic: magic,
		})
	}

	/// The reserved bytes after the magic, as text
	pub fn reserved(&self) -> String {
		String::from_utf8_lossy(&self.magic[MAGIC.len()..])
			.trim_matches(|c: char| c == '\0' || c.is_whitespace())
			.to_string()
	}
}

/// A raw chunk: tag, declared size, and a borrowed payload window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
	pub tag: u32,
	pub size: u32,
	/// Offset of the chunk header from the start of the container
	pub offset: usize,
	pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
	pub fn tag_str(&self) -> String {
		rtag4_str(self.tag)
	}

	/// Offset of the first byte after this chunk
	pub fn end(&self) -> usize {
		self.offset + CHUNK_HEADER_SIZE + self.payload.len()
	}

	/// Error for a decode that needed `required` bytes of this payload
	pub fn overrun(&self, required: u64) -> C3ImportError {
		C3ImportError::ChunkOverrun {
			tag: self.tag_str(),
			offset: self.offset,
			declared: self.payload.len(),
			required: required,
		}
	}
}

/// Validated container positioned at its first chunk
#[derive(Clone, Debug)]
pub struct Maxfile<'a> {
	pub header: Header,
	pub convention: SizeConvention,
	cur: ByteCursor<'a>,
}

impl<'a> Maxfile<'a> {
	pub fn read(buf: &'a [u8], convention: SizeConvention) -> Result<Maxfile<'a>, C3ImportError> {
		let mut cur = ByteCursor::new(buf);
		let header = Header::read(&mut cur)?;

		Ok(Maxfile {
			header: header,
			convention: convention,
			cur: cur,
		})
	}

	/// Consumes the container, yielding its chunks in file order
	pub fn chunks(self) -> Chunks<'a> {
		Chunks {
			cur: self.cur,
			convention: self.convention,
			done: false,
		}
	}
}

/// Lazy chunk sequence. Ends cleanly when no bytes remain and stops after the first error.
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
	cur: ByteCursor<'a>,
	convention: SizeConvention,
	done: bool,
}

impl<'a> Chunks<'a> {
	fn read_chunk(&mut self) -> Result<Chunk<'a>, C3ImportError> {
		let offset = self.cur.position();
		let remaining = self.cur.remaining();
		if remaining < CHUNK_HEADER_SIZE {
			return Err(C3ImportError::TruncatedChunkHeader {
				offset: offset,
				remaining: remaining,
			});
		}

		let tag = self.cur.read_u32()?;
		let size = self.cur.read_u32()?;
		let len = self.convention.payload_len(size).ok_or_else(|| C3ImportError::ChunkSize {
			tag: rtag4_str(tag),
			offset: offset,
			size: size,
		})?;

		Ok(Chunk {
			tag: tag,
			size: size,
			offset: offset,
			payload: self.cur.read_bytes(len)?,
		})
	}
}

impl<'a> Iterator for Chunks<'a> {
	type Item = Result<Chunk<'a>, C3ImportError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.cur.is_empty() {
			self.done = true;
			return None;
		}

		let chunk = self.read_chunk();
		if chunk.is_err() {
			self.done = true;
		}

		Some(chunk)
	}
}

impl<'a> std::iter::FusedIterator for Chunks<'a> {}

#[cfg(test)]
mod tests {
	use rgk_core::cursor::ReadError;

	use super::*;

	fn container(chunks: &[(&[u8; 4], u32, &[u8])]) -> Vec<u8> {
		let mut buf = b"MAXFILE C3 00001".to_vec();
		for (tag, size, payload) in chunks {
			buf.extend_from_slice(&tag[..]);
			buf.extend_from_slice(&size.to_le_bytes());
			buf.extend_from_slice(payload);
		}
		buf
	}

	#[test]
	fn test_header() {
		let buf = container(&[]);
		let file = Maxfile::read(&buf, SizeConvention::PayloadOnly).unwrap();
		assert_eq!("00001", file.header.reserved());
		assert_eq!(0, file.chunks().count());
		assert!(is_maxfile(&buf));
	}

	#[test]
	fn test_bad_magic() {
		let err = Maxfile::read(b"PHY \x00\x00\x00\x00xxxxxxxx", SizeConvention::PayloadOnly).unwrap_err();
		assert_eq!(C3ImportError::Magic("PHY \0\0\0\0xx".to_string()), err);
		assert!(!is_maxfile(b"PHY \x00\x00\x00\x00xxxxxxxx"));
	}

	#[test]
	fn test_short_header() {
		let err = Maxfile::read(b"MAXFILE C3 00", SizeConvention::PayloadOnly).unwrap_err();
		assert_eq!(C3ImportError::TruncatedRead {
			source: ReadError { offset: 0, requested: 16, remaining: 13 },
		}, err);

		assert!(matches!(Maxfile::read(b"MAX", SizeConvention::PayloadOnly), Err(C3ImportError::Magic(_))));
	}

	#[test]
	fn test_payload_only_walk() {
		let buf = container(&[(b"XTRA", 3, b"abc"), (b"PHY ", 2, b"de")]);
		let chunks: Vec<Chunk> = Maxfile::read(&buf, SizeConvention::PayloadOnly).unwrap()
			.chunks()
			.collect::<Result<_, _>>()
			.unwrap();

		assert_eq!(2, chunks.len());
		assert_eq!("XTRA", chunks[0].tag_str());
		assert_eq!(16, chunks[0].offset);
		assert_eq!(b"abc", chunks[0].payload);
		assert_eq!(PHY, chunks[1].tag);
		assert_eq!(chunks[0].end(), chunks[1].offset);
		assert_eq!(b"de", chunks[1].payload);
		assert_eq!(buf.len(), chunks[1].end());
	}

	#[test]
	fn test_header_inclusive_walk() {
		let buf = container(&[(b"XTRA", 11, b"abc"), (b"PHYS", 8, b"")]);
		let chunks: Vec<Chunk> = Maxfile::read(&buf, SizeConvention::HeaderInclusive).unwrap()
			.chunks()
			.collect::<Result<_, _>>()
			.unwrap();

		assert_eq!(b"abc", chunks[0].payload);
		assert_eq!(PHYS, chunks[1].tag);
		assert!(chunks[1].payload.is_empty());
	}

	#[test]
	fn test_inclusive_size_below_header() {
		let buf = container(&[(b"XTRA", 4, b"")]);
		let mut chunks = Maxfile::read(&buf, SizeConvention::HeaderInclusive).unwrap().chunks();

		assert_eq!(Some(Err(C3ImportError::ChunkSize { tag: "XTRA".to_string(), offset: 16, size: 4 })),
			chunks.next());
		assert_eq!(None, chunks.next());
	}

	#[test]
	fn test_trailing_garbage() {
		let mut buf = container(&[(b"XTRA", 1, b"a")]);
		buf.extend_from_slice(b"PHY");

		let mut chunks = Maxfile::read(&buf, SizeConvention::PayloadOnly).unwrap().chunks();
		assert!(chunks.next().unwrap().is_ok());
		assert_eq!(Some(Err(C3ImportError::TruncatedChunkHeader { offset: 25, remaining: 3 })), chunks.next());
		assert_eq!(None, chunks.next());
	}

	#[test]
	fn test_payload_past_end() {
		let buf = container(&[(b"PHY ", 10, b"short")]);
		let mut chunks = Maxfile::read(&buf, SizeConvention::PayloadOnly).unwrap().chunks();

		assert_eq!(Some(Err(C3ImportError::TruncatedRead {
			source: ReadError { offset: 24, requested: 10, remaining: 5 },
		})), chunks.next());
		assert_eq!(None, chunks.next());
	}

	#[test]
	fn test_probe() {
		let payload_only = container(&[(b"XTRA", 12, &[0xff; 12]), (b"PHY ", 4, b"\x01\x02\x03\x04")]);
		assert_eq!(Ok(SizeConvention::PayloadOnly), SizeConvention::probe(&payload_only));

		let inclusive = container(&[(b"XTRA", 20, &[0xff; 12]), (b"PHY ", 12, b"\x01\x02\x03\x04")]);
		assert_eq!(Ok(SizeConvention::HeaderInclusive), SizeConvention::probe(&inclusive));

		assert_eq!(Ok(SizeConvention::PayloadOnly), SizeConvention::probe(&container(&[])));

		let mut broken = payload_only.clone();
		broken.push(0);
		assert_eq!(Err(C3ImportError::TruncatedChunkHeader { offset: payload_only.len(), remaining: 1 }),
			SizeConvention::probe(&broken));
	}

	#[test]
	fn test_convention_unresolved() {
		// Payload-only lands on an unprintable tag, header-inclusive rejects the zero size
		let mut buf = container(&[(b"XTRA", 0, b"")]);
		buf.extend_from_slice(b"\x01\x02\x03\x04\x00\x00\x00\x00");
		assert_eq!(Err(C3ImportError::UnresolvedConvention), SizeConvention::probe(&buf));

		assert!(matches!(SizeConvention::probe(b"MAXFILE C3 00"), Err(C3ImportError::TruncatedRead { .. })));
	}

	#[test]
	fn test_convention_truncated() {
		let buf = container(&[(b"XTRA", 12, &[0xff; 12]), (b"PHY ", 4, b"\x01\x02\x03\x04")]);
		let len = buf.len();

		assert_eq!(Err(C3ImportError::TruncatedRead {
			source: ReadError { offset: 44, requested: 4, remaining: 3 },
		}), SizeConvention::probe(&buf[..len - 1]));
		assert_eq!(Err(C3ImportError::TruncatedChunkHeader { offset: 36, remaining: 5 }),
			SizeConvention::probe(&buf[..41]));
	}

	#[test]
	fn test_probe_ambiguous() {
		// The second half of the payload reads as an empty header-inclusive chunk
		let buf = container(&[(b"AAAA", 16, b"xxxxxxxxBBBB\x08\x00\x00\x00")]);
		assert_eq!(Err(C3ImportError::AmbiguousConvention), SizeConvention::probe(&buf));
	}

	#[test]
	fn test_declared_size() {
		assert_eq!(Some(12), SizeConvention::PayloadOnly.declared_size(12));
		assert_eq!(Some(20), SizeConvention::HeaderInclusive.declared_size(12));
		assert_eq!(Some(12), SizeConvention::HeaderInclusive.payload_len(20));
		assert_eq!(None, SizeConvention::HeaderInclusive.payload_len(7));
	}
}
