//! Charset parsing.
//!
//! A charset maps glyph ids to string ids. Three on-disk formats exist
//! (an explicit array and two run-length range flavors); all of them
//! normalize to the same lookup contract here. Glyph 0 is `.notdef`
//! and is never stored.

use super::parser::{FromData, Stream};
use super::{FormatError, StringId};
use crate::GlyphId;

/// The first few charset offsets select predefined charsets instead.
pub(crate) mod charset_id {
    pub(crate) const ISO_ADOBE: usize = 0;
    pub(crate) const EXPERT: usize = 1;
    pub(crate) const EXPERT_SUBSET: usize = 2;
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Charset<'a> {
    IsoAdobe,
    Expert,
    ExpertSubset,
    // Raw on-disk data; both directions of lookup walk it in place,
    // which keeps parsing allocation-free.
    Format0(&'a [u8]),
    Format1(&'a [u8]),
    Format2(&'a [u8]),
}

impl Charset<'_> {
    pub(crate) fn gid_to_sid(&self, gid: GlyphId) -> Option<StringId> {
        if gid.0 == 0 {
            return Some(StringId(0));
        }

        match self {
            Self::IsoAdobe => {
                // ISO Adobe defines string ids up to 228 (zcaron).
                if gid.0 <= 228 {
                    Some(StringId(gid.0))
                } else {
                    None
                }
            }
            Self::Expert | Self::ExpertSubset => None,
            Self::Format0(data) => {
                let mut s = Stream::new_at(data, usize::from(gid.0 - 1) * StringId::SIZE)?;
                s.read::<StringId>()
            }
            Self::Format1(data) => range_gid_to_sid::<u8>(data, gid),
            Self::Format2(data) => range_gid_to_sid::<u16>(data, gid),
        }
    }

    pub(crate) fn sid_to_gid(&self, sid: StringId) -> Option<GlyphId> {
        if sid.0 == 0 {
            return Some(GlyphId(0));
        }

        match self {
            Self::IsoAdobe => {
                if sid.0 <= 228 {
                    Some(GlyphId(sid.0))
                } else {
                    None
                }
            }
            Self::Expert | Self::ExpertSubset => None,
            Self::Format0(data) => {
                let mut s = Stream::new(data);
                let mut gid = 1u16;
                while let Some(n) = s.read::<StringId>() {
                    if n == sid {
                        return Some(GlyphId(gid));
                    }

                    gid = gid.checked_add(1)?;
                }

                None
            }
            Self::Format1(data) => range_sid_to_gid::<u8>(data, sid),
            Self::Format2(data) => range_sid_to_gid::<u16>(data, sid),
        }
    }
}

trait RunLength: FromData {
    fn to_u16(self) -> u16;
}

impl RunLength for u8 {
    fn to_u16(self) -> u16 {
        u16::from(self)
    }
}

impl RunLength for u16 {
    fn to_u16(self) -> u16 {
        self
    }
}

// Ranges are (first SID, glyphs left in range) pairs; a running glyph
// count locates the range the target falls into.
fn range_gid_to_sid<T: RunLength>(data: &[u8], gid: GlyphId) -> Option<StringId> {
    let mut s = Stream::new(data);
    // The glyph index among the stored (non-.notdef) glyphs.
    let mut left = u32::from(gid.0) - 1;
    while !s.at_end() {
        let first = s.read::<StringId>()?;
        let n_left = u32::from(s.read::<T>()?.to_u16());
        if left <= n_left {
            let sid = u32::from(first.0) + left;
            return u16::try_from(sid).ok().map(StringId);
        }

        left -= n_left + 1;
    }

    None
}

fn range_sid_to_gid<T: RunLength>(data: &[u8], sid: StringId) -> Option<GlyphId> {
    let mut s = Stream::new(data);
    let mut gid = 1u32;
    while !s.at_end() {
        let first = s.read::<StringId>()?;
        let n_left = u32::from(s.read::<T>()?.to_u16());
        if sid.0 >= first.0 && u32::from(sid.0) <= u32::from(first.0) + n_left {
            let gid = gid + u32::from(sid.0 - first.0);
            return u16::try_from(gid).ok().map(GlyphId);
        }

        gid += n_left + 1;
    }

    None
}

pub(crate) fn parse_charset<'a>(
    number_of_glyphs: u16,
    s: &mut Stream<'a>,
) -> Result<Charset<'a>, FormatError> {
    if number_of_glyphs < 2 {
        return Err(FormatError::ReadOutOfBounds);
    }

    let format = s.read::<u8>().ok_or(FormatError::ReadOutOfBounds)?;
    // Subtract 1, since `.notdef` is not stored.
    let stored = u32::from(number_of_glyphs) - 1;
    match format {
        0 => {
            let data = s
                .read_bytes(usize::from(number_of_glyphs - 1) * StringId::SIZE)
                .ok_or(FormatError::ReadOutOfBounds)?;
            Ok(Charset::Format0(data))
        }
        1 => parse_ranges::<u8>(stored, s).map(Charset::Format1),
        2 => parse_ranges::<u16>(stored, s).map(Charset::Format2),
        _ => Err(FormatError::InvalidCharsetFormat),
    }
}

// The range list carries no length of its own; it ends once it has
// covered every stored glyph.
fn parse_ranges<'a, T: RunLength>(
    stored_glyphs: u32,
    s: &mut Stream<'a>,
) -> Result<&'a [u8], FormatError> {
    let tail = s.tail().ok_or(FormatError::ReadOutOfBounds)?;
    let start = s.offset();
    let mut covered = 0u32;
    while covered < stored_glyphs {
        s.skip::<StringId>();
        let n_left = s
            .read::<T>()
            .ok_or(FormatError::ReadOutOfBounds)?
            .to_u16();
        covered = covered
            .checked_add(u32::from(n_left) + 1)
            .ok_or(FormatError::ReadOutOfBounds)?;
    }

    tail.get(..s.offset() - start)
        .ok_or(FormatError::ReadOutOfBounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    // gid 1..=3 -> sid 5..=7, gid 4 -> sid 100, gid 5 -> sid 101
    fn format0_data() -> Vec<u8> {
        vec![0, 5, 0, 6, 0, 7, 0, 100, 0, 101]
    }

    fn format1_data() -> Vec<u8> {
        // (first 5, 2 left), (first 100, 1 left)
        vec![0, 5, 2, 0, 100, 1]
    }

    fn format2_data() -> Vec<u8> {
        vec![0, 5, 0, 2, 0, 100, 0, 1]
    }

    #[test]
    fn formats_agree() {
        let d0 = format0_data();
        let d1 = format1_data();
        let d2 = format2_data();
        let charsets = [
            Charset::Format0(&d0),
            Charset::Format1(&d1),
            Charset::Format2(&d2),
        ];

        let expected = [0u16, 5, 6, 7, 100, 101];
        for charset in &charsets {
            for (gid, sid) in expected.iter().enumerate() {
                assert_eq!(
                    charset.gid_to_sid(GlyphId(gid as u16)),
                    Some(StringId(*sid)),
                    "{charset:?} gid {gid}"
                );
            }

            // Past the last stored glyph.
            assert_eq!(charset.gid_to_sid(GlyphId(6)), None);
        }
    }

    #[test]
    fn reverse_lookup() {
        let d1 = format1_data();
        let d2 = format2_data();
        for charset in [Charset::Format1(&d1), Charset::Format2(&d2)] {
            for (gid, sid) in [0u16, 5, 6, 7, 100, 101].iter().enumerate() {
                assert_eq!(
                    charset.sid_to_gid(StringId(*sid)),
                    Some(GlyphId(gid as u16))
                );
            }

            assert_eq!(charset.sid_to_gid(StringId(8)), None);
            assert_eq!(charset.sid_to_gid(StringId(99)), None);
        }
    }

    #[test]
    fn parse_rejects_unknown_format() {
        let data = [3u8, 0, 0];
        assert_eq!(
            parse_charset(3, &mut Stream::new(&data)),
            Err(FormatError::InvalidCharsetFormat)
        );
    }

    #[test]
    fn parse_format1() {
        // 6 glyphs total -> 5 stored: ranges (5, 2 left) + (100, 1 left).
        let data = [1u8, 0, 5, 2, 0, 100, 1, 0xAA];
        let mut s = Stream::new(&data);
        let charset = parse_charset(6, &mut s).unwrap();
        assert_eq!(charset.gid_to_sid(GlyphId(5)), Some(StringId(101)));
        // The trailing byte does not belong to the charset.
        assert_eq!(s.read::<u8>(), Some(0xAA));
    }

    #[test]
    fn parse_truncated_ranges() {
        let data = [1u8, 0, 5, 1];
        assert_eq!(
            parse_charset(6, &mut Stream::new(&data)),
            Err(FormatError::ReadOutOfBounds)
        );
    }
}
