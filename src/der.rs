// Copyright 2015 Brian Smith.
//
// Permission to use, copy, modify, and/or distribute this software for any
// purpose with or without fee is hereby granted, provided that the above
// copyright notice and this permission notice appear in all copies.
//
// THE SOFTWARE IS PROVIDED "AS IS" AND THE AUTHORS DISCLAIM ALL WARRANTIES
// WITH REGARD TO THIS SOFTWARE INCLUDING ALL IMPLIED WARRANTIES OF
// MERCHANTABILITY AND FITNESS. IN NO EVENT SHALL THE AUTHORS BE LIABLE FOR
// ANY SPECIAL, DIRECT, INDIRECT, OR CONSEQUENTIAL DAMAGES OR ANY DAMAGES
// WHATSOEVER RESULTING FROM LOSS OF USE, DATA OR PROFITS, WHETHER IN AN
// ACTION OF CONTRACT, NEGLIGENCE OR OTHER TORTIOUS ACTION, ARISING OUT OF
// OR IN CONNECTION WITH THE USE OR PERFORMANCE OF THIS SOFTWARE.

use crate::Error;

pub(crate) use ring::io::der::{CONSTRUCTED, CONTEXT_SPECIFIC};

#[derive(Clone, Copy, PartialEq)]
#[repr(u8)]
pub(crate) enum Tag {
    Boolean = 0x01,
    Integer = 0x02,
    BitString = 0x03,
    OctetString = 0x04,
    OID = 0x06,
    UTF8String = 0x0C,
    PrintableString = 0x13,
    TeletexString = 0x14,
    Sequence = CONSTRUCTED | 0x10, // 0x30
    Set = CONSTRUCTED | 0x11,      // 0x31

    ContextSpecificConstructed0 = CONTEXT_SPECIFIC | CONSTRUCTED | 0,
    ContextSpecificConstructed1 = CONTEXT_SPECIFIC | CONSTRUCTED | 1,
    ContextSpecificConstructed3 = CONTEXT_SPECIFIC | CONSTRUCTED | 3,
}

pub(crate) fn expect_tag_and_get_value<'a>(
    input: &mut untrusted::Reader<'a>,
    tag: Tag,
) -> Result<untrusted::Input<'a>, Error> {
    let (actual_tag, inner) = read_tag_and_get_value(input)?;
    if actual_tag != tag as u8 {
        return Err(Error::BadDER);
    }
    Ok(inner)
}

/// Reads the entire input as exactly one TLV of the given tag, returning
/// its value.
pub(crate) fn expect_tag_and_get_value_at_end(
    input: untrusted::Input,
    tag: Tag,
) -> Result<untrusted::Input, Error> {
    input.read_all(Error::BadDER, |reader| expect_tag_and_get_value(reader, tag))
}

/// Like `expect_tag_and_get_value`, but returns the complete TLV including
/// the tag and length bytes.
pub(crate) fn expect_tag_and_get_tlv<'a>(
    input: &mut untrusted::Reader<'a>,
    tag: Tag,
) -> Result<untrusted::Input<'a>, Error> {
    let (tlv, _) = input.read_partial(|input| expect_tag_and_get_value(input, tag))?;
    Ok(tlv)
}

pub(crate) fn read_tag_and_get_value<'a>(
    input: &mut untrusted::Reader<'a>,
) -> Result<(u8, untrusted::Input<'a>), Error> {
    let tag = input.read_byte().map_err(|_| Error::BadDER)?;
    if (tag & 0x1F) == 0x1F {
        return Err(Error::BadDER); // High tag number form is not allowed.
    }

    // If the high order bit of the first byte is set to zero then the length
    // is encoded in the seven remaining bits of that byte. Otherwise, those
    // seven bits represent the number of bytes used to encode the length.
    let length = match input.read_byte().map_err(|_| Error::BadDER)? {
        n if (n & 0x80) == 0 => usize::from(n),
        0x81 => {
            let second_byte = input.read_byte().map_err(|_| Error::BadDER)?;
            if second_byte < 128 {
                return Err(Error::BadDER); // Not the canonical encoding.
            }
            usize::from(second_byte)
        }
        0x82 => {
            let second_byte = usize::from(input.read_byte().map_err(|_| Error::BadDER)?);
            let third_byte = usize::from(input.read_byte().map_err(|_| Error::BadDER)?);
            let combined = (second_byte << 8) | third_byte;
            if combined < 256 {
                return Err(Error::BadDER); // Not the canonical encoding.
            }
            combined
        }
        _ => {
            return Err(Error::BadDER); // We don't support longer lengths.
        }
    };

    let inner = input.read_bytes(length).map_err(|_| Error::BadDER)?;
    Ok((tag, inner))
}

pub(crate) fn nested<'a, F, R, E: Copy>(
    input: &mut untrusted::Reader<'a>,
    tag: Tag,
    error: E,
    decoder: F,
) -> Result<R, E>
where
    F: FnOnce(&mut untrusted::Reader<'a>) -> Result<R, E>,
{
    let inner = expect_tag_and_get_value(input, tag).map_err(|_| error)?;
    inner.read_all(error, decoder)
}

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum EmptyAllowed {
    No,
    Yes,
}

/// Iterates a `SEQUENCE OF`/`SET OF`, calling `decoder` once per inner
/// value. Each inner value must be consumed exhaustively by `decoder`.
pub(crate) fn nested_of_mut<'a, F, E: Copy>(
    input: &mut untrusted::Reader<'a>,
    outer_tag: Tag,
    inner_tag: Tag,
    empty_allowed: EmptyAllowed,
    error: E,
    mut decoder: F,
) -> Result<(), E>
where
    F: FnMut(&mut untrusted::Reader<'a>) -> Result<(), E>,
{
    nested(input, outer_tag, error, |outer| {
        if outer.at_end() {
            return match empty_allowed {
                EmptyAllowed::Yes => Ok(()),
                EmptyAllowed::No => Err(error),
            };
        }
        loop {
            nested(outer, inner_tag, error, |inner| decoder(inner))?;
            if outer.at_end() {
                break;
            }
        }
        Ok(())
    })
}

// Like mozilla::pkix, we accept the non-conformant explicit encoding of
// the default value (false) for compatibility with real-world certificates.
pub(crate) fn optional_boolean(input: &mut untrusted::Reader) -> Result<bool, Error> {
    if !input.peek(Tag::Boolean as u8) {
        return Ok(false);
    }
    nested(input, Tag::Boolean, Error::BadDER, |input| {
        match input.read_byte() {
            Ok(0xff) => Ok(true),
            Ok(0x00) => Ok(false),
            _ => Err(Error::BadDER),
        }
    })
}

// This parser will only parse values between 0..127. mozilla::pkix found
// experimentally that the need to parse larger values is not useful.
pub(crate) fn small_nonnegative_integer(input: &mut untrusted::Reader) -> Result<u8, Error> {
    nested(input, Tag::Integer, Error::BadDER, |value| {
        let first_byte = value.read_byte().map_err(|_| Error::BadDER)?;
        if (first_byte & 0x80) != 0 {
            // We don't accept negative values.
            return Err(Error::BadDER);
        }
        Ok(first_byte)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn read_one(input: &[u8]) -> Result<(u8, Vec<u8>), Error> {
        untrusted::Input::from(input).read_all(Error::BadDER, |reader| {
            let (tag, value) = read_tag_and_get_value(reader)?;
            Ok((tag, value.as_slice_less_safe().to_vec()))
        })
    }

    #[test]
    fn short_form_length() {
        assert_eq!(
            read_one(&[0x04, 0x02, 0xaa, 0xbb]),
            Ok((0x04, [0xaa, 0xbb].to_vec()))
        );
        assert_eq!(read_one(&[0x04, 0x00]), Ok((0x04, Vec::new())));
    }

    #[test]
    fn long_form_length_must_be_canonical() {
        // 0x81 with a length that fits in the short form.
        assert_eq!(read_one(&[0x04, 0x81, 0x01, 0xaa]), Err(Error::BadDER));
        // 0x82 with a length that fits in one byte.
        assert_eq!(
            read_one(&[0x04, 0x82, 0x00, 0x01, 0xaa]),
            Err(Error::BadDER)
        );
    }

    #[test]
    fn high_tag_number_form_is_rejected() {
        assert_eq!(read_one(&[0x1f, 0x00]), Err(Error::BadDER));
    }

    #[test]
    fn truncated_value_is_rejected() {
        assert_eq!(read_one(&[0x04, 0x03, 0xaa, 0xbb]), Err(Error::BadDER));
    }

    #[test]
    fn trailing_input_is_rejected() {
        assert_eq!(read_one(&[0x04, 0x01, 0xaa, 0xbb]), Err(Error::BadDER));
    }
}
