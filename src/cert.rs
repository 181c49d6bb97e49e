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

use crate::{der, Error};

/// A certificate's position within a chain.
pub enum EndEntityOrCA<'a> {
    /// The certificate is the chain's end entity.
    EndEntity,

    /// The certificate is a CA. The reference is to the certificate it
    /// issued, one step closer to the end entity.
    CA(&'a Cert<'a>),
}

/// A certificate, reduced to the parts needed for name checking.
///
/// Every field borrows from the DER the certificate was parsed from; the
/// caller keeps that buffer alive for as long as the `Cert` is used.
pub struct Cert<'a> {
    /// This certificate's position within the chain being checked.
    pub ee_or_ca: EndEntityOrCA<'a>,

    /// The subject field, as a complete DER-encoded Name.
    pub subject: untrusted::Input<'a>,

    /// The value of the subjectAltName extension, if present.
    pub subject_alt_name: Option<untrusted::Input<'a>>,

    /// The value of the nameConstraints extension, if present.
    pub name_constraints: Option<untrusted::Input<'a>>,
}

/// Parses `cert_der` into the view of the certificate used for name
/// checking.
///
/// Only the structure of the signature fields is checked; verifying the
/// signature itself (and building the chain in the first place) is the
/// caller's job and must happen before any name in the certificate is
/// trusted.
pub fn parse_cert<'a>(
    cert_der: untrusted::Input<'a>,
    ee_or_ca: EndEntityOrCA<'a>,
) -> Result<Cert<'a>, Error> {
    let tbs = cert_der.read_all(Error::BadDER, |cert_der| {
        der::nested(cert_der, der::Tag::Sequence, Error::BadDER, |signed_cert| {
            let tbs = der::expect_tag_and_get_value(signed_cert, der::Tag::Sequence)?;
            let _signature_algorithm =
                der::expect_tag_and_get_value(signed_cert, der::Tag::Sequence)?;
            let _signature = der::expect_tag_and_get_value(signed_cert, der::Tag::BitString)?;
            Ok(tbs)
        })
    })?;

    tbs.read_all(Error::BadDER, |tbs| {
        version3(tbs)?;
        let _serial_number = certificate_serial_number(tbs)?;
        let _signature = der::expect_tag_and_get_value(tbs, der::Tag::Sequence)?;
        let _issuer = der::expect_tag_and_get_value(tbs, der::Tag::Sequence)?;
        let _validity = der::expect_tag_and_get_value(tbs, der::Tag::Sequence)?;

        // The subject is kept as a complete TLV because directoryName name
        // constraints are matched against the whole encoded Name.
        let subject = der::expect_tag_and_get_tlv(tbs, der::Tag::Sequence)?;

        let _spki = der::expect_tag_and_get_value(tbs, der::Tag::Sequence)?;

        let mut cert = Cert {
            ee_or_ca,
            subject,
            subject_alt_name: None,
            name_constraints: None,
        };

        // In theory there could be fields [1] issuerUniqueID and [2]
        // subjectUniqueID, but in practice there never are, and to keep the
        // code small and simple we don't accept any certificates that do
        // contain them.
        //
        // Unlike the extensions themselves, the extensions field is
        // optional; legacy certificates without a subjectAltName extension
        // are still accepted so that their subject common name can be
        // considered.
        if !tbs.at_end() {
            der::nested(
                tbs,
                der::Tag::ContextSpecificConstructed3,
                Error::BadDER,
                |tagged| {
                    der::nested_of_mut(
                        tagged,
                        der::Tag::Sequence,
                        der::Tag::Sequence,
                        der::EmptyAllowed::No,
                        Error::BadDER,
                        |extension| {
                            let extn_id = der::expect_tag_and_get_value(extension, der::Tag::OID)?;
                            let critical = der::optional_boolean(extension)?;
                            let extn_value =
                                der::expect_tag_and_get_value(extension, der::Tag::OctetString)?;
                            match remember_extension(&mut cert, extn_id, extn_value)? {
                                Understood::No if critical => {
                                    Err(Error::UnsupportedCriticalExtension)
                                }
                                _ => Ok(()),
                            }
                        },
                    )
                },
            )?;
        }

        Ok(cert)
    })
}

// mozilla::pkix supports v1, v2, v3, and v4, including both the implicit
// (correct) and explicit (incorrect) encoding of v1. We allow only v3.
fn version3(input: &mut untrusted::Reader) -> Result<(), Error> {
    der::nested(
        input,
        der::Tag::ContextSpecificConstructed0,
        Error::BadDER,
        |input| {
            let version = der::small_nonnegative_integer(input)?;
            if version != 2 {
                // v3
                return Err(Error::UnsupportedCertVersion);
            }
            Ok(())
        },
    )
}

fn certificate_serial_number<'a>(
    input: &mut untrusted::Reader<'a>,
) -> Result<untrusted::Input<'a>, Error> {
    // https://tools.ietf.org/html/rfc5280#section-4.1.2.2:
    // * "Conforming CAs MUST NOT use serialNumber values longer than 20 octets."
    // * "The serial number MUST be a positive integer [...]"
    let value = der::expect_tag_and_get_value(input, der::Tag::Integer)?;
    if value.len() > 20 {
        return Err(Error::BadDER);
    }
    Ok(value)
}

enum Understood {
    Yes,
    No,
}

fn remember_extension<'a>(
    cert: &mut Cert<'a>,
    extn_id: untrusted::Input,
    value: untrusted::Input<'a>,
) -> Result<Understood, Error> {
    // id-ce 2.5.29
    static ID_CE: [u8; 2] = [0x55, 0x1d];

    if extn_id.len() != ID_CE.len() + 1
        || !extn_id.as_slice_less_safe().starts_with(&ID_CE)
    {
        return Ok(Understood::No);
    }

    let out = match extn_id.as_slice_less_safe()[ID_CE.len()] {
        // id-ce-keyUsage 2.5.29.15, id-ce-basicConstraints 2.5.29.19 and
        // id-ce-extKeyUsage 2.5.29.37 are enforced by the chain builder
        // before any name is checked, so they are accepted here without
        // being recorded.
        15 | 19 | 37 => {
            return Ok(Understood::Yes);
        }

        // id-ce-subjectAltName 2.5.29.17
        17 => &mut cert.subject_alt_name,

        // id-ce-nameConstraints 2.5.29.30
        30 => &mut cert.name_constraints,

        _ => {
            return Ok(Understood::No);
        }
    };

    match *out {
        Some(..) => {
            // The certificate contains more than one instance of this
            // extension.
            Err(Error::ExtensionValueInvalid)
        }
        None => {
            // The value is stored as-is. Both extensions are wrapped in a
            // SEQUENCE, and the name traversal parses that SEQUENCE itself
            // so that the same code path serves hostname matching and name
            // constraint checking.
            *out = Some(value);
            Ok(Understood::Yes)
        }
    }
}
