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

//! DER builders for the certificates and name constraints used by the
//! tests.
//!
//! The certificates built here are structurally valid v3 certificates
//! with placeholder signature fields. Signature verification is the chain
//! builder's job and happens before name checking, so the name checks
//! under test never look at those fields.

#![allow(dead_code)] // Each integration test uses a different subset.

fn der_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else if len < 0x100 {
        vec![0x81, len as u8]
    } else {
        assert!(len < 0x1_0000);
        vec![0x82, (len >> 8) as u8, len as u8]
    }
}

pub fn tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(der_length(value.len()));
    out.extend_from_slice(value);
    out
}

pub fn sequence(value: &[u8]) -> Vec<u8> {
    tlv(0x30, value)
}

pub fn set(value: &[u8]) -> Vec<u8> {
    tlv(0x31, value)
}

pub fn oid(value: &[u8]) -> Vec<u8> {
    tlv(0x06, value)
}

pub fn octet_string(value: &[u8]) -> Vec<u8> {
    tlv(0x04, value)
}

pub fn printable_string(value: &[u8]) -> Vec<u8> {
    tlv(0x13, value)
}

pub fn utf8_string(value: &[u8]) -> Vec<u8> {
    tlv(0x0C, value)
}

pub fn teletex_string(value: &[u8]) -> Vec<u8> {
    tlv(0x14, value)
}

pub fn bmp_string(value: &[u8]) -> Vec<u8> {
    tlv(0x1E, value)
}

// GeneralName alternatives, as they appear in subjectAltName entries and
// GeneralSubtree bases.

pub fn dns_name(name: &[u8]) -> Vec<u8> {
    tlv(0x82, name)
}

pub fn ip_address(octets: &[u8]) -> Vec<u8> {
    tlv(0x87, octets)
}

pub fn rfc822_name(value: &[u8]) -> Vec<u8> {
    tlv(0x81, value)
}

pub fn uniform_resource_identifier(value: &[u8]) -> Vec<u8> {
    tlv(0x86, value)
}

pub fn directory_name(name_der: &[u8]) -> Vec<u8> {
    tlv(0xA4, name_der)
}

// Subject Name helpers.

// id-at-commonName 2.5.4.3
pub const ID_AT_COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];

/// One RDN holding a single commonName attribute with the given encoded
/// value.
pub fn cn_rdn(value_tlv: &[u8]) -> Vec<u8> {
    set(&sequence(&[oid(ID_AT_COMMON_NAME), value_tlv.to_vec()].concat()))
}

pub fn name(rdns: &[Vec<u8>]) -> Vec<u8> {
    sequence(&rdns.concat())
}

pub fn empty_name() -> Vec<u8> {
    sequence(&[])
}

pub fn name_with_printable_cn(cn: &[u8]) -> Vec<u8> {
    name(&[cn_rdn(&printable_string(cn))])
}

// Extension helpers.

// id-ce-subjectAltName 2.5.29.17
pub const ID_CE_SUBJECT_ALT_NAME: &[u8] = &[0x55, 0x1d, 0x11];
// id-ce-nameConstraints 2.5.29.30
pub const ID_CE_NAME_CONSTRAINTS: &[u8] = &[0x55, 0x1d, 0x1e];

pub fn extension(extn_id: &[u8], critical: bool, value: &[u8]) -> Vec<u8> {
    let mut body = oid(extn_id);
    if critical {
        body.extend(tlv(0x01, &[0xff]));
    }
    body.extend(octet_string(value));
    sequence(&body)
}

pub fn san_extension(general_names: &[Vec<u8>]) -> Vec<u8> {
    extension(ID_CE_SUBJECT_ALT_NAME, false, &sequence(&general_names.concat()))
}

pub fn critical_san_extension(general_names: &[Vec<u8>]) -> Vec<u8> {
    extension(ID_CE_SUBJECT_ALT_NAME, true, &sequence(&general_names.concat()))
}

// Name constraints helpers. The result of `name_constraints` is the
// extension value that the chain builder would pass to
// `check_name_constraints`.

pub fn general_subtree(base: &[u8]) -> Vec<u8> {
    sequence(base)
}

pub fn name_constraints(
    permitted: Option<&[Vec<u8>]>,
    excluded: Option<&[Vec<u8>]>,
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(subtrees) = permitted {
        body.extend(tlv(0xA0, &subtrees.concat()));
    }
    if let Some(subtrees) = excluded {
        body.extend(tlv(0xA1, &subtrees.concat()));
    }
    sequence(&body)
}

/// Builds a v3 certificate around the given subject Name and extensions.
pub fn cert(subject_name: &[u8], extensions: &[Vec<u8>]) -> Vec<u8> {
    let mut tbs = Vec::new();
    tbs.extend(tlv(0xA0, &tlv(0x02, &[2]))); // version: v3
    tbs.extend(tlv(0x02, &[1])); // serialNumber
    tbs.extend(sequence(&[])); // signature algorithm
    tbs.extend(sequence(&[])); // issuer
    tbs.extend(sequence(&[])); // validity
    tbs.extend_from_slice(subject_name); // subject
    tbs.extend(sequence(&[])); // subjectPublicKeyInfo
    if !extensions.is_empty() {
        tbs.extend(tlv(0xA3, &sequence(&extensions.concat())));
    }

    let mut body = sequence(&tbs);
    body.extend(sequence(&[])); // signatureAlgorithm
    body.extend(tlv(0x03, &[0x00])); // signature: empty BIT STRING
    sequence(&body)
}

/// A certificate whose only names are subjectAltName entries.
pub fn cert_with_sans(general_names: &[Vec<u8>]) -> Vec<u8> {
    cert(&empty_name(), &[san_extension(general_names)])
}
