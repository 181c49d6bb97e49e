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

// Identifiers are classified as either "presented" or "reference"
// identifiers, as defined in http://tools.ietf.org/html/rfc6125#section-1.8.
// A presented identifier is one in the subjectAltName of the certificate,
// or sometimes within a CN of the certificate's subject. The reference
// identifier is the one we are being asked to match the certificate
// against. When checking name constraints, the reference identifier is the
// entire encoded name constraints extension value.

use super::{
    dns_name::{self, IdRole},
    ip_address,
};
use crate::{
    cert::{parse_cert, Cert, EndEntityOrCA},
    der::{self, CONSTRUCTED, CONTEXT_SPECIFIC},
    Error, FatalError, KeyPurposeId,
};

// GeneralName ::= CHOICE {
//      otherName                       [0]     OtherName,
//      rfc822Name                      [1]     IA5String,
//      dNSName                         [2]     IA5String,
//      x400Address                     [3]     ORAddress,
//      directoryName                   [4]     Name,
//      ediPartyName                    [5]     EDIPartyName,
//      uniformResourceIdentifier       [6]     IA5String,
//      iPAddress                       [7]     OCTET STRING,
//      registeredID                    [8]     OBJECT IDENTIFIER }
//
// The discriminants are the encoded tag bytes. They are not contiguous
// because directoryName also has the CONSTRUCTED bit set: its value is a
// SEQUENCE.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
enum GeneralNameType {
    OtherName = CONTEXT_SPECIFIC,
    Rfc822Name = CONTEXT_SPECIFIC | 1,
    DnsName = CONTEXT_SPECIFIC | 2,
    X400Address = CONTEXT_SPECIFIC | 3,
    DirectoryName = CONTEXT_SPECIFIC | CONSTRUCTED | 4,
    EdiPartyName = CONTEXT_SPECIFIC | 5,
    UniformResourceIdentifier = CONTEXT_SPECIFIC | 6,
    IpAddress = CONTEXT_SPECIFIC | 7,
    RegisteredId = CONTEXT_SPECIFIC | 8,

    // A pseudo-type used to signify that the reference ID is the entire
    // encoded name constraints extension value, so that SAN iteration
    // drives constraint checking through the exact same traversal as
    // hostname matching. It is never read from, or written to, a
    // certificate.
    NameConstraints = 0xff,
}

fn read_general_name<'a>(
    input: &mut untrusted::Reader<'a>,
) -> Result<(GeneralNameType, untrusted::Input<'a>), Error> {
    const OTHER_NAME: u8 = GeneralNameType::OtherName as u8;
    const RFC822_NAME: u8 = GeneralNameType::Rfc822Name as u8;
    const DNS_NAME: u8 = GeneralNameType::DnsName as u8;
    const X400_ADDRESS: u8 = GeneralNameType::X400Address as u8;
    const DIRECTORY_NAME: u8 = GeneralNameType::DirectoryName as u8;
    const EDI_PARTY_NAME: u8 = GeneralNameType::EdiPartyName as u8;
    const UNIFORM_RESOURCE_IDENTIFIER: u8 = GeneralNameType::UniformResourceIdentifier as u8;
    const IP_ADDRESS: u8 = GeneralNameType::IpAddress as u8;
    const REGISTERED_ID: u8 = GeneralNameType::RegisteredId as u8;

    let (tag, value) = der::read_tag_and_get_value(input)?;
    let name_type = match tag {
        OTHER_NAME => GeneralNameType::OtherName,
        RFC822_NAME => GeneralNameType::Rfc822Name,
        DNS_NAME => GeneralNameType::DnsName,
        X400_ADDRESS => GeneralNameType::X400Address,
        DIRECTORY_NAME => GeneralNameType::DirectoryName,
        EDI_PARTY_NAME => GeneralNameType::EdiPartyName,
        UNIFORM_RESOURCE_IDENTIFIER => GeneralNameType::UniformResourceIdentifier,
        IP_ADDRESS => GeneralNameType::IpAddress,
        REGISTERED_ID => GeneralNameType::RegisteredId,
        _ => {
            return Err(Error::BadDER);
        }
    };
    Ok((name_type, value))
}

#[derive(Clone, Copy, PartialEq)]
enum FallBackToCommonName {
    No,
    Yes,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum MatchResult {
    NoNamesOfGivenType,
    Mismatch,
    Match,
}

/// Checks that the end-entity certificate, which is assumed to have
/// already been validated by the chain builder, is valid for the given
/// hostname.
///
/// `hostname` must be a normalized ASCII byte string: a DNS name
/// (possibly absolute), an IPv6 address literal without brackets or a
/// zone ID, or an IPv4 dotted quad.
pub fn check_cert_hostname(end_entity_cert_der: &[u8], hostname: &[u8]) -> Result<(), Error> {
    let cert = parse_cert(
        untrusted::Input::from(end_entity_cert_der),
        EndEntityOrCA::EndEntity,
    )?;
    let hostname = untrusted::Input::from(hostname);

    // For backward compatibility with legacy certificates, fall back to
    // searching for a name match in the subject common name for DNS names
    // and IPv4 addresses. There is no fallback for IPv6 addresses, both
    // because few certificates would need it and because comparisons of
    // textual IPv6 addresses are particularly error prone due to the
    // syntactic flexibility IPv6 addresses have.
    //
    // IPv4 and IPv6 addresses are represented using the same type of
    // GeneralName (iPAddress); they are differentiated by the lengths of
    // the values.
    let mut ipv6 = [0u8; 16];
    let mut ipv4 = [0u8; 4];
    let match_result = if dns_name::is_valid_reference_dns_id(hostname) {
        search_names(
            cert.subject_alt_name,
            cert.subject,
            GeneralNameType::DnsName,
            hostname,
            FallBackToCommonName::Yes,
        )?
    } else if ip_address::parse_ipv6_address(hostname, &mut ipv6) {
        search_names(
            cert.subject_alt_name,
            cert.subject,
            GeneralNameType::IpAddress,
            untrusted::Input::from(&ipv6[..]),
            FallBackToCommonName::No,
        )?
    } else if ip_address::parse_ipv4_address(hostname, &mut ipv4) {
        search_names(
            cert.subject_alt_name,
            cert.subject,
            GeneralNameType::IpAddress,
            untrusted::Input::from(&ipv4[..]),
            FallBackToCommonName::Yes,
        )?
    } else {
        return Err(Error::CertNotValidForName);
    };

    match match_result {
        MatchResult::Match => Ok(()),
        MatchResult::NoNamesOfGivenType | MatchResult::Mismatch => {
            Err(Error::CertNotValidForName)
        }
    }
}

/// Checks that every certificate from `first_child` down to the end
/// entity conforms to the given name constraints extension value.
///
/// https://tools.ietf.org/html/rfc5280#section-4.2.1.10
///
/// The chain builder calls this once per certificate that carries a name
/// constraints extension, with `first_child` being the certificate that
/// the constrained CA issued.
pub fn check_name_constraints(
    encoded_name_constraints: &[u8],
    first_child: &Cert,
    required_eku_if_present: KeyPurposeId,
) -> Result<(), Error> {
    let encoded_name_constraints = untrusted::Input::from(encoded_name_constraints);

    let mut child = first_child;
    loop {
        // The subject common name is considered as a presented name only
        // under the same conditions as it is during hostname matching.
        let fall_back_to_common_name = match (&child.ee_or_ca, required_eku_if_present) {
            (EndEntityOrCA::EndEntity, KeyPurposeId::ServerAuth) => FallBackToCommonName::Yes,
            _ => FallBackToCommonName::No,
        };

        let match_result = search_names(
            child.subject_alt_name,
            child.subject,
            GeneralNameType::NameConstraints,
            encoded_name_constraints,
            fall_back_to_common_name,
        )?;
        match match_result {
            MatchResult::Match | MatchResult::NoNamesOfGivenType => {}
            MatchResult::Mismatch => {
                return Err(Error::NameConstraintViolation);
            }
        }

        child = match &child.ee_or_ca {
            EndEntityOrCA::CA(child_cert) => *child_cert,
            EndEntityOrCA::EndEntity => {
                break;
            }
        };
    }

    Ok(())
}

// search_names is used by both check_cert_hostname and
// check_name_constraints.
//
// When called during name constraint checking, reference_id_type is
// GeneralNameType::NameConstraints and reference_id is the entire encoded
// name constraints extension value.
//
// The main benefit of using the exact same code path for both is
// consistency between name validation and name constraint enforcement
// regarding things like "which CN attributes should be considered as
// potential CN-IDs" and "which character sets are acceptable for CN-IDs".
// If the two were out of sync on these questions (e.g. if name matching
// considered every subject CN attribute, but name constraints were only
// enforced on the most specific one), trivial name constraint bypasses
// could result.
fn search_names(
    subject_alt_name: Option<untrusted::Input>,
    subject: untrusted::Input,
    reference_id_type: GeneralNameType,
    reference_id: untrusted::Input,
    fall_back_to_common_name: FallBackToCommonName,
) -> Result<MatchResult, Error> {
    let mut match_result = MatchResult::NoNamesOfGivenType;

    // RFC 6125 says "A client MUST NOT seek a match for a reference
    // identifier of CN-ID if the presented identifiers include a DNS-ID,
    // SRV-ID, URI-ID, or any application-specific identifier types
    // supported by the client." Accordingly, we only consider CN-IDs if
    // there are no DNS-IDs in the subjectAltName.
    //
    // RFC 6125 says that IP addresses are out of scope, but for backward
    // compatibility we accept them, by considering IP addresses to be an
    // "application-specific identifier type supported by the client."
    let mut has_dns_name_or_ip_address_san = false;

    if let Some(subject_alt_name) = subject_alt_name {
        let alt_names =
            der::expect_tag_and_get_value_at_end(subject_alt_name, der::Tag::Sequence)?;
        let mut alt_names = untrusted::Reader::new(alt_names);

        // A subjectAltName extension is not allowed to be empty, so at
        // least one GeneralName is read.
        loop {
            let (presented_id_type, presented_id) = read_general_name(&mut alt_names)?;

            if reference_id_type == GeneralNameType::NameConstraints {
                check_presented_id_conforms_to_constraints(
                    presented_id_type,
                    presented_id,
                    reference_id,
                )?;
            } else if presented_id_type == reference_id_type {
                if match_presented_id_with_reference_id(
                    presented_id_type,
                    presented_id,
                    reference_id,
                )? {
                    return Ok(MatchResult::Match);
                }
                match_result = MatchResult::Mismatch;
            }

            if presented_id_type == GeneralNameType::DnsName
                || presented_id_type == GeneralNameType::IpAddress
            {
                has_dns_name_or_ip_address_san = true;
            }

            if alt_names.at_end() {
                break;
            }
        }
    }

    if reference_id_type == GeneralNameType::NameConstraints {
        check_presented_id_conforms_to_constraints(
            GeneralNameType::DirectoryName,
            subject,
            reference_id,
        )?;
    }

    if has_dns_name_or_ip_address_san || fall_back_to_common_name != FallBackToCommonName::Yes {
        return Ok(match_result);
    }

    // Attempt to match the reference ID against the CN-ID, which we
    // consider to be the most specific CN AVA in the subject field.
    //
    // RFC 6125 leaves it unclear what to do when the subject contains
    // multiple CNs, and popular implementations disagree: NSS's
    // CERT_VerifyCertName matches only the most specific CN (the last one
    // in iteration order, since an RDNSequence is ordered from least to
    // most specific), while Chromium uses the first and MSIE apparently
    // matches them all. We follow NSS, like the many NSS-based
    // applications that find the CN via CERT_GetCommonName, and avoid the
    // more liberal behaviors since CN-IDs are being phased out anyway.
    //
    // Name ::= CHOICE { -- only one possibility for now --
    //   rdnSequence  RDNSequence }
    //
    // RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
    //
    // RelativeDistinguishedName ::=
    //   SET SIZE (1..MAX) OF AttributeTypeAndValue
    subject.read_all(Error::BadDER, |subject| {
        der::nested_of_mut(
            subject,
            der::Tag::Sequence,
            der::Tag::Set,
            der::EmptyAllowed::Yes,
            Error::BadDER,
            |rdn| search_within_rdn(rdn, reference_id_type, reference_id, &mut match_result),
        )
    })?;

    Ok(match_result)
}

// RelativeDistinguishedName ::=
//   SET SIZE (1..MAX) OF AttributeTypeAndValue
fn search_within_rdn(
    rdn: &mut untrusted::Reader,
    reference_id_type: GeneralNameType,
    reference_id: untrusted::Input,
    match_result: &mut MatchResult,
) -> Result<(), Error> {
    loop {
        der::nested(rdn, der::Tag::Sequence, Error::BadDER, |ava| {
            search_within_ava(ava, reference_id_type, reference_id, &mut *match_result)
        })?;
        if rdn.at_end() {
            break;
        }
    }

    Ok(())
}

// AttributeTypeAndValue ::= SEQUENCE {
//   type     AttributeType,
//   value    AttributeValue }
//
// AttributeType ::= OBJECT IDENTIFIER
//
// AttributeValue ::= ANY -- DEFINED BY AttributeType
//
// DirectoryString ::= CHOICE {
//       teletexString           TeletexString (SIZE (1..MAX)),
//       printableString         PrintableString (SIZE (1..MAX)),
//       universalString         UniversalString (SIZE (1..MAX)),
//       utf8String              UTF8String (SIZE (1..MAX)),
//       bmpString               BMPString (SIZE (1..MAX)) }
fn search_within_ava(
    ava: &mut untrusted::Reader,
    reference_id_type: GeneralNameType,
    reference_id: untrusted::Input,
    match_result: &mut MatchResult,
) -> Result<(), Error> {
    // id-at-commonName 2.5.4.3
    static ID_AT_COMMON_NAME: [u8; 3] = [0x55, 0x04, 0x03];

    let attribute_type = der::expect_tag_and_get_value(ava, der::Tag::OID)?;

    // We're only interested in CN attributes.
    if attribute_type.as_slice_less_safe() != ID_AT_COMMON_NAME {
        ava.skip_to_end();
        return Ok(());
    }

    // We might have previously found a match. Now that we've found another
    // CN, we no longer consider that previous match to be a match, so
    // "forget" about it.
    *match_result = MatchResult::NoNamesOfGivenType;

    let (value_encoding_tag, presented_id) = der::read_tag_and_get_value(ava)?;

    // PrintableString is a subset of ASCII that contains all the
    // characters allowed in CN-IDs except '*'. Although '*' is formally
    // illegal there, many real-world certificates are encoded this way, so
    // it is accepted.
    //
    // For UTF8String we rely on the fact that in UTF-8 the octets of a
    // multi-byte encoding of a code point are always distinct from ASCII,
    // so any non-ASCII byte simply fails to match; no attempt is made to
    // detect or report malformed UTF-8.
    //
    // TeletexString is accepted as long as it does not contain any escape
    // sequences, which end up rejected as invalid characters in names.
    // That leaves the default character set, a superset of ASCII. Many
    // certificates with wildcard CN-IDs use TeletexString because
    // PrintableString cannot represent '*'.
    //
    // UniversalString and BMPString are deprecated and are not single-byte
    // ASCII superset encodings, so values in those encodings are skipped
    // entirely: they are neither a match nor a mismatch.
    if value_encoding_tag != der::Tag::PrintableString as u8
        && value_encoding_tag != der::Tag::UTF8String as u8
        && value_encoding_tag != der::Tag::TeletexString as u8
    {
        return Ok(());
    }

    if dns_name::is_valid_presented_dns_id(presented_id) {
        match reference_id_type {
            GeneralNameType::NameConstraints => {
                // A constraint violation in a CN-ID surfaces as a mismatch
                // at the end of the search, not as a hard error here.
                *match_result = match check_presented_id_conforms_to_constraints(
                    GeneralNameType::DnsName,
                    presented_id,
                    reference_id,
                ) {
                    Ok(()) => MatchResult::Match,
                    Err(..) => MatchResult::Mismatch,
                };
            }
            GeneralNameType::DnsName => {
                *match_result = if dns_name::presented_dns_id_matches_reference_dns_id(
                    presented_id,
                    IdRole::ReferenceId,
                    reference_id,
                ) {
                    MatchResult::Match
                } else {
                    MatchResult::Mismatch
                };
            }
            _ => {}
        }
    } else {
        // CN-IDs are never matched as IPv6 addresses.
        // presented_id_matches_reference_id never matches an IPv4 address
        // with an IPv6 address, so there is no need to check that the
        // reference ID is an IPv4 address here.
        let mut ipv4 = [0u8; 4];
        if ip_address::parse_ipv4_address(presented_id, &mut ipv4) {
            match reference_id_type {
                GeneralNameType::NameConstraints => {
                    *match_result = match check_presented_id_conforms_to_constraints(
                        GeneralNameType::IpAddress,
                        untrusted::Input::from(&ipv4[..]),
                        reference_id,
                    ) {
                        Ok(()) => MatchResult::Match,
                        Err(..) => MatchResult::Mismatch,
                    };
                }
                GeneralNameType::IpAddress => {
                    *match_result = if ip_address::presented_id_matches_reference_id(
                        untrusted::Input::from(&ipv4[..]),
                        reference_id,
                    ) {
                        MatchResult::Match
                    } else {
                        MatchResult::Mismatch
                    };
                }
                _ => {}
            }
        }
    }

    // CN-IDs are not matched as any other type of name.

    Ok(())
}

fn match_presented_id_with_reference_id(
    name_type: GeneralNameType,
    presented_id: untrusted::Input,
    reference_id: untrusted::Input,
) -> Result<bool, Error> {
    match name_type {
        GeneralNameType::DnsName => Ok(dns_name::presented_dns_id_matches_reference_dns_id(
            presented_id,
            IdRole::ReferenceId,
            reference_id,
        )),

        // Hostname matching compares IP addresses for exact equality; the
        // address/mask form exists only in name constraints.
        GeneralNameType::IpAddress => Ok(ip_address::presented_id_matches_reference_id(
            presented_id,
            reference_id,
        )),

        // The search only requests matches for the two types above.
        _ => Err(Error::Fatal(FatalError::InvalidArgs)),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Subtrees {
    PermittedSubtrees,
    ExcludedSubtrees,
}

impl Subtrees {
    fn tag(self) -> der::Tag {
        match self {
            Subtrees::PermittedSubtrees => der::Tag::ContextSpecificConstructed0,
            Subtrees::ExcludedSubtrees => der::Tag::ContextSpecificConstructed1,
        }
    }
}

fn check_presented_id_conforms_to_constraints(
    presented_id_type: GeneralNameType,
    presented_id: untrusted::Input,
    encoded_name_constraints: untrusted::Input,
) -> Result<(), Error> {
    // NameConstraints ::= SEQUENCE {
    //      permittedSubtrees       [0]     GeneralSubtrees OPTIONAL,
    //      excludedSubtrees        [1]     GeneralSubtrees OPTIONAL }
    let name_constraints =
        der::expect_tag_and_get_value_at_end(encoded_name_constraints, der::Tag::Sequence)?;
    name_constraints.read_all(Error::BadDER, |name_constraints| {
        // RFC 5280 says "Conforming CAs MUST NOT issue certificates where
        // name constraints is an empty sequence. That is, either the
        // permittedSubtrees field or the excludedSubtrees MUST be present."
        if name_constraints.at_end() {
            return Err(Error::BadDER);
        }

        check_presented_id_conforms_to_subtrees(
            presented_id_type,
            presented_id,
            name_constraints,
            Subtrees::PermittedSubtrees,
        )?;
        check_presented_id_conforms_to_subtrees(
            presented_id_type,
            presented_id,
            name_constraints,
            Subtrees::ExcludedSubtrees,
        )
    })
}

fn check_presented_id_conforms_to_subtrees(
    presented_id_type: GeneralNameType,
    presented_id: untrusted::Input,
    name_constraints: &mut untrusted::Reader,
    subtrees: Subtrees,
) -> Result<(), Error> {
    if !name_constraints.peek(subtrees.tag() as u8) {
        return Ok(());
    }

    let subtrees_value = der::expect_tag_and_get_value(name_constraints, subtrees.tag())?;
    let mut subtrees_reader = untrusted::Reader::new(subtrees_value);

    let mut has_permitted_subtrees_match = false;
    let mut has_permitted_subtrees_mismatch = false;

    // GeneralSubtrees ::= SEQUENCE SIZE (1..MAX) OF GeneralSubtree
    //
    // The subtree list is not allowed to be empty, so at least one entry
    // is read.
    loop {
        // GeneralSubtree ::= SEQUENCE {
        //      base                    GeneralName,
        //      minimum         [0]     BaseDistance DEFAULT 0,
        //      maximum         [1]     BaseDistance OPTIONAL }
        //
        // http://tools.ietf.org/html/rfc5280#section-4.2.1.10: "Within this
        // profile, the minimum and maximum fields are not used with any
        // name forms, thus, the minimum MUST be zero, and maximum MUST be
        // absent."
        //
        // Since the default value isn't allowed to be encoded according to
        // the DER encoding rules for DEFAULT, this is equivalent to saying
        // that neither minimum nor maximum must be encoded.
        let (constraint_type, base) = der::nested(
            &mut subtrees_reader,
            der::Tag::Sequence,
            Error::BadDER,
            read_general_name,
        )?;

        if presented_id_type == constraint_type {
            let matches = match presented_id_type {
                GeneralNameType::DnsName => {
                    let matches = dns_name::presented_dns_id_matches_reference_dns_id(
                        presented_id,
                        IdRole::NameConstraint,
                        base,
                    );
                    // A non-match could mean the constraint itself is
                    // syntactically invalid; that must reject the
                    // certificate rather than silently not constraining
                    // it. (On a match the base is already known to be
                    // valid, because the matcher validates it.)
                    if !matches && !dns_name::is_valid_name_constraint_dns_id(base) {
                        return Err(Error::NameConstraintViolation);
                    }
                    matches
                }

                GeneralNameType::IpAddress => {
                    ip_address::presented_id_matches_constraint(presented_id, base)?
                }

                GeneralNameType::DirectoryName => {
                    presented_directory_name_matches_constraint(subtrees, presented_id, base)?
                }

                // TODO: implement rfc822Name name constraint checking.
                GeneralNameType::Rfc822Name => {
                    return Err(Error::Fatal(FatalError::ImpossibleState));
                }

                // RFC 5280 says "Conforming CAs [...] SHOULD NOT impose
                // name constraints on the x400Address, ediPartyName, or
                // registeredID name forms", and merely encourages support
                // for uniformResourceIdentifier constraints. Rather than
                // under-enforce a constraint that a CA did impose, reject
                // the certificate.
                GeneralNameType::OtherName
                | GeneralNameType::X400Address
                | GeneralNameType::EdiPartyName
                | GeneralNameType::UniformResourceIdentifier
                | GeneralNameType::RegisteredId => {
                    return Err(Error::NameConstraintViolation);
                }

                // The pseudo-type is never presented.
                GeneralNameType::NameConstraints => {
                    return Err(Error::Fatal(FatalError::ImpossibleState));
                }
            };

            match subtrees {
                Subtrees::PermittedSubtrees => {
                    if matches {
                        has_permitted_subtrees_match = true;
                    } else {
                        has_permitted_subtrees_mismatch = true;
                    }
                }
                Subtrees::ExcludedSubtrees => {
                    if matches {
                        return Err(Error::NameConstraintViolation);
                    }
                }
            }
        }

        if subtrees_reader.at_end() {
            break;
        }
    }

    if has_permitted_subtrees_mismatch && !has_permitted_subtrees_match {
        // If there was any entry of the given type in permittedSubtrees,
        // then it required that at least one of them must match. Since
        // none of them did, we have a failure.
        return Err(Error::NameConstraintViolation);
    }

    Ok(())
}

// Names are sequences of RDNs, RDNs are sets of AVAs, and RFC 5280 would
// have us match them under LDAP stringprep normalization, across character
// set conversions, and with RDNs treated as unordered sets. In practice
// implementations compare Names in much simpler ways, and RFC 5280's
// security considerations require CAs to state directoryName constraints
// identically to the encoding used in the subject field. Consequently the
// comparison here is byte-for-byte, RDN by RDN, with the constraint
// needing to be a prefix of the presented name.
//
// For excludedSubtrees, where comparing too leniently means accepting
// invalid paths, only the empty constraint (which matches every name, so
// that a CA can forbid directory names entirely) is supported; any other
// excluded directoryName constraint rejects the chain.
fn presented_directory_name_matches_constraint(
    subtrees: Subtrees,
    presented_id: untrusted::Input,
    constraint: untrusted::Input,
) -> Result<bool, Error> {
    let constraint_rdns = der::expect_tag_and_get_value_at_end(constraint, der::Tag::Sequence)?;
    let presented_rdns = der::expect_tag_and_get_value_at_end(presented_id, der::Tag::Sequence)?;

    let mut constraint_rdns = untrusted::Reader::new(constraint_rdns);
    let mut presented_rdns = untrusted::Reader::new(presented_rdns);

    match subtrees {
        Subtrees::PermittedSubtrees => {}
        Subtrees::ExcludedSubtrees => {
            if !constraint_rdns.at_end() || !presented_rdns.at_end() {
                return Err(Error::NameConstraintViolation);
            }
            return Ok(true);
        }
    }

    loop {
        // The AVAs have to be fully equal, but the constraint RDNs only
        // need to be a prefix of the presented RDNs.
        if constraint_rdns.at_end() {
            return Ok(true);
        }
        if presented_rdns.at_end() {
            return Ok(false);
        }
        let constraint_rdn = der::expect_tag_and_get_value(&mut constraint_rdns, der::Tag::Set)?;
        let presented_rdn = der::expect_tag_and_get_value(&mut presented_rdns, der::Tag::Set)?;
        if constraint_rdn != presented_rdn {
            return Ok(false);
        }
    }
}
