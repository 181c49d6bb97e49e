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

#[cfg(feature = "alloc")]
use alloc::string::String;

#[cfg(feature = "alloc")]
const VALID_DNS_NAME_BY_CONSTRUCTION: &str = "DNS name is valid ASCII by construction";

/// A DNS name that may be used as the reference identifier when verifying
/// a certificate, borrowing its text representation.
///
/// A `DnsNameRef` is guaranteed to be syntactically valid: ASCII letters,
/// digits and hyphens in dot-separated labels, optionally ending in a dot
/// (an absolute name). Wildcards are not valid in reference identifiers.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct DnsNameRef<'a>(&'a [u8]);

/// An error indicating that a `DnsNameRef` could not be built because the
/// input is not a syntactically-valid DNS name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidDnsNameError;

impl core::fmt::Display for InvalidDnsNameError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Requires the `std` feature.
#[cfg(feature = "std")]
impl ::std::error::Error for InvalidDnsNameError {}

impl<'a> DnsNameRef<'a> {
    /// Constructs a `DnsNameRef` from the given input if the input is a
    /// syntactically-valid DNS name.
    pub fn try_from_ascii(dns_name: &'a [u8]) -> Result<Self, InvalidDnsNameError> {
        if !is_valid_reference_dns_id(untrusted::Input::from(dns_name)) {
            return Err(InvalidDnsNameError);
        }
        Ok(Self(dns_name))
    }

    /// Constructs a `DnsNameRef` from the given input if the input is a
    /// syntactically-valid DNS name.
    pub fn try_from_ascii_str(dns_name: &'a str) -> Result<Self, InvalidDnsNameError> {
        Self::try_from_ascii(dns_name.as_bytes())
    }

    /// Constructs a `DnsName` from this `DnsNameRef`.
    ///
    /// Requires the `alloc` feature.
    #[cfg(feature = "alloc")]
    pub fn to_owned(&self) -> DnsName {
        DnsName(
            String::from_utf8(self.0.to_vec()).expect(VALID_DNS_NAME_BY_CONSTRUCTION),
        )
    }
}

impl AsRef<[u8]> for DnsNameRef<'_> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.0
    }
}

impl core::fmt::Debug for DnsNameRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let name = core::str::from_utf8(self.0).map_err(|_| core::fmt::Error)?;
        write!(f, "DnsNameRef({:?})", name)
    }
}

/// A DNS name that may be used as a reference identifier, plus its owned
/// string representation.
///
/// Requires the `alloc` feature.
#[cfg(feature = "alloc")]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DnsName(String);

#[cfg(feature = "alloc")]
impl DnsName {
    /// A `DnsNameRef` borrowing this name.
    pub fn as_ref(&self) -> DnsNameRef {
        DnsNameRef(self.0.as_bytes())
    }
}

#[cfg(feature = "alloc")]
impl AsRef<str> for DnsName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// The role a DNS identifier plays in a comparison, which determines the
/// syntax rules it must follow and how it is matched.
#[derive(Clone, Copy, PartialEq)]
pub(crate) enum IdRole {
    /// The name the caller wants to authenticate, e.g. the hostname from
    /// the URL. Only reference identifiers may be absolute (end in a dot).
    ReferenceId,

    /// A name asserted by the certificate, from the subjectAltName
    /// extension or a subject common name. Only presented identifiers may
    /// contain a wildcard label.
    PresentedId,

    /// The base of a dNSName entry in a name constraints extension. A name
    /// constraint may be empty (matching everything) or start with a dot
    /// (matching strict subdomains only).
    NameConstraint,
}

#[derive(Clone, Copy, PartialEq)]
enum AllowWildcards {
    No,
    Yes,
}

pub(crate) fn is_valid_reference_dns_id(hostname: untrusted::Input) -> bool {
    is_valid_dns_id(hostname, IdRole::ReferenceId, AllowWildcards::No)
}

pub(crate) fn is_valid_presented_dns_id(hostname: untrusted::Input) -> bool {
    is_valid_dns_id(hostname, IdRole::PresentedId, AllowWildcards::Yes)
}

pub(crate) fn is_valid_name_constraint_dns_id(hostname: untrusted::Input) -> bool {
    is_valid_dns_id(hostname, IdRole::NameConstraint, AllowWildcards::No)
}

// https://tools.ietf.org/html/rfc5280#section-4.2.1.6:
//
//   When the subjectAltName extension contains a domain name system
//   label, the domain name MUST be stored in the dNSName (an IA5String).
//   The name MUST be in the "preferred name syntax", as specified by
//   Section 3.5 of [RFC1034] and as modified by Section 2.1 of
//   [RFC1123].
fn is_valid_dns_id(
    hostname: untrusted::Input,
    id_role: IdRole,
    allow_wildcards: AllowWildcards,
) -> bool {
    if hostname.len() > 253 {
        return false;
    }

    let mut input = untrusted::Reader::new(hostname);

    if id_role == IdRole::NameConstraint && input.at_end() {
        return true;
    }

    let mut dot_count = 0;
    let mut label_length = 0;
    let mut label_is_all_numeric = false;
    let mut label_ends_with_hyphen = false;

    // Only presented IDs are allowed to have wildcard labels. And, like
    // Chromium, be stricter than RFC 6125 requires by insisting that a
    // wildcard label consist only of '*'.
    let is_wildcard = allow_wildcards == AllowWildcards::Yes && input.peek(b'*');
    let mut is_first_byte = !is_wildcard;
    if is_wildcard {
        if input.read_byte() != Ok(b'*') || input.read_byte() != Ok(b'.') {
            return false;
        }
        dot_count += 1;
    }

    loop {
        const MAX_LABEL_LENGTH: usize = 63;

        match input.read_byte() {
            Ok(b'-') => {
                if label_length == 0 {
                    return false; // Labels must not start with a hyphen.
                }
                label_is_all_numeric = false;
                label_ends_with_hyphen = true;
                label_length += 1;
                if label_length > MAX_LABEL_LENGTH {
                    return false;
                }
            }

            Ok(b'0'..=b'9') => {
                if label_length == 0 {
                    label_is_all_numeric = true;
                }
                label_ends_with_hyphen = false;
                label_length += 1;
                if label_length > MAX_LABEL_LENGTH {
                    return false;
                }
            }

            Ok(b'a'..=b'z') | Ok(b'A'..=b'Z') => {
                label_is_all_numeric = false;
                label_ends_with_hyphen = false;
                label_length += 1;
                if label_length > MAX_LABEL_LENGTH {
                    return false;
                }
            }

            Ok(b'.') => {
                dot_count += 1;
                // A leading dot is only valid in a name constraint, where
                // it restricts the match to strict subdomains.
                if label_length == 0 && (id_role != IdRole::NameConstraint || !is_first_byte) {
                    return false;
                }
                if label_ends_with_hyphen {
                    return false; // Labels must not end with a hyphen.
                }
                label_length = 0;
            }

            _ => {
                return false;
            }
        }
        is_first_byte = false;

        if input.at_end() {
            break;
        }
    }

    // Only reference IDs, not presented IDs or name constraints, may be
    // absolute.
    if label_length == 0 && id_role != IdRole::ReferenceId {
        return false;
    }

    if label_ends_with_hyphen {
        return false; // Labels must not end with a hyphen.
    }

    if label_is_all_numeric {
        return false; // Last label must not be all numeric.
    }

    if is_wildcard {
        // If the DNS ID ends with a dot, the last dot signifies an absolute ID.
        let label_count = if label_length == 0 {
            dot_count
        } else {
            dot_count + 1
        };

        // Like NSS, require at least two labels to follow the wildcard label.
        if label_count < 3 {
            return false;
        }

        // RFC 6125 says that we shouldn't accept wildcards within an IDN
        // A-Label.
        if starts_with_idn_a_label(hostname) {
            return false;
        }
    }

    true
}

fn starts_with_idn_a_label(id: untrusted::Input) -> bool {
    // https://tools.ietf.org/html/rfc5890#section-2.3.2.1
    const IDN_A_LABEL_PREFIX: &[u8] = b"xn--";
    let mut input = untrusted::Reader::new(id);
    for &prefix_byte in IDN_A_LABEL_PREFIX {
        match input.read_byte() {
            Ok(b) if b == prefix_byte => {}
            _ => {
                return false;
            }
        }
    }
    true
}

// We avoid locale-sensitive case conversion functions because the names
// being compared are not locale-tagged; only ASCII A-Z are folded.
#[inline]
fn locale_insensitive_to_lower(b: u8) -> u8 {
    match b {
        b'A'..=b'Z' => b + (b'a' - b'A'),
        _ => b,
    }
}

// We do not distinguish between a syntactically-invalid presented_dns_id
// and one that is syntactically valid but does not match reference_dns_id;
// in both cases, the result is false.
//
// We assume that both presented_dns_id and reference_dns_id are encoded in
// such a way that US-ASCII (7-bit) characters are encoded in one byte and
// no encoding of a non-US-ASCII character contains a code point in the
// range 0-127. For example, UTF-8 is OK but UTF-16 is not.
//
// RFC 6125 says that a wildcard label may be of the form <x>*<y>.<DNSID>,
// where <x> and/or <y> may be empty. However, NSS requires both to be
// empty, and we follow NSS's stricter policy by accepting wildcards only
// of the form *.<DNSID>.
//
// A relative presented DNS ID matches both an absolute reference ID and a
// relative reference ID. Absolute presented DNS IDs are not supported:
//
//      Presented ID   Reference ID  Result
//      -------------------------------------
//      example.com    example.com   Match
//      example.com.   example.com   Mismatch
//      example.com    example.com.  Match
//      example.com.   example.com.  Mismatch
//
// When matching a name constraint (id_role == NameConstraint), RFC 5280
// says "Any DNS name that can be constructed by simply adding zero or more
// labels to the left-hand side of the name satisfies the name constraint",
// which we interpret as requiring whole labels to be prefixed, like the
// RFC 6265 domain matching rules. A constraint that starts with a dot is
// additionally supported, like NSS and SChannel: it matches strict
// subdomains only, so "www.example.com" matches ".example.com" but
// "example.com" does not. An empty constraint matches every name, which
// makes an excludedSubtrees constraint of "" forbid all DNS names.
// Absolute names are not supported as presented IDs or name constraints.
pub(crate) fn presented_dns_id_matches_reference_dns_id(
    presented_dns_id: untrusted::Input,
    reference_dns_id_role: IdRole,
    reference_dns_id: untrusted::Input,
) -> bool {
    if !is_valid_presented_dns_id(presented_dns_id) {
        return false;
    }

    if !is_valid_dns_id(reference_dns_id, reference_dns_id_role, AllowWildcards::No) {
        return false;
    }

    let mut presented = untrusted::Reader::new(presented_dns_id);
    let mut reference = untrusted::Reader::new(reference_dns_id);

    match reference_dns_id_role {
        IdRole::ReferenceId => {}

        IdRole::NameConstraint => {
            if presented_dns_id.len() > reference_dns_id.len() {
                if reference_dns_id.len() == 0 {
                    // An empty constraint matches everything.
                    return true;
                }

                // If the constraint starts with a dot then skip the prefix
                // of the presented ID and start the comparison at the
                // position of that dot. Examples:
                //
                //                                  Matches     Doesn't Match
                //     --------------------------------------------------------
                //       presented:  www.example.com    badexample.com
                //         skipped:  www                ba
                //       remainder:     .example.com      dexample.com
                //      constraint:     .example.com      .example.com
                //
                // If the constraint does not start with a dot then the
                // skipped prefix must end on a label boundary:
                //
                //                                  Matches     Doesn't Match
                //     --------------------------------------------------------
                //       presented:  www.example.com    badexample.com
                //         skipped:  www                ba
                //     must be '.':     .                 d
                //       remainder:      example.com       example.com
                //      constraint:      example.com       example.com
                if reference.peek(b'.') {
                    if presented
                        .skip(presented_dns_id.len() - reference_dns_id.len())
                        .is_err()
                    {
                        return false;
                    }
                } else {
                    if presented
                        .skip(presented_dns_id.len() - reference_dns_id.len() - 1)
                        .is_err()
                    {
                        return false;
                    }
                    if presented.read_byte() != Ok(b'.') {
                        return false;
                    }
                }
            }
        }

        IdRole::PresentedId => {
            // The reference side of a comparison is never a presented ID.
            return false;
        }
    }

    // A wildcard label consists only of '*', and it matches exactly one
    // label on the reference side: consume reference bytes up to, but not
    // including, the next dot.
    if presented.peek(b'*') {
        if presented.skip(1).is_err() {
            return false;
        }
        loop {
            if reference.read_byte().is_err() {
                return false;
            }
            if reference.peek(b'.') {
                break;
            }
        }
    }

    loop {
        let presented_byte = match presented.read_byte() {
            Ok(b) => b,
            Err(..) => {
                return false;
            }
        };
        let reference_byte = match reference.read_byte() {
            Ok(b) => b,
            Err(..) => {
                return false;
            }
        };
        if locale_insensitive_to_lower(presented_byte)
            != locale_insensitive_to_lower(reference_byte)
        {
            return false;
        }
        if presented.at_end() {
            // Don't allow presented IDs to be absolute.
            if presented_byte == b'.' {
                return false;
            }
            break;
        }
    }

    // Allow a relative presented DNS ID to match an absolute reference DNS
    // ID, unless we're matching a name constraint.
    if !reference.at_end() {
        if reference_dns_id_role != IdRole::NameConstraint {
            if reference.read_byte() != Ok(b'.') {
                return false;
            }
        }
        if !reference.at_end() {
            return false;
        }
    }

    true
}
