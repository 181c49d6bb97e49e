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

// https://tools.ietf.org/html/rfc5280#section-4.2.1.6 says:
//   When the subjectAltName extension contains an iPAddress, the address
//   MUST be stored in the octet string in "network byte order", as
//   specified in [RFC791].  The least significant bit (LSB) of each octet
//   is the LSB of the corresponding byte in the network address.  For IP
//   version 4, as specified in [RFC791], the octet string MUST contain
//   exactly four octets.  For IP version 6, as specified in
//   [RFC2460], the octet string MUST contain exactly sixteen octets.
pub(super) fn presented_id_matches_reference_id(
    presented_id: untrusted::Input,
    reference_id: untrusted::Input,
) -> bool {
    if presented_id.len() != reference_id.len() {
        return false;
    }

    let mut presented = untrusted::Reader::new(presented_id);
    let mut reference = untrusted::Reader::new(reference_id);
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
        if presented_byte != reference_byte {
            return false;
        }
        if presented.at_end() {
            break;
        }
    }

    true
}

// https://tools.ietf.org/html/rfc5280#section-4.2.1.10 says:
//
//     For IPv4 addresses, the iPAddress field of GeneralName MUST contain
//     eight (8) octets, encoded in the style of RFC 4632 (CIDR) to represent
//     an address range [RFC4632].  For IPv6 addresses, the iPAddress field
//     MUST contain 32 octets similarly encoded.  For example, a name
//     constraint for "class C" subnet 192.0.2.0 is represented as the
//     octets C0 00 02 00 FF FF FF 00, representing the CIDR notation
//     192.0.2.0/24 (mask 255.255.255.0).
pub(super) fn presented_id_matches_constraint(
    name: untrusted::Input,
    constraint: untrusted::Input,
) -> Result<bool, Error> {
    if name.len() != 4 && name.len() != 16 {
        return Err(Error::BadDER);
    }
    if constraint.len() != 8 && constraint.len() != 32 {
        return Err(Error::BadDER);
    }

    // An IPv4 address never matches an IPv6 constraint, and vice versa.
    if name.len() * 2 != constraint.len() {
        return Ok(false);
    }

    let (constraint_address, constraint_mask) = constraint.read_all(Error::BadDER, |value| {
        let address = value.read_bytes(constraint.len() / 2).map_err(|_| Error::BadDER)?;
        let mask = value.read_bytes(constraint.len() / 2).map_err(|_| Error::BadDER)?;
        Ok((address, mask))
    })?;

    let mut name = untrusted::Reader::new(name);
    let mut constraint_address = untrusted::Reader::new(constraint_address);
    let mut constraint_mask = untrusted::Reader::new(constraint_mask);
    loop {
        let name_byte = name.read_byte().map_err(|_| Error::BadDER)?;
        let constraint_address_byte = constraint_address.read_byte().map_err(|_| Error::BadDER)?;
        let constraint_mask_byte = constraint_mask.read_byte().map_err(|_| Error::BadDER)?;
        if ((name_byte ^ constraint_address_byte) & constraint_mask_byte) != 0 {
            return Ok(false);
        }
        if name.at_end() {
            break;
        }
    }

    Ok(true)
}

fn read_ipv4_address_component(input: &mut untrusted::Reader, last_component: bool) -> Option<u8> {
    let mut length = 0;
    let mut value: u16 = 0; // Must be larger than u8.

    loop {
        if input.at_end() && last_component {
            break;
        }

        let b = match input.read_byte() {
            Ok(b) => b,
            Err(..) => {
                return None;
            }
        };

        match b {
            b'0'..=b'9' => {
                if value == 0 && length > 0 {
                    return None; // Leading zeros are not allowed.
                }
                value = (value * 10) + u16::from(b - b'0');
                if value > 255 {
                    return None; // Component's value is too large.
                }
                length += 1;
            }
            b'.' if !last_component => {
                break;
            }
            _ => {
                return None; // Invalid character.
            }
        }
    }

    if length == 0 {
        return None; // Empty components are not allowed.
    }

    Some(value as u8)
}

// On some platforms the OS-provided address parsing functions fail when
// the protocol (IPv4 or IPv6) has been disabled, so we can't rely on them;
// protocol availability must not influence certificate validation.
pub(crate) fn parse_ipv4_address(address: untrusted::Input, out: &mut [u8; 4]) -> bool {
    let mut input = untrusted::Reader::new(address);
    for i in 0..4 {
        match read_ipv4_address_component(&mut input, i == 3) {
            Some(b) => {
                out[i] = b;
            }
            None => {
                return false;
            }
        }
    }
    true
}

fn finish_ipv6_address(
    address: &mut [u8; 16],
    num_components: usize,
    contraction_index: Option<usize>,
) -> bool {
    let contraction_index = match contraction_index {
        None => {
            return num_components == 8;
        }
        Some(i) => i,
    };

    if num_components >= 8 {
        return false; // No room left to expand the contraction.
    }

    // Shift the components that occur after the contraction to the end,
    // then fill the contracted area with zeros.
    let components_to_move = num_components - contraction_index;
    address.copy_within(
        (2 * contraction_index)..(2 * num_components),
        2 * (8 - components_to_move),
    );
    for byte in &mut address[(2 * contraction_index)..(2 * (8 - components_to_move))] {
        *byte = 0;
    }

    true
}

pub(crate) fn parse_ipv6_address(address: untrusted::Input, out: &mut [u8; 16]) -> bool {
    let mut input = untrusted::Reader::new(address);

    let mut current_component_index = 0;
    let mut contraction_index = None;

    // A valid input can only start with ':' if there is a contraction at
    // the beginning.
    if input.peek(b':') {
        if input.read_byte() != Ok(b':') {
            return false;
        }
        if input.read_byte() != Ok(b':') {
            return false;
        }
        contraction_index = Some(0);
    }

    loop {
        // If a '.' is encountered then the input from the start of the
        // current component to the end is re-parsed as an IPv4 address, so
        // remember where the component started.
        let start_of_component = input.mark();
        let mut component_value: u16 = 0;
        let mut component_length = 0;
        while !input.at_end() && !input.peek(b':') {
            let b = match input.read_byte() {
                Ok(b) => b,
                Err(..) => {
                    return false;
                }
            };
            let value = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                b'.' => {
                    // An IPv4-syntax tail occupies the last four bytes of
                    // the address (two 16-bit components).
                    if current_component_index > 6 {
                        return false; // Too many components before the IPv4 part.
                    }

                    let _ = input.read_bytes_to_end();
                    let ipv4_component = match input
                        .get_input_between_marks(start_of_component, input.mark())
                    {
                        Ok(ipv4_component) => ipv4_component,
                        Err(..) => {
                            return false;
                        }
                    };
                    let mut ipv4 = [0u8; 4];
                    if !parse_ipv4_address(ipv4_component, &mut ipv4) {
                        return false;
                    }
                    out[(2 * current_component_index)..][..4].copy_from_slice(&ipv4);
                    current_component_index += 2;

                    return finish_ipv6_address(out, current_component_index, contraction_index);
                }
                _ => {
                    return false;
                }
            };
            if component_length >= 4 {
                return false; // Component too long.
            }
            component_length += 1;
            component_value = (component_value * 0x10) + u16::from(value);
        }

        if current_component_index >= 8 {
            return false; // Too many components.
        }

        if component_length == 0 {
            if input.at_end() && contraction_index == Some(current_component_index) {
                if contraction_index == Some(0) {
                    // Don't accept a bare "::".
                    return false;
                }
                return finish_ipv6_address(out, current_component_index, contraction_index);
            }
            return false;
        }

        out[2 * current_component_index] = (component_value / 0x100) as u8;
        out[(2 * current_component_index) + 1] = (component_value % 0x100) as u8;

        current_component_index += 1;

        if input.at_end() {
            return finish_ipv6_address(out, current_component_index, contraction_index);
        }

        if input.read_byte() != Ok(b':') {
            return false;
        }

        if input.peek(b':') {
            // Contraction.
            if contraction_index.is_some() {
                return false; // Multiple contractions are not allowed.
            }
            if input.read_byte() != Ok(b':') {
                return false;
            }
            contraction_index = Some(current_component_index);
            if input.at_end() {
                // "::" at the end of the input.
                return finish_ipv6_address(out, current_component_index, contraction_index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (address, parses)
    const IPV4_ADDRESSES_VALIDITY: &[(&[u8], bool)] = &[
        // Valid IPv4 addresses
        (b"0.0.0.0", true),
        (b"127.0.0.1", true),
        (b"1.1.1.1", true),
        (b"255.255.255.255", true),
        (b"205.0.0.0", true),
        (b"0.205.0.0", true),
        (b"0.0.205.0", true),
        (b"0.0.0.205", true),
        (b"0.0.0.20", true),
        (b"192.0.2.1", true),
        // Invalid IPv4 addresses
        (b"", false),
        (b"...", false),
        (b".0.0.0.0", false),
        (b"0.0.0.0.", false),
        (b"256.0.0.0", false),
        (b"0.256.0.0", false),
        (b"0.0.256.0", false),
        (b"0.0.0.256", false),
        (b"999.0.0.0", false),
        (b"1..1.1.1", false),
        (b"1.1..1.1", false),
        (b"1.1.1..1", false),
        // Leading zeros are rejected.
        (b"025.0.0.0", false),
        (b"0.025.0.0", false),
        (b"0.0.025.0", false),
        (b"0.0.0.025", false),
        (b"01.0.0.0", false),
        (b"00.0.0.0", false),
        // Wrong component counts and trailing garbage.
        (b"1.2.3", false),
        (b"1.2.3.4.5", false),
        (b"1.2.3.4 ", false),
        (b"1.2.3.4a", false),
        (b"a.2.3.4", false),
        (b"1:2:3:4", false),
    ];

    #[test]
    fn parse_ipv4_address_test() {
        for &(address, expected) in IPV4_ADDRESSES_VALIDITY {
            let mut out = [0u8; 4];
            assert_eq!(
                parse_ipv4_address(untrusted::Input::from(address), &mut out),
                expected,
                "{:?}",
                address
            );
        }
    }

    #[test]
    fn parse_ipv4_address_octets() {
        let mut out = [0u8; 4];
        assert!(parse_ipv4_address(
            untrusted::Input::from(b"192.0.2.1"),
            &mut out
        ));
        assert_eq!(out, [0xC0, 0x00, 0x02, 0x01]);

        assert!(parse_ipv4_address(
            untrusted::Input::from(b"54.155.246.232"),
            &mut out
        ));
        assert_eq!(out, [54, 155, 246, 232]);
    }

    // (address, parses)
    const IPV6_ADDRESSES_VALIDITY: &[(&[u8], bool)] = &[
        // Valid, uncompressed.
        (b"2a05:d018:076c:b685:e8ab:afd3:af51:3aed", true),
        (b"2A05:D018:076C:B685:E8AB:AFD3:AF51:3AED", true),
        (b"ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff", true),
        (b"0:0:0:0:0:0:0:1", true),
        // Valid, compressed.
        (b"::1", true),
        (b"1::", true),
        (b"2606:4700:4700::1111", true),
        (b"1:2:3:4:5:6:7::", true),
        (b"::1:2:3:4:5:6:7", true),
        // Valid, with an embedded IPv4 tail.
        (b"::ffff:192.0.2.1", true),
        (b"::192.0.2.1", true),
        (b"1:2:3:4:5:6:192.0.2.1", true),
        // A bare "::" is rejected.
        (b"::", false),
        (b":::", false),
        // Wrong number of components.
        (b"1:2:3:4:5:6:7", false),
        (b"1:2:3:4:5:6:7:8:9", false),
        (b"1:2:3:4:5:6:7:8::", false),
        (b"1::2:3:4:5:6:7:8", false),
        // At most one contraction.
        (b"1::2::3", false),
        (b"::1::", false),
        // Colon placement.
        (b":1:2:3:4:5:6:7:8", false),
        (b"1:2:3:4:5:6:7:8:", false),
        (b"1:2:3:", false),
        // Component syntax.
        (b"12345::1", false),
        (b"g::1", false),
        (b"1:2:3:4:5:6:7:8z", false),
        // IPv4 tail must be a valid dotted quad in the last position.
        (b"::ffff:192.0.2.256", false),
        (b"::ffff:192.0.2", false),
        (b"1:2:3:4:5:6:7:192.0.2.1", false),
        (b"::192.0.2.1.5", false),
        // No zone IDs or brackets.
        (b"fe80::1%eth0", false),
        (b"[::1]", false),
        (b"", false),
    ];

    #[test]
    fn parse_ipv6_address_test() {
        for &(address, expected) in IPV6_ADDRESSES_VALIDITY {
            let mut out = [0u8; 16];
            assert_eq!(
                parse_ipv6_address(untrusted::Input::from(address), &mut out),
                expected,
                "{:?}",
                address
            );
        }
    }

    #[test]
    fn parse_ipv6_address_octets() {
        let mut out = [0u8; 16];

        assert!(parse_ipv6_address(
            untrusted::Input::from(b"2a05:d018:76c:b684:8e48:47c9:84aa:b34d"),
            &mut out
        ));
        assert_eq!(
            out,
            [
                0x2a, 0x05, 0xd0, 0x18, 0x07, 0x6c, 0xb6, 0x84, 0x8e, 0x48, 0x47, 0xc9, 0x84,
                0xaa, 0xb3, 0x4d
            ]
        );

        assert!(parse_ipv6_address(untrusted::Input::from(b"::1"), &mut out));
        assert_eq!(out, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);

        assert!(parse_ipv6_address(untrusted::Input::from(b"1::"), &mut out));
        assert_eq!(out, [0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(parse_ipv6_address(
            untrusted::Input::from(b"::ffff:192.0.2.1"),
            &mut out
        ));
        assert_eq!(
            out,
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xc0, 0x00, 0x02, 0x01]
        );

        assert!(parse_ipv6_address(
            untrusted::Input::from(b"2606:4700:4700::64"),
            &mut out
        ));
        assert_eq!(
            out,
            [
                0x26, 0x06, 0x47, 0x00, 0x47, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0x00, 0x64
            ]
        );
    }

    #[test]
    fn presented_id_matches_reference_id_test() {
        assert!(presented_id_matches_reference_id(
            untrusted::Input::from(&[192, 0, 2, 1][..]),
            untrusted::Input::from(&[192, 0, 2, 1][..]),
        ));
        assert!(!presented_id_matches_reference_id(
            untrusted::Input::from(&[192, 0, 2, 1][..]),
            untrusted::Input::from(&[192, 0, 2, 2][..]),
        ));
        // An IPv4 address never equals an IPv6 address.
        assert!(!presented_id_matches_reference_id(
            untrusted::Input::from(&[192, 0, 2, 1][..]),
            untrusted::Input::from(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 192, 0, 2, 1][..]),
        ));
    }

    #[test]
    fn presented_id_matches_constraint_test() {
        // 192.0.2.0/24
        let constraint = [192, 0, 2, 0, 0xff, 0xff, 0xff, 0];
        assert_eq!(
            presented_id_matches_constraint(
                untrusted::Input::from(&[192, 0, 2, 1][..]),
                untrusted::Input::from(&constraint[..]),
            ),
            Ok(true)
        );
        assert_eq!(
            presented_id_matches_constraint(
                untrusted::Input::from(&[192, 0, 3, 1][..]),
                untrusted::Input::from(&constraint[..]),
            ),
            Ok(false)
        );

        // A one-bit difference inside the masked prefix is a mismatch.
        let constraint = [192, 0, 2, 0, 0xff, 0xff, 0xff, 0x80];
        assert_eq!(
            presented_id_matches_constraint(
                untrusted::Input::from(&[192, 0, 2, 0x7f][..]),
                untrusted::Input::from(&constraint[..]),
            ),
            Ok(true)
        );
        assert_eq!(
            presented_id_matches_constraint(
                untrusted::Input::from(&[192, 0, 2, 0x80][..]),
                untrusted::Input::from(&constraint[..]),
            ),
            Ok(false)
        );

        // An IPv4 address never matches an IPv6 constraint, and vice versa.
        let v6_constraint = [
            0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
            0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(
            presented_id_matches_constraint(
                untrusted::Input::from(&[192, 0, 2, 1][..]),
                untrusted::Input::from(&v6_constraint[..]),
            ),
            Ok(false)
        );

        // Malformed lengths are errors, not mismatches.
        assert_eq!(
            presented_id_matches_constraint(
                untrusted::Input::from(&[192, 0, 2][..]),
                untrusted::Input::from(&constraint[..]),
            ),
            Err(Error::BadDER)
        );
        assert_eq!(
            presented_id_matches_constraint(
                untrusted::Input::from(&[192, 0, 2, 1][..]),
                untrusted::Input::from(&constraint[..7]),
            ),
            Err(Error::BadDER)
        );
    }
}
