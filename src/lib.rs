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

//! X.509 certificate name matching and name constraint checking.
//!
//! This library answers two questions about an already-validated
//! certificate chain:
//!
//! * Is the end-entity certificate valid for a given hostname or IP
//!   address literal? See [`check_cert_hostname`].
//! * Do the names presented by a certificate and its descendants conform
//!   to a CA's name constraints extension? See [`check_name_constraints`].
//!
//! Chain building, signature verification, validity periods and
//! revocation are the responsibility of the caller; this library only
//! ever reads names. Both questions are answered by one shared traversal
//! of the certificate's names so that identity matching and constraint
//! enforcement cannot disagree about which names count.
//!
//! All inputs are borrowed byte slices and no heap allocation happens on
//! any matching path, so the library is usable without the standard
//! library. The `alloc` feature adds owned variants of the name types and
//! `std` (the default) additionally implements `std::error::Error`.

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod cert;
mod der;
mod name;

pub use crate::cert::{parse_cert, Cert, EndEntityOrCA};
#[cfg(feature = "alloc")]
pub use crate::name::DnsName;
pub use crate::name::{
    check_cert_hostname, check_name_constraints, DnsNameRef, InvalidDnsNameError,
};

/// An error that occurs during certificate name checking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// An encoding, such as a DER encoding, was invalid.
    BadDER,

    /// The certificate is not valid for the name it is being validated for.
    CertNotValidForName,

    /// The value of an extension was encoded multiple times or otherwise
    /// invalid.
    ExtensionValueInvalid,

    /// An internal error that is never the result of invalid input; see
    /// [`FatalError`].
    Fatal(FatalError),

    /// A name presented by a certificate is outside the name space
    /// permitted by a CA's name constraints.
    NameConstraintViolation,

    /// The certificate is not a v3 X.509 certificate.
    UnsupportedCertVersion,

    /// The certificate contains an unsupported critical extension.
    UnsupportedCriticalExtension,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// An error that is a bug in the library or its caller, not a property of
/// the input certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatalError {
    /// A state that should be unreachable was reached.
    ImpossibleState,

    /// An internal function was called with arguments it does not support.
    InvalidArgs,
}

impl core::fmt::Display for FatalError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FatalError {}

/// The extended key usage purpose a certificate chain was validated for.
///
/// During name constraint checking, the subject common name of the end
/// entity is considered as a presented name only for chains validated for
/// server authentication, mirroring the hostname search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPurposeId {
    /// id-kp-serverAuth: the chain authenticates a TLS server.
    ServerAuth,

    /// id-kp-clientAuth: the chain authenticates a TLS client.
    ClientAuth,
}
