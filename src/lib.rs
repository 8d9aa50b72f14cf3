/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A request/response framework for Exchange Web Services operations.
//!
//! Each operation is described by a type implementing [`Operation`]. A
//! [`ServiceCall`] validates it against the version negotiated by a
//! [`Transport`], writes it into a SOAP envelope, sends it, and correlates
//! the response messages it gets back, in order, into [`ResponseOutcome`]s.

use thiserror::Error;

mod macros;

mod service;
mod service_call;
mod transport;
mod types;
mod xml_writer;

#[cfg(test)]
mod test_utils;

pub use service::*;
pub use service_call::*;
pub use transport::*;
pub use types::*;
pub use xml_writer::*;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to exchange the request with the server: {0}")]
    Transport(#[from] TransportError),

    #[error("response does not match the expected shape: {0}")]
    Protocol(#[from] ProtocolError),

    /// A response message reported an error while the operation was set to
    /// [`ServiceErrorHandling::ThrowOnError`].
    #[error("response message {index} reported an error: {error}")]
    ResponseError { index: usize, error: ResponseError },

    #[error("request resulted in a SOAP fault: {}", .0.faultstring)]
    RequestFault(Box<soap::Fault>),

    #[error("error manipulating XML data")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to deserialize structure from XML")]
    Deserialize(#[from] serde_path_to_error::Error<quick_xml::DeError>),

    #[error("invalid use of the XML writer: {0}")]
    WriterState(&'static str),

    #[error("a call cannot be executed from state {0:?}")]
    InvalidCallState(CallState),

    #[error("unknown server version identifier: {0}")]
    UnknownServerVersion(String),
}

/// Errors raised before a request is sent.
///
/// A request which fails validation never reaches the transport.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "{operation} requires server version {required} or later, but the session negotiated {negotiated}"
    )]
    UnsupportedServerVersion {
        operation: &'static str,
        required: ExchangeServerVersion,
        negotiated: ExchangeServerVersion,
    },

    #[error("required parameter `{0}` is not set")]
    MissingParameter(&'static str),

    #[error("parameter `{name}` is invalid: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    #[error("collection `{0}` must contain at least one element")]
    EmptyCollection(&'static str),

    #[error("folder identifier must not be empty")]
    EmptyFolderId,

    #[error("well-known folder `{folder}` requires server version {required} or later")]
    FolderNotSupported {
        folder: WellKnownFolderName,
        required: ExchangeServerVersion,
    },

    #[error("identifier {0:?} is already in the collection")]
    DuplicateIdentifier(BaseFolderId),

    #[error("{operation} does not expect any response message")]
    NoResponseExpected { operation: &'static str },
}

/// Errors raised when a response does not have the shape required by the
/// operation it answers.
///
/// These are fatal regardless of the operation's [`ServiceErrorHandling`],
/// since the positions of the remaining response messages can no longer be
/// trusted.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("expected element `{expected}`, found `{found}`")]
    UnexpectedElement { expected: String, found: String },

    #[error("document ended while looking for `{expected}`")]
    UnexpectedEndOfDocument { expected: String },

    #[error("expected {expected} response messages, got {actual}")]
    TooFewResponses { expected: usize, actual: usize },

    #[error("expected {expected} response messages, got more")]
    TooManyResponses { expected: usize },

    #[error("response message {index} is not a success but carries no response code")]
    MissingResponseCode { index: usize },

    #[error("response is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("response is larger than the configured limit of {limit} bytes")]
    ResponseTooLarge { limit: usize },
}
