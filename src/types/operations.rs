/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::de::DeserializeOwned;

use crate::{AttributeWriter, Error, ExchangeServerVersion, ServiceXmlWriter, ValidationError};

/// How a call reports response messages with an `Error` class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServiceErrorHandling {
    /// Stop at the first error and fail the whole call with it. Outcomes
    /// read before it are discarded.
    #[default]
    ThrowOnError,

    /// Read every response message and return all outcomes, errors
    /// included.
    ReturnErrors,
}

/// An EWS operation, as sent in the body of a request.
///
/// Implementors only describe the operation: its names, the oldest server
/// which supports it, how many response messages answer it, how to check it
/// and how to write its content. Sending and correlating responses is done
/// by [`ServiceCall`](crate::ServiceCall).
pub trait Operation {
    /// The contents of a successful response message.
    type Message: DeserializeOwned;

    /// The name of the operation element, e.g. `EmptyFolder`.
    const NAME: &'static str;

    /// The name of the element wrapping the response, e.g.
    /// `EmptyFolderResponse`.
    const RESPONSE_NAME: &'static str;

    /// The name of each response message, e.g. `EmptyFolderResponseMessage`.
    const RESPONSE_MESSAGE_NAME: &'static str;

    /// The oldest server version which supports the operation.
    const MIN_SERVER_VERSION: ExchangeServerVersion;

    fn error_handling(&self) -> ServiceErrorHandling;

    /// The number of response messages the server sends back, e.g. one per
    /// folder identifier.
    fn expected_response_count(&self) -> usize;

    /// Checks operation-specific parameters against the negotiated version.
    fn validate(&self, version: ExchangeServerVersion) -> Result<(), ValidationError>;

    /// Writes attributes onto the operation element.
    fn write_attributes(&self, _writer: &mut AttributeWriter<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Writes the child elements of the operation element.
    fn write_elements(&self, writer: &mut ServiceXmlWriter) -> Result<(), Error>;
}
