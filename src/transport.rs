/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The boundary between this crate and whatever actually carries bytes to an
//! EWS server.
//!
//! Authentication, TLS, HTTP, retries and throttling back-off all live on the
//! other side of [`Transport`]. The framework only needs to hand over a
//! serialized envelope, read back the reply, and know which server version
//! the session negotiated.

use std::io::Read;

use thiserror::Error;

use crate::ExchangeServerVersion;

/// A request/reply exchange with an EWS endpoint.
///
/// One [`ServiceCall`](crate::ServiceCall) uses the transport for exactly one
/// `send`, and reads the reply to completion before returning. No locking is
/// added around the transport: implementations shared between threads must
/// provide their own synchronization.
pub trait Transport {
    /// The body of a reply, read to completion by the caller.
    type Reply: Read;

    /// Sends a serialized SOAP envelope and returns the body of the reply.
    fn send(&self, envelope: &[u8]) -> Result<Self::Reply, TransportError>;

    /// The server version negotiated for this session.
    fn negotiated_version(&self) -> ExchangeServerVersion;
}

impl<T> Transport for &T
where
    T: Transport,
{
    type Reply = T::Reply;

    fn send(&self, envelope: &[u8]) -> Result<Self::Reply, TransportError> {
        (**self).send(envelope)
    }

    fn negotiated_version(&self) -> ExchangeServerVersion {
        (**self).negotiated_version()
    }
}

/// Failures reported by a [`Transport`], or hit while reading its reply.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("an I/O error occurred during the exchange: {0}")]
    Io(#[from] std::io::Error),

    #[error("the exchange was cancelled")]
    Cancelled,

    #[error("the exchange timed out")]
    TimedOut,

    #[error("the server responded with HTTP status {0}")]
    Status(u16),

    #[error("failed to authenticate")]
    Authentication,

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}
