/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The outcome of each response message in an EWS response.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Deserializer};

use crate::{MessageXml, ServerVersionInfo};

/// The status of a single response message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsemessage#responseclass-attribute>
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Warning,
    Error,
}

macro_rules! response_codes {
    ($($(#[$meta:meta])* $code:ident,)+) => {
        /// The status code of a response message.
        ///
        /// Only codes this crate or its consumers act on are given variants.
        /// Every other code is kept verbatim as [`ResponseCode::Other`].
        ///
        /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsecode>
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum ResponseCode {
            $($(#[$meta])* $code,)+
            Other(String),
        }

        impl ResponseCode {
            pub fn as_str(&self) -> &str {
                match self {
                    $(ResponseCode::$code => stringify!($code),)+
                    ResponseCode::Other(code) => code,
                }
            }
        }

        impl From<String> for ResponseCode {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $(stringify!($code) => ResponseCode::$code,)+
                    _ => ResponseCode::Other(value),
                }
            }
        }
    };
}

response_codes! {
    NoError,
    ErrorAccessDenied,
    ErrorCannotDeleteObject,
    ErrorCannotEmptyFolder,
    ErrorDeleteDistinguishedFolder,
    ErrorFolderNotFound,
    ErrorInternalServerError,
    ErrorInvalidIdMalformed,
    ErrorInvalidOperation,
    ErrorInvalidRequest,
    ErrorInvalidServerVersion,
    ErrorItemNotFound,
    ErrorNonExistentMailbox,
    ErrorSchemaValidation,
    /// The server is throttling requests. The accompanying
    /// [`MessageXml`] usually says how long to back off for.
    ErrorServerBusy,
}

impl FromStr for ResponseCode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResponseCode::from(s.to_owned()))
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponseCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(ResponseCode::from)
    }
}

/// The error or warning reported by a response message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseError {
    pub response_code: ResponseCode,
    pub message_text: String,
    pub message_xml: Option<MessageXml>,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message_text.is_empty() {
            write!(f, "{}", self.response_code)
        } else {
            write!(f, "{}: {}", self.response_code, self.message_text)
        }
    }
}

impl std::error::Error for ResponseError {}

/// The outcome of one response message, created once per expected message
/// in the order the messages appear in the response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseOutcome<T> {
    Success(T),

    /// The request unit succeeded, but the server had something to say
    /// about it.
    Warning { message: T, warning: ResponseError },

    Error(ResponseError),
}

impl<T> ResponseOutcome<T> {
    pub fn class(&self) -> ResponseClass {
        match self {
            ResponseOutcome::Success(_) => ResponseClass::Success,
            ResponseOutcome::Warning { .. } => ResponseClass::Warning,
            ResponseOutcome::Error(_) => ResponseClass::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseOutcome::Success(_))
    }

    /// The code and message attached to a warning or error.
    pub fn error(&self) -> Option<&ResponseError> {
        match self {
            ResponseOutcome::Success(_) => None,
            ResponseOutcome::Warning { warning, .. } => Some(warning),
            ResponseOutcome::Error(error) => Some(error),
        }
    }

    pub fn error_code(&self) -> Option<&ResponseCode> {
        self.error().map(|error| &error.response_code)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error().map(|error| error.message_text.as_str())
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ResponseOutcome::Success(message) | ResponseOutcome::Warning { message, .. } => {
                Some(message)
            }
            ResponseOutcome::Error(_) => None,
        }
    }

    /// Converts the outcome into its payload, treating warnings as
    /// successes.
    pub fn into_result(self) -> Result<T, ResponseError> {
        match self {
            ResponseOutcome::Success(message) => Ok(message),
            ResponseOutcome::Warning { message, warning } => {
                log::warn!("response message carried a warning: {warning}");
                Ok(message)
            }
            ResponseOutcome::Error(error) => Err(error),
        }
    }
}

/// The ordered outcomes of a completed call.
///
/// `outcomes[i]` always answers the `i`th unit of the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceResponses<T> {
    outcomes: Vec<ResponseOutcome<T>>,
    server_version_info: Option<ServerVersionInfo>,
}

impl<T> ServiceResponses<T> {
    pub(crate) fn new(
        outcomes: Vec<ResponseOutcome<T>>,
        server_version_info: Option<ServerVersionInfo>,
    ) -> Self {
        ServiceResponses {
            outcomes,
            server_version_info,
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResponseOutcome<T>> {
        self.outcomes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResponseOutcome<T>> {
        self.outcomes.iter()
    }

    /// The version of the server which produced the response, if its
    /// header said.
    pub fn server_version_info(&self) -> Option<&ServerVersionInfo> {
        self.server_version_info.as_ref()
    }

    /// The most severe class among all outcomes.
    pub fn overall_class(&self) -> ResponseClass {
        let mut class = ResponseClass::Success;
        for outcome in &self.outcomes {
            match outcome.class() {
                ResponseClass::Error => return ResponseClass::Error,
                ResponseClass::Warning => class = ResponseClass::Warning,
                ResponseClass::Success => {}
            }
        }

        class
    }

    pub fn into_outcomes(self) -> Vec<ResponseOutcome<T>> {
        self.outcomes
    }
}

impl<T> IntoIterator for ServiceResponses<T> {
    type Item = ResponseOutcome<T>;
    type IntoIter = std::vec::IntoIter<ResponseOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ServiceResponses<T> {
    type Item = &'a ResponseOutcome<T>;
    type IntoIter = std::slice::Iter<'a, ResponseOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
