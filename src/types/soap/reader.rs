/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Positional reading of EWS response envelopes.
//!
//! The envelope is walked with a streaming reader so response messages can be
//! counted and consumed one at a time. Each message, the SOAP header and any
//! SOAP fault are cut out of the document and deserialized on their own.

use quick_xml::{events::Event, Reader};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    soap::Fault, Error, MessageXml, ProtocolError, ResponseClass, ResponseCode, ResponseError,
    ResponseOutcome, ServerVersionInfo,
};

const ENVELOPE: &str = "Envelope";
const HEADER: &str = "Header";
const BODY: &str = "Body";
const FAULT: &str = "Fault";
const RESPONSE_MESSAGES: &str = "ResponseMessages";
const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseHeader {
    server_version_info: Option<ServerVersionInfo>,
}

/// The status fields common to every response message.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MessageStatus {
    #[serde(rename = "@ResponseClass")]
    response_class: ResponseClass,
    message_text: Option<String>,
    response_code: Option<ResponseCode>,
    message_xml: Option<MessageXml>,
}

/// An element, or the end of one, found while walking the envelope.
enum Found {
    Start { name: String, start: usize },
    Empty { name: String, start: usize },
    End,
    Eof,
}

impl Found {
    fn describe(&self) -> String {
        match self {
            Found::Start { name, .. } | Found::Empty { name, .. } => name.clone(),
            Found::End => "end of element".to_string(),
            Found::Eof => "end of document".to_string(),
        }
    }
}

/// Reads a response envelope one response message at a time.
///
/// Messages must be read in document order, and the reader never looks past
/// the message it is asked for.
pub struct ResponseReader<'a> {
    document: &'a str,
    reader: Reader<&'a [u8]>,
    messages_closed: bool,
}

impl<'a> ResponseReader<'a> {
    pub fn new(document: &'a str) -> Self {
        // The reader skips a byte order mark without counting it in its
        // position, so drop it here to keep positions aligned with `document`.
        let document = document.strip_prefix(BYTE_ORDER_MARK).unwrap_or(document);

        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        ResponseReader {
            document,
            reader,
            messages_closed: false,
        }
    }

    /// Reads up to the first response message of the `response_name`
    /// element, returning the server version information from the SOAP
    /// header if there was any.
    ///
    /// A SOAP fault in place of the response fails with
    /// [`Error::RequestFault`].
    pub fn read_to_response(
        &mut self,
        response_name: &str,
    ) -> Result<Option<ServerVersionInfo>, Error> {
        match self.next_element()? {
            Found::Start { name, .. } if name == ENVELOPE => {}
            found => return Err(unexpected(ENVELOPE, found)),
        }

        let mut server_version_info = None;
        loop {
            match self.next_element()? {
                Found::Start { name, start } if name == HEADER => {
                    let header: ResponseHeader = self.read_element(&name, start)?;
                    server_version_info = header.server_version_info;
                }
                Found::Empty { name, .. } if name == HEADER => {}
                Found::Start { name, .. } if name == BODY => break,
                found => return Err(unexpected(BODY, found)),
            }
        }

        match self.next_element()? {
            Found::Start { name, start } if name == FAULT => {
                let fault: Fault = self.read_element(&name, start)?;
                log::error!("request resulted in a SOAP fault: {}", fault.faultstring);
                return Err(Error::RequestFault(Box::new(fault)));
            }
            Found::Start { name, .. } if name == response_name => {}
            Found::Empty { name, .. } if name == response_name => {
                self.messages_closed = true;
                return Ok(server_version_info);
            }
            found => return Err(unexpected(response_name, found)),
        }

        match self.next_element()? {
            Found::Start { name, .. } if name == RESPONSE_MESSAGES => {}
            Found::Empty { name, .. } if name == RESPONSE_MESSAGES => {
                self.messages_closed = true;
            }
            found => return Err(unexpected(RESPONSE_MESSAGES, found)),
        }

        Ok(server_version_info)
    }

    /// Reads the next `message_name` element, consuming all of it whatever
    /// its class.
    ///
    /// Returns `None` once the list of response messages has ended.
    pub fn next_message<M>(
        &mut self,
        message_name: &str,
        index: usize,
    ) -> Result<Option<ResponseOutcome<M>>, Error>
    where
        M: DeserializeOwned,
    {
        if self.messages_closed {
            return Ok(None);
        }

        let content = match self.next_element()? {
            Found::Start { name, start } if name == message_name => {
                self.element_content(&name, start)?
            }
            Found::Empty { name, start } if name == message_name => {
                self.slice(start, self.position())?
            }
            Found::End => {
                self.messages_closed = true;
                return Ok(None);
            }
            found => return Err(unexpected(message_name, found)),
        };

        let status: MessageStatus = deserialize(content)?;
        let outcome = match status.response_class {
            ResponseClass::Success => ResponseOutcome::Success(deserialize(content)?),
            class => {
                let error = ResponseError {
                    response_code: status
                        .response_code
                        .ok_or(ProtocolError::MissingResponseCode { index })?,
                    message_text: status.message_text.unwrap_or_default(),
                    message_xml: status.message_xml,
                };

                if class == ResponseClass::Warning {
                    ResponseOutcome::Warning {
                        message: deserialize(content)?,
                        warning: error,
                    }
                } else {
                    ResponseOutcome::Error(error)
                }
            }
        };

        Ok(Some(outcome))
    }

    /// Checks that no response message follows the `expected` ones already
    /// read.
    pub fn finish(&mut self, message_name: &str, expected: usize) -> Result<(), Error> {
        if self.messages_closed {
            return Ok(());
        }

        match self.next_element()? {
            Found::End => {
                self.messages_closed = true;
                Ok(())
            }
            Found::Start { name, .. } | Found::Empty { name, .. } if name == message_name => {
                Err(ProtocolError::TooManyResponses { expected }.into())
            }
            found => Err(unexpected(RESPONSE_MESSAGES, found)),
        }
    }

    fn next_element(&mut self) -> Result<Found, Error> {
        loop {
            let start = self.position();

            match self.reader.read_event()? {
                Event::Start(e) => {
                    return Ok(Found::Start {
                        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                        start,
                    })
                }
                Event::Empty(e) => {
                    return Ok(Found::Empty {
                        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                        start,
                    })
                }
                Event::End(_) => return Ok(Found::End),
                Event::Eof => return Ok(Found::Eof),

                // Declarations, comments, processing instructions and
                // whitespace between elements.
                _ => continue,
            }
        }
    }

    /// Consumes the rest of an element whose start tag has just been read,
    /// and returns it in full.
    fn element_content(&mut self, local_name: &str, start: usize) -> Result<&'a str, Error> {
        loop {
            match self.reader.read_event()? {
                Event::End(e) if e.local_name().as_ref() == local_name.as_bytes() => {
                    return self.slice(start, self.position());
                }

                // Skip nested elements whole, so a child sharing the name cannot end the
                // element early.
                Event::Start(e) => {
                    self.reader.read_to_end(e.name())?;
                }

                Event::Eof => {
                    return Err(ProtocolError::UnexpectedEndOfDocument {
                        expected: local_name.to_string(),
                    }
                    .into())
                }
                _ => continue,
            }
        }
    }

    fn read_element<T>(&mut self, local_name: &str, start: usize) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let content = self.element_content(local_name, start)?;
        deserialize(content)
    }

    fn slice(&self, start: usize, end: usize) -> Result<&'a str, Error> {
        let document: &'a str = self.document;
        document.get(start..end).map(str::trim).ok_or_else(|| {
            ProtocolError::UnexpectedEndOfDocument {
                expected: "element content".to_string(),
            }
            .into()
        })
    }

    fn position(&self) -> usize {
        usize::try_from(self.reader.buffer_position()).unwrap_or(usize::MAX)
    }
}

fn unexpected(expected: &str, found: Found) -> Error {
    let error = match found {
        Found::Eof => ProtocolError::UnexpectedEndOfDocument {
            expected: expected.to_string(),
        },
        found => ProtocolError::UnexpectedElement {
            expected: expected.to_string(),
            found: found.describe(),
        },
    };

    error.into()
}

fn deserialize<T>(content: &str) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let de = &mut quick_xml::de::Deserializer::from_str(content);

    // `serde_path_to_error` gives the path within the structure at which
    // deserialization failed, rather than only the immediate error.
    Ok(serde_path_to_error::deserialize(de)?)
}
