/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{
    cell::RefCell,
    io::{self, Read},
};

use crate::{
    soap::write_operation, ExchangeServerVersion, Operation, ServiceXmlWriter, Transport,
    TransportError,
};

enum Reply {
    Document(String),
    FailSend(fn() -> TransportError),
    FailMidRead { document: String, after: usize },
}

/// A [`Transport`] which records every envelope sent through it and answers
/// with a canned reply.
pub struct MockTransport {
    version: ExchangeServerVersion,
    reply: Reply,
    sent: RefCell<Vec<Vec<u8>>>,
}

impl MockTransport {
    pub fn new(version: ExchangeServerVersion, reply: impl Into<String>) -> Self {
        Self::with_reply(version, Reply::Document(reply.into()))
    }

    /// A transport whose `send` always fails with the error `make_error`
    /// builds.
    pub fn failing_send(
        version: ExchangeServerVersion,
        make_error: fn() -> TransportError,
    ) -> Self {
        Self::with_reply(version, Reply::FailSend(make_error))
    }

    /// A transport whose reply aborts after `after` bytes have been read.
    pub fn failing_mid_read(
        version: ExchangeServerVersion,
        reply: impl Into<String>,
        after: usize,
    ) -> Self {
        Self::with_reply(
            version,
            Reply::FailMidRead {
                document: reply.into(),
                after,
            },
        )
    }

    fn with_reply(version: ExchangeServerVersion, reply: Reply) -> Self {
        MockTransport {
            version,
            reply,
            sent: RefCell::new(Vec::new()),
        }
    }

    pub fn send_count(&self) -> usize {
        self.sent.borrow().len()
    }

    /// The last envelope sent, as a string.
    pub fn last_request(&self) -> String {
        let sent = self.sent.borrow();
        let last = sent.last().expect("a request should have been sent");

        String::from_utf8(last.clone()).expect("request should be UTF-8")
    }
}

impl Transport for MockTransport {
    type Reply = MockReply;

    fn send(&self, envelope: &[u8]) -> Result<Self::Reply, TransportError> {
        self.sent.borrow_mut().push(envelope.to_vec());

        match &self.reply {
            Reply::Document(document) => Ok(MockReply::new(document, None)),
            Reply::FailSend(make_error) => Err(make_error()),
            Reply::FailMidRead { document, after } => Ok(MockReply::new(document, Some(*after))),
        }
    }

    fn negotiated_version(&self) -> ExchangeServerVersion {
        self.version
    }
}

/// A reply body which can be made to fail partway through.
pub struct MockReply {
    data: Vec<u8>,
    position: usize,
    fail_after: Option<usize>,
}

impl MockReply {
    fn new(document: &str, fail_after: Option<usize>) -> Self {
        MockReply {
            data: document.as_bytes().to_vec(),
            position: 0,
            fail_after,
        }
    }
}

impl Read for MockReply {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut end = self.data.len();
        if let Some(fail_after) = self.fail_after {
            if self.position >= fail_after {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionAborted,
                    "connection aborted mid-response",
                ));
            }
            end = end.min(fail_after);
        }

        let available = &self.data[self.position..end];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position += count;

        Ok(count)
    }
}

/// Builds a complete response envelope holding the given response messages.
pub fn response_envelope(response_name: &str, messages: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header>
    <h:ServerVersionInfo MajorVersion="15" MinorVersion="20" MajorBuildNumber="7452" MinorBuildNumber="50" Version="V2018_01_08" xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"/>
  </s:Header>
  <s:Body>
    <m:{response_name} xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
      <m:ResponseMessages>
        {}
      </m:ResponseMessages>
    </m:{response_name}>
  </s:Body>
</s:Envelope>"#,
        messages.join("\n        ")
    )
}

pub fn success_message(message_name: &str, content: &str) -> String {
    format!(
        r#"<m:{message_name} ResponseClass="Success"><m:ResponseCode>NoError</m:ResponseCode>{content}</m:{message_name}>"#
    )
}

pub fn warning_message(message_name: &str, response_code: &str, message_text: &str) -> String {
    failure_message("Warning", message_name, response_code, message_text)
}

pub fn error_message(message_name: &str, response_code: &str, message_text: &str) -> String {
    failure_message("Error", message_name, response_code, message_text)
}

fn failure_message(
    response_class: &str,
    message_name: &str,
    response_code: &str,
    message_text: &str,
) -> String {
    format!(
        r#"<m:{message_name} ResponseClass="{response_class}"><m:MessageText>{message_text}</m:MessageText><m:ResponseCode>{response_code}</m:ResponseCode><m:DescriptiveLinkKey>0</m:DescriptiveLinkKey></m:{message_name}>"#
    )
}

/// Assert the expected result of writing an operation element.
pub fn assert_written_operation<Op: Operation>(operation: &Op, expected_xml_content: &str) {
    let mut writer = ServiceXmlWriter::new();
    write_operation(&mut writer, operation).unwrap();

    let buf = writer.into_inner().unwrap();
    let actual_xml_content = std::str::from_utf8(buf.as_slice()).unwrap();

    assert_eq!(actual_xml_content, expected_xml_content);
}
