/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::Deserialize;

use crate::{
    Error, ExchangeServerVersion, MessageXml, Operation, ResponseCode, ServiceXmlWriter,
    XmlNamespace, MESSAGES_NS_URI, SOAP_NS_URI, TYPES_NS_URI,
};

mod reader;
pub use self::reader::ResponseReader;

/// An element that can be found in the `soap:Header` section of a request.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383497>
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Header {
    /// The schema version targeted by the attached request.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/requestserverversion>
    RequestServerVersion { version: ExchangeServerVersion },
}

impl Header {
    fn write_to_xml(&self, writer: &mut ServiceXmlWriter) -> Result<(), Error> {
        match self {
            Header::RequestServerVersion { version } => {
                writer.write_start_element(XmlNamespace::Types, "RequestServerVersion")?;
                writer.write_attribute_value("Version", version)?;
            }
        }

        writer.write_end_element()
    }
}

/// A SOAP envelope containing the body of an EWS operation.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383494>
#[derive(Clone, Debug)]
pub struct Envelope<B> {
    pub headers: Vec<Header>,
    pub body: B,
}

impl<B> Envelope<&B>
where
    B: Operation,
{
    /// Serializes the SOAP envelope as a complete XML document.
    pub fn as_xml_document(&self) -> Result<Vec<u8>, Error> {
        let mut writer = ServiceXmlWriter::new();

        // EWS only ever exchanges XML 1.0 documents encoded as UTF-8.
        writer.write_declaration()?;

        writer.write_start_element(XmlNamespace::Soap, "Envelope")?;
        writer.write_attribute_value("xmlns:soap", SOAP_NS_URI)?;
        writer.write_attribute_value("xmlns:t", TYPES_NS_URI)?;

        writer.write_start_element(XmlNamespace::Soap, "Header")?;
        for header in &self.headers {
            header.write_to_xml(&mut writer)?;
        }
        writer.write_end_element()?;

        writer.write_start_element(XmlNamespace::Soap, "Body")?;
        write_operation(&mut writer, self.body)?;
        writer.write_end_element()?;

        writer.write_end_element()?;

        writer.into_inner()
    }
}

/// Writes the operation element: its name, then its attributes, then its
/// child elements.
///
/// The messages namespace is declared as the default namespace of the
/// operation element. The `t` prefix for the types namespace is expected to
/// be declared by an enclosing element.
pub fn write_operation<Op>(writer: &mut ServiceXmlWriter, operation: &Op) -> Result<(), Error>
where
    Op: Operation,
{
    writer.write_start_element(XmlNamespace::Messages, Op::NAME)?;
    writer.write_attribute_value("xmlns", MESSAGES_NS_URI)?;
    operation.write_attributes(&mut writer.attribute_writer()?)?;
    operation.write_elements(writer)?;

    writer.write_end_element()
}

/// A structured representation of a SOAP fault, indicating an error in an EWS
/// request.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383507>
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Fault {
    /// An error code indicating the fault in the original request.
    pub faultcode: String,

    /// A human-readable description of the error.
    pub faultstring: String,

    /// A URI indicating the SOAP actor responsible for the error.
    pub faultactor: Option<String>,

    /// Clarifying information about EWS-specific errors.
    pub detail: Option<FaultDetail>,
}

/// EWS-specific details regarding a SOAP fault.
///
/// This element is not documented in the EWS reference.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
#[non_exhaustive]
pub struct FaultDetail {
    /// An error code indicating the nature of the issue.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsecode>
    pub response_code: Option<ResponseCode>,

    /// A human-readable description of the error.
    pub message: Option<String>,

    /// Error-specific information to aid in understanding or responding to the
    /// error.
    pub message_xml: Option<MessageXml>,
}
