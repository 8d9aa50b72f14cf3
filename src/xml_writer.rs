/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A streaming XML writer for EWS request bodies.
//!
//! [`ServiceXmlWriter`] keeps the start tag of the most recently opened
//! element pending until something is written inside it, so attributes can
//! be added after the element has been opened. An element closed while its
//! start tag is still pending is written as an empty element (`<t:Foo/>`).

use std::borrow::Cow;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{
    types::{SOAP_NS_PREFIX, TYPES_NS_PREFIX},
    Error,
};

/// The namespace an element is written in.
///
/// The messages namespace is expected to be declared as the default
/// namespace on the operation element, so elements in it are unprefixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XmlNamespace {
    Messages,
    Types,
    Soap,
}

impl XmlNamespace {
    fn prefix(self) -> Option<&'static str> {
        match self {
            XmlNamespace::Messages => None,
            XmlNamespace::Types => Some(TYPES_NS_PREFIX),
            XmlNamespace::Soap => Some(SOAP_NS_PREFIX),
        }
    }

    fn qualify(self, local_name: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{local_name}"),
            None => local_name.to_owned(),
        }
    }
}

/// A value which can be written as the value of an XML attribute.
pub trait XmlAttributeValue {
    fn to_attribute_value(&self) -> Cow<'_, str>;
}

impl XmlAttributeValue for str {
    fn to_attribute_value(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl XmlAttributeValue for String {
    fn to_attribute_value(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl XmlAttributeValue for bool {
    fn to_attribute_value(&self) -> Cow<'_, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }
}

/// Writes attributes onto a start tag which has not been written yet.
pub struct AttributeWriter<'w> {
    start: &'w mut BytesStart<'static>,
}

impl AttributeWriter<'_> {
    pub fn write_attribute_value<V>(&mut self, name: &str, value: &V)
    where
        V: XmlAttributeValue + ?Sized,
    {
        self.start
            .push_attribute((name, value.to_attribute_value().as_ref()));
    }
}

pub struct ServiceXmlWriter {
    writer: Writer<Vec<u8>>,
    pending: Option<BytesStart<'static>>,
    open_elements: Vec<String>,
}

impl Default for ServiceXmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceXmlWriter {
    pub fn new() -> Self {
        ServiceXmlWriter {
            writer: Writer::new(Vec::new()),
            pending: None,
            open_elements: Vec::new(),
        }
    }

    /// Writes an XML 1.0 declaration with UTF-8 encoding.
    pub fn write_declaration(&mut self) -> Result<(), Error> {
        if !self.open_elements.is_empty() {
            return Err(Error::WriterState(
                "declaration must precede the root element",
            ));
        }

        self.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
    }

    /// Opens an element. Its start tag stays pending, and accepts
    /// attributes, until content is written or the element is closed.
    pub fn write_start_element(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
    ) -> Result<(), Error> {
        self.flush_pending()?;

        let name = namespace.qualify(local_name);
        self.pending = Some(BytesStart::new(name.clone()));
        self.open_elements.push(name);

        Ok(())
    }

    pub fn write_attribute_value<V>(&mut self, name: &str, value: &V) -> Result<(), Error>
    where
        V: XmlAttributeValue + ?Sized,
    {
        self.attribute_writer()?.write_attribute_value(name, value);

        Ok(())
    }

    /// Gives access to the pending start tag, for code which should only
    /// ever write attributes.
    pub fn attribute_writer(&mut self) -> Result<AttributeWriter<'_>, Error> {
        let start = self.pending.as_mut().ok_or(Error::WriterState(
            "attributes can only be written on a pending start tag",
        ))?;

        Ok(AttributeWriter { start })
    }

    pub fn write_text(&mut self, text: &str) -> Result<(), Error> {
        if self.open_elements.is_empty() {
            return Err(Error::WriterState("text must be written inside an element"));
        }

        self.flush_pending()?;
        self.write_event(Event::Text(BytesText::new(text)))
    }

    /// Writes an element containing only the given text.
    pub fn write_element_value(
        &mut self,
        namespace: XmlNamespace,
        local_name: &str,
        value: &str,
    ) -> Result<(), Error> {
        self.write_start_element(namespace, local_name)?;
        self.write_text(value)?;
        self.write_end_element()
    }

    /// Closes the most recently opened element.
    pub fn write_end_element(&mut self) -> Result<(), Error> {
        let name = self
            .open_elements
            .pop()
            .ok_or(Error::WriterState("no element is open"))?;

        match self.pending.take() {
            Some(start) => self.write_event(Event::Empty(start)),
            None => self.write_event(Event::End(BytesEnd::new(name))),
        }
    }

    /// Returns the written document.
    ///
    /// Fails if any element has been left open.
    pub fn into_inner(self) -> Result<Vec<u8>, Error> {
        if let Some(name) = self.open_elements.last() {
            log::error!("XML writer finished with `{name}` still open");
            return Err(Error::WriterState("document has unclosed elements"));
        }

        Ok(self.writer.into_inner())
    }

    fn flush_pending(&mut self) -> Result<(), Error> {
        match self.pending.take() {
            Some(start) => self.write_event(Event::Start(start)),
            None => Ok(()),
        }
    }

    fn write_event(&mut self, event: Event<'_>) -> Result<(), Error> {
        self.writer
            .write_event(event)
            .map_err(quick_xml::Error::from)?;

        Ok(())
    }
}
