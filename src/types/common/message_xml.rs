/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::fmt;

use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer,
};

/// Semi-structured data for diagnosing or responding to an EWS error.
///
/// The possible contents of this element are not documented. Contents with a
/// known meaning get their own variant; everything else is kept as a flat
/// list of name/value pairs in [`MessageXml::Other`].
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/messagexml>
// Two shapes have been observed, never mixed and never nested:
// - <t:Value Name="Foo">value</t:Value>
// - <t:Foo>value</t:Foo>
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageXml {
    ServerBusy(ServerBusy),
    Other(MessageXmlElements),
}

impl MessageXml {
    /// How long the server asked clients to wait before sending more
    /// requests, if it said.
    pub fn back_off_milliseconds(&self) -> Option<u32> {
        match self {
            MessageXml::ServerBusy(server_busy) => Some(server_busy.back_off_milliseconds),
            MessageXml::Other(_) => None,
        }
    }
}

/// Data associated with a [`ResponseCode::ErrorServerBusy`](crate::ResponseCode::ErrorServerBusy).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerBusy {
    /// The duration in milliseconds to wait before making additional requests.
    pub back_off_milliseconds: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageXmlElements {
    pub elements: Vec<MessageXmlElement>,
}

/// One name/value pair, whichever of the two shapes it was written in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageXmlElement {
    /// `<t:Value Name="name">value</t:Value>`
    Value { name: String, value: String },

    /// `<t:name>value</t:name>`
    Tagged { name: String, value: String },
}

impl MessageXmlElement {
    pub fn name(&self) -> &str {
        match self {
            MessageXmlElement::Value { name, .. } | MessageXmlElement::Tagged { name, .. } => name,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            MessageXmlElement::Value { value, .. } | MessageXmlElement::Tagged { value, .. } => {
                value
            }
        }
    }
}

#[derive(Deserialize)]
struct NamedValue {
    #[serde(rename = "@Name")]
    name: String,

    #[serde(rename = "$text", default)]
    value: String,
}

// Unknown keys, such as namespace declarations, are ignored.
#[derive(Deserialize)]
struct TaggedValue {
    #[serde(rename = "$text", default)]
    value: String,
}

struct MessageXmlVisitor;

impl<'de> Visitor<'de> for MessageXmlVisitor {
    type Value = MessageXml;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("non-recursive XML elements with @Name or no attributes")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut elements = Vec::new();

        while let Some(key) = access.next_key::<String>()? {
            if key.starts_with('@') || key == "$text" {
                access.next_value::<IgnoredAny>()?;
            } else if key == "Value" {
                let NamedValue { name, value } = access.next_value()?;
                elements.push(MessageXmlElement::Value { name, value });
            } else {
                let TaggedValue { value } = access.next_value()?;
                elements.push(MessageXmlElement::Tagged { name: key, value });
            }
        }

        let back_off = elements.iter().find_map(|element| match element {
            MessageXmlElement::Value { name, value } if name == "BackOffMilliseconds" => {
                value.trim().parse::<u32>().ok()
            }
            _ => None,
        });

        Ok(match back_off {
            Some(back_off_milliseconds) => MessageXml::ServerBusy(ServerBusy {
                back_off_milliseconds,
            }),
            None => MessageXml::Other(MessageXmlElements { elements }),
        })
    }
}

impl<'de> Deserialize<'de> for MessageXml {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MessageXmlVisitor)
    }
}
