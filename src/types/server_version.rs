/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{borrow::Cow, fmt};

use serde::Deserialize;

use crate::{Error, XmlAttributeValue};

/// The Exchange Server version identifiers allowed in `RequestServerVersion`
/// headers.
///
/// Variants are declared oldest first, so comparisons follow release order.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/requestserverversion#version-attribute-values>
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum ExchangeServerVersion {
    Exchange2007,
    Exchange2007_SP1,
    Exchange2010,
    Exchange2010_SP1,
    Exchange2010_SP2,
    Exchange2013,
    Exchange2013_SP1,
}

impl ExchangeServerVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ExchangeServerVersion::Exchange2007 => "Exchange2007",
            ExchangeServerVersion::Exchange2007_SP1 => "Exchange2007_SP1",
            ExchangeServerVersion::Exchange2010 => "Exchange2010",
            ExchangeServerVersion::Exchange2010_SP1 => "Exchange2010_SP1",
            ExchangeServerVersion::Exchange2010_SP2 => "Exchange2010_SP2",
            ExchangeServerVersion::Exchange2013 => "Exchange2013",
            ExchangeServerVersion::Exchange2013_SP1 => "Exchange2013_SP1",
        }
    }
}

impl fmt::Display for ExchangeServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the provided string into a known version identifier.
impl TryFrom<&str> for ExchangeServerVersion {
    /// If the provided string could not be turned into a known version
    /// identifier, [`Error::UnknownServerVersion`] is returned.
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Exchange2007" => Ok(ExchangeServerVersion::Exchange2007),
            "Exchange2007_SP1" => Ok(ExchangeServerVersion::Exchange2007_SP1),
            "Exchange2010" => Ok(ExchangeServerVersion::Exchange2010),
            "Exchange2010_SP1" => Ok(ExchangeServerVersion::Exchange2010_SP1),
            "Exchange2010_SP2" => Ok(ExchangeServerVersion::Exchange2010_SP2),
            "Exchange2013" => Ok(ExchangeServerVersion::Exchange2013),
            "Exchange2013_SP1" => Ok(ExchangeServerVersion::Exchange2013_SP1),

            _ => Err(Error::UnknownServerVersion(value.to_owned())),
        }
    }
}

// Consumers persist the version negotiated with a given server as a string.
impl From<ExchangeServerVersion> for String {
    fn from(value: ExchangeServerVersion) -> Self {
        value.as_str().into()
    }
}

impl XmlAttributeValue for ExchangeServerVersion {
    fn to_attribute_value(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// The version information of the Exchange Server instance that generated
/// the attached response.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/serverversioninfo>
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ServerVersionInfo {
    #[serde(rename = "@MajorVersion")]
    pub major_version: Option<String>,

    #[serde(rename = "@MinorVersion")]
    pub minor_version: Option<String>,

    #[serde(rename = "@MajorBuildNumber")]
    pub major_build_number: Option<String>,

    #[serde(rename = "@MinorBuildNumber")]
    pub minor_build_number: Option<String>,

    #[serde(rename = "@Version")]
    pub version: Option<String>,
}

impl ServerVersionInfo {
    /// The version identifier reported by the server, if it is one this crate
    /// knows about.
    pub fn exchange_version(&self) -> Option<ExchangeServerVersion> {
        self.version
            .as_deref()
            .and_then(|version| ExchangeServerVersion::try_from(version).ok())
    }
}
