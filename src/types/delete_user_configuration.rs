/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::Deserialize;

use crate::{
    BaseFolderId, Error, ExchangeServerVersion, Operation, ServiceErrorHandling,
    ServiceXmlWriter, ValidationError, XmlNamespace,
};

/// A request to delete a user configuration object, i.e. a named blob of
/// settings stored on a folder.
///
/// Both the name and the parent folder must be set before the request is
/// sent. Any error reported by the server fails the call.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deleteuserconfiguration-operation>
#[derive(Clone, Debug, Default)]
pub struct DeleteUserConfiguration {
    pub name: Option<String>,
    pub parent_folder_id: Option<BaseFolderId>,
}

impl DeleteUserConfiguration {
    pub fn new(name: impl Into<String>, parent_folder_id: BaseFolderId) -> Self {
        DeleteUserConfiguration {
            name: Some(name.into()),
            parent_folder_id: Some(parent_folder_id),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent_folder_id(mut self, parent_folder_id: BaseFolderId) -> Self {
        self.parent_folder_id = Some(parent_folder_id);
        self
    }
}

impl Operation for DeleteUserConfiguration {
    type Message = DeleteUserConfigurationResponseMessage;

    crate::macros::operation_names!(DeleteUserConfiguration);

    const MIN_SERVER_VERSION: ExchangeServerVersion = ExchangeServerVersion::Exchange2010;

    fn error_handling(&self) -> ServiceErrorHandling {
        ServiceErrorHandling::ThrowOnError
    }

    fn expected_response_count(&self) -> usize {
        1
    }

    fn validate(&self, version: ExchangeServerVersion) -> Result<(), ValidationError> {
        let name = self
            .name
            .as_deref()
            .ok_or(ValidationError::MissingParameter("name"))?;
        let parent_folder_id = self
            .parent_folder_id
            .as_ref()
            .ok_or(ValidationError::MissingParameter("parentFolderId"))?;

        if name.is_empty() {
            return Err(ValidationError::InvalidParameter {
                name: "name",
                reason: "must not be empty",
            });
        }

        parent_folder_id.validate(version)
    }

    fn write_elements(&self, writer: &mut ServiceXmlWriter) -> Result<(), Error> {
        let name = self
            .name
            .as_ref()
            .ok_or(ValidationError::MissingParameter("name"))?;
        let parent_folder_id = self
            .parent_folder_id
            .as_ref()
            .ok_or(ValidationError::MissingParameter("parentFolderId"))?;

        writer.write_start_element(XmlNamespace::Messages, "UserConfigurationName")?;
        writer.write_attribute_value("Name", name)?;
        parent_folder_id.write_to_xml(writer)?;

        writer.write_end_element()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteUserConfigurationResponseMessage {}
