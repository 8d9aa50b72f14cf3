/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::Deserialize;

use crate::{
    AttributeWriter, DeleteType, Error, ExchangeServerVersion, FolderIdCollection, Operation,
    ServiceErrorHandling, ServiceXmlWriter, ValidationError, XmlNamespace,
};

/// A request to delete one or more folders.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deletefolder>
#[derive(Clone, Debug)]
pub struct DeleteFolder {
    /// The method the EWS server will use to perform the deletion.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deletefolder#deletetype-attribute>
    pub delete_type: DeleteType,

    /// A list of folders to delete.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderids>
    pub folder_ids: FolderIdCollection,

    pub error_handling: ServiceErrorHandling,
}

impl DeleteFolder {
    pub fn new(
        folder_ids: impl Into<FolderIdCollection>,
        delete_type: DeleteType,
        error_handling: ServiceErrorHandling,
    ) -> Self {
        DeleteFolder {
            delete_type,
            folder_ids: folder_ids.into(),
            error_handling,
        }
    }
}

impl Operation for DeleteFolder {
    type Message = DeleteFolderResponseMessage;

    crate::macros::operation_names!(DeleteFolder);

    const MIN_SERVER_VERSION: ExchangeServerVersion = ExchangeServerVersion::Exchange2007_SP1;

    fn error_handling(&self) -> ServiceErrorHandling {
        self.error_handling
    }

    fn expected_response_count(&self) -> usize {
        self.folder_ids.len()
    }

    fn validate(&self, version: ExchangeServerVersion) -> Result<(), ValidationError> {
        self.folder_ids.validate_required("FolderIds", version)
    }

    fn write_attributes(&self, writer: &mut AttributeWriter<'_>) -> Result<(), Error> {
        writer.write_attribute_value("DeleteType", &self.delete_type);

        Ok(())
    }

    fn write_elements(&self, writer: &mut ServiceXmlWriter) -> Result<(), Error> {
        self.folder_ids
            .write_to_xml(writer, XmlNamespace::Messages, "FolderIds")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteFolderResponseMessage {}
