/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::Deserialize;

use crate::{
    AttributeWriter, DeleteType, Error, ExchangeServerVersion, FolderIdCollection, Operation,
    ServiceErrorHandling, ServiceXmlWriter, ValidationError, XmlNamespace,
};

/// A request to empty one or more folders.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/emptyfolder>
#[derive(Clone, Debug)]
pub struct EmptyFolder {
    /// The method the EWS server will use to perform deletions.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/emptyfolder#deletetype-attribute>
    pub delete_type: DeleteType,

    /// Whether subfolders should be deleted as part of the operation.
    pub delete_sub_folders: bool,

    /// The folders to empty. One response message is returned per folder.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderids>
    pub folder_ids: FolderIdCollection,

    pub error_handling: ServiceErrorHandling,
}

impl EmptyFolder {
    pub fn new(
        folder_ids: impl Into<FolderIdCollection>,
        delete_type: DeleteType,
        delete_sub_folders: bool,
        error_handling: ServiceErrorHandling,
    ) -> Self {
        EmptyFolder {
            delete_type,
            delete_sub_folders,
            folder_ids: folder_ids.into(),
            error_handling,
        }
    }
}

impl Operation for EmptyFolder {
    type Message = EmptyFolderResponseMessage;

    crate::macros::operation_names!(EmptyFolder);

    const MIN_SERVER_VERSION: ExchangeServerVersion = ExchangeServerVersion::Exchange2010_SP1;

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
        writer.write_attribute_value("DeleteSubFolders", &self.delete_sub_folders);

        Ok(())
    }

    fn write_elements(&self, writer: &mut ServiceXmlWriter) -> Result<(), Error> {
        self.folder_ids
            .write_to_xml(writer, XmlNamespace::Messages, "FolderIds")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct EmptyFolderResponseMessage {}
