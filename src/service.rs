/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    delete_folder::{DeleteFolder, DeleteFolderResponseMessage},
    delete_user_configuration::DeleteUserConfiguration,
    empty_folder::{EmptyFolder, EmptyFolderResponseMessage},
    BaseFolderId, DeleteType, Error, ExchangeServerVersion, FolderIdCollection, Operation,
    RequestOptions, ServiceCall, ServiceErrorHandling, ServiceResponses, Transport,
};

/// A client for an EWS endpoint, reached through a [`Transport`].
///
/// Every method runs a single [`ServiceCall`] to completion.
pub struct ExchangeService<T> {
    transport: T,
    options: RequestOptions,
}

impl<T> ExchangeService<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, RequestOptions::default())
    }

    pub fn with_options(transport: T, options: RequestOptions) -> Self {
        ExchangeService { transport, options }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn server_version(&self) -> ExchangeServerVersion {
        self.transport.negotiated_version()
    }

    /// Sends an operation and returns the outcome of each of its response
    /// messages.
    pub fn execute<Op>(&self, operation: Op) -> Result<ServiceResponses<Op::Message>, Error>
    where
        Op: Operation,
    {
        ServiceCall::new(&self.transport, operation)
            .with_options(self.options.clone())
            .execute()
    }

    /// Performs a [`DeleteUserConfiguration` operation] via EWS.
    ///
    /// [`DeleteUserConfiguration` operation]: https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deleteuserconfiguration-operation
    pub fn delete_user_configuration(
        &self,
        name: &str,
        parent_folder_id: BaseFolderId,
    ) -> Result<(), Error> {
        let responses = self.execute(DeleteUserConfiguration::new(name, parent_folder_id))?;

        for (index, outcome) in responses.into_iter().enumerate() {
            outcome
                .into_result()
                .map_err(|error| Error::ResponseError { index, error })?;
        }

        Ok(())
    }

    /// Performs an [`EmptyFolder` operation] via EWS.
    ///
    /// [`EmptyFolder` operation]: https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/emptyfolder-operation
    pub fn empty_folders(
        &self,
        folder_ids: impl Into<FolderIdCollection>,
        delete_type: DeleteType,
        delete_sub_folders: bool,
        error_handling: ServiceErrorHandling,
    ) -> Result<ServiceResponses<EmptyFolderResponseMessage>, Error> {
        self.execute(EmptyFolder::new(
            folder_ids,
            delete_type,
            delete_sub_folders,
            error_handling,
        ))
    }

    /// Performs a [`DeleteFolder` operation] via EWS.
    ///
    /// [`DeleteFolder` operation]: https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deletefolder-operation
    pub fn delete_folders(
        &self,
        folder_ids: impl Into<FolderIdCollection>,
        delete_type: DeleteType,
        error_handling: ServiceErrorHandling,
    ) -> Result<ServiceResponses<DeleteFolderResponseMessage>, Error> {
        self.execute(DeleteFolder::new(folder_ids, delete_type, error_handling))
    }
}
