/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{borrow::Cow, fmt, str::FromStr};

use crate::{
    Error, ExchangeServerVersion, ServiceXmlWriter, ValidationError, XmlAttributeValue,
    XmlNamespace,
};

pub mod response;
pub use self::response::{
    ResponseClass, ResponseCode, ResponseError, ResponseOutcome, ServiceResponses,
};
pub mod message_xml;
pub use self::message_xml::MessageXml;

pub const MESSAGES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
pub const SOAP_NS_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const TYPES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/types";

pub const SOAP_NS_PREFIX: &str = "soap";
pub const TYPES_NS_PREFIX: &str = "t";

/// The manner in which items or folders are deleted.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/deletetype>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeleteType {
    #[default]
    HardDelete,
    MoveToDeletedItems,
    SoftDelete,
}

impl DeleteType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeleteType::HardDelete => "HardDelete",
            DeleteType::MoveToDeletedItems => "MoveToDeletedItems",
            DeleteType::SoftDelete => "SoftDelete",
        }
    }
}

impl XmlAttributeValue for DeleteType {
    fn to_attribute_value(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// An identifier for an Exchange folder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseFolderId {
    /// An identifier for an arbitrary folder.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderid>.
    FolderId {
        id: String,
        change_key: Option<String>,
    },

    /// An identifier for referencing a folder by name, e.g. "inbox" or
    /// "junkemail", optionally in a mailbox other than the caller's.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/distinguishedfolderid>.
    DistinguishedFolderId {
        id: WellKnownFolderName,
        change_key: Option<String>,
        mailbox: Option<String>,
    },
}

impl BaseFolderId {
    /// A folder identifier without a change key.
    pub fn folder_id(id: impl Into<String>) -> Self {
        BaseFolderId::FolderId {
            id: id.into(),
            change_key: None,
        }
    }

    /// A well-known folder in the caller's own mailbox.
    pub fn distinguished(id: WellKnownFolderName) -> Self {
        BaseFolderId::DistinguishedFolderId {
            id,
            change_key: None,
            mailbox: None,
        }
    }

    /// Checks that the identifier is usable against a server of the given
    /// version.
    pub fn validate(&self, version: ExchangeServerVersion) -> Result<(), ValidationError> {
        match self {
            BaseFolderId::FolderId { id, .. } => {
                if id.is_empty() {
                    return Err(ValidationError::EmptyFolderId);
                }
            }

            BaseFolderId::DistinguishedFolderId { id, mailbox, .. } => {
                let required = id.min_server_version();
                if version < required {
                    return Err(ValidationError::FolderNotSupported {
                        folder: *id,
                        required,
                    });
                }

                if mailbox.as_deref().is_some_and(str::is_empty) {
                    return Err(ValidationError::InvalidParameter {
                        name: "mailbox",
                        reason: "email address must not be empty",
                    });
                }
            }
        }

        Ok(())
    }

    pub(crate) fn write_to_xml(&self, writer: &mut ServiceXmlWriter) -> Result<(), Error> {
        match self {
            BaseFolderId::FolderId { id, change_key } => {
                writer.write_start_element(XmlNamespace::Types, "FolderId")?;
                writer.write_attribute_value("Id", id)?;
                if let Some(change_key) = change_key {
                    writer.write_attribute_value("ChangeKey", change_key)?;
                }
            }

            BaseFolderId::DistinguishedFolderId {
                id,
                change_key,
                mailbox,
            } => {
                writer.write_start_element(XmlNamespace::Types, "DistinguishedFolderId")?;
                writer.write_attribute_value("Id", id)?;
                if let Some(change_key) = change_key {
                    writer.write_attribute_value("ChangeKey", change_key)?;
                }

                if let Some(mailbox) = mailbox {
                    writer.write_start_element(XmlNamespace::Types, "Mailbox")?;
                    writer.write_element_value(XmlNamespace::Types, "EmailAddress", mailbox)?;
                    writer.write_end_element()?;
                }
            }
        }

        writer.write_end_element()
    }
}

macro_rules! well_known_folders {
    ($($variant:ident => $id:literal since $version:ident,)+) => {
        /// The names of folders which can be referenced by a
        /// [`BaseFolderId::DistinguishedFolderId`].
        ///
        /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/distinguishedfolderid#id-attribute>
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum WellKnownFolderName {
            $($variant,)+
        }

        impl WellKnownFolderName {
            /// The identifier used for this folder on the wire.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(WellKnownFolderName::$variant => $id,)+
                }
            }

            /// The oldest server version which knows about this folder.
            pub fn min_server_version(self) -> ExchangeServerVersion {
                match self {
                    $(WellKnownFolderName::$variant => ExchangeServerVersion::$version,)+
                }
            }
        }

        impl FromStr for WellKnownFolderName {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok(WellKnownFolderName::$variant),)+
                    _ => Err(ValidationError::InvalidParameter {
                        name: "folder name",
                        reason: "not a well-known folder name",
                    }),
                }
            }
        }
    };
}

well_known_folders! {
    Calendar => "calendar" since Exchange2007_SP1,
    Contacts => "contacts" since Exchange2007_SP1,
    DeletedItems => "deleteditems" since Exchange2007_SP1,
    Drafts => "drafts" since Exchange2007_SP1,
    Inbox => "inbox" since Exchange2007_SP1,
    Journal => "journal" since Exchange2007_SP1,
    Notes => "notes" since Exchange2007_SP1,
    Outbox => "outbox" since Exchange2007_SP1,
    SentItems => "sentitems" since Exchange2007_SP1,
    Tasks => "tasks" since Exchange2007_SP1,
    MsgFolderRoot => "msgfolderroot" since Exchange2007_SP1,
    PublicFoldersRoot => "publicfoldersroot" since Exchange2007_SP1,
    Root => "root" since Exchange2007_SP1,
    JunkEmail => "junkemail" since Exchange2007_SP1,
    SearchFolders => "searchfolders" since Exchange2007_SP1,
    VoiceMail => "voicemail" since Exchange2007_SP1,
    RecoverableItemsRoot => "recoverableitemsroot" since Exchange2010_SP1,
    RecoverableItemsDeletions => "recoverableitemsdeletions" since Exchange2010_SP1,
    RecoverableItemsVersions => "recoverableitemsversions" since Exchange2010_SP1,
    RecoverableItemsPurges => "recoverableitemspurges" since Exchange2010_SP1,
    ArchiveRoot => "archiveroot" since Exchange2010_SP1,
    ArchiveMsgFolderRoot => "archivemsgfolderroot" since Exchange2010_SP1,
    ArchiveDeletedItems => "archivedeleteditems" since Exchange2010_SP1,
    ArchiveRecoverableItemsRoot => "archiverecoverableitemsroot" since Exchange2010_SP1,
    ArchiveRecoverableItemsDeletions => "archiverecoverableitemsdeletions" since Exchange2010_SP1,
    ArchiveRecoverableItemsVersions => "archiverecoverableitemsversions" since Exchange2010_SP1,
    ArchiveRecoverableItemsPurges => "archiverecoverableitemspurges" since Exchange2010_SP1,
    SyncIssues => "syncissues" since Exchange2013,
    Conflicts => "conflicts" since Exchange2013,
    LocalFailures => "localfailures" since Exchange2013,
    ServerFailures => "serverfailures" since Exchange2013,
    RecipientCache => "recipientcache" since Exchange2013,
    QuickContacts => "quickcontacts" since Exchange2013,
    ConversationHistory => "conversationhistory" since Exchange2013,
    ToDoSearch => "todosearch" since Exchange2013,
}

impl fmt::Display for WellKnownFolderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl XmlAttributeValue for WellKnownFolderName {
    fn to_attribute_value(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}
