/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::{
    BaseFolderId, Error, ExchangeServerVersion, ServiceXmlWriter, ValidationError, XmlNamespace,
};

/// What [`FolderIdCollection::add`] does with an identifier already in the
/// collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Leave the collection unchanged.
    #[default]
    Ignore,

    /// Fail with [`ValidationError::DuplicateIdentifier`].
    Reject,
}

/// An ordered list of folder identifiers.
///
/// Insertion order is the order in which identifiers are written to a
/// request, and so the order of the response messages answering them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FolderIdCollection {
    ids: Vec<BaseFolderId>,
    duplicate_policy: DuplicatePolicy,
}

impl FolderIdCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(duplicate_policy: DuplicatePolicy) -> Self {
        FolderIdCollection {
            ids: Vec::new(),
            duplicate_policy,
        }
    }

    /// Appends an identifier.
    ///
    /// Returns `Ok(false)` if the identifier was already present and the
    /// collection ignores duplicates.
    pub fn add(&mut self, id: BaseFolderId) -> Result<bool, ValidationError> {
        if self.duplicate_policy == DuplicatePolicy::Reject && self.ids.contains(&id) {
            return Err(ValidationError::DuplicateIdentifier(id));
        }

        Ok(self.push_unique(id))
    }

    /// Builds a collection from `ids` with the given duplicate policy.
    ///
    /// Unlike collecting into a collection, which always ignores duplicates,
    /// this fails on the first duplicate under [`DuplicatePolicy::Reject`].
    pub fn try_from_iter<I>(
        ids: I,
        duplicate_policy: DuplicatePolicy,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = BaseFolderId>,
    {
        let mut collection = Self::with_duplicate_policy(duplicate_policy);
        for id in ids {
            collection.add(id)?;
        }

        Ok(collection)
    }

    fn push_unique(&mut self, id: BaseFolderId) -> bool {
        if self.ids.contains(&id) {
            log::debug!("dropping duplicate folder id {id:?}");
            return false;
        }

        self.ids.push(id);

        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BaseFolderId> {
        self.ids.iter()
    }

    /// Checks every identifier against the given server version.
    pub fn validate(&self, version: ExchangeServerVersion) -> Result<(), ValidationError> {
        self.ids.iter().try_for_each(|id| id.validate(version))
    }

    /// Checks that the collection is not empty, then validates every
    /// identifier.
    pub fn validate_required(
        &self,
        name: &'static str,
        version: ExchangeServerVersion,
    ) -> Result<(), ValidationError> {
        if self.ids.is_empty() {
            return Err(ValidationError::EmptyCollection(name));
        }

        self.validate(version)
    }

    /// Writes a `wrapper_name` element with one child per identifier.
    pub fn write_to_xml(
        &self,
        writer: &mut ServiceXmlWriter,
        namespace: XmlNamespace,
        wrapper_name: &str,
    ) -> Result<(), Error> {
        writer.write_start_element(namespace, wrapper_name)?;
        for id in &self.ids {
            id.write_to_xml(writer)?;
        }

        writer.write_end_element()
    }
}

/// Builds a collection which ignores duplicates.
impl FromIterator<BaseFolderId> for FolderIdCollection {
    fn from_iter<I: IntoIterator<Item = BaseFolderId>>(iter: I) -> Self {
        let mut collection = FolderIdCollection::new();
        for id in iter {
            collection.push_unique(id);
        }

        collection
    }
}

impl From<Vec<BaseFolderId>> for FolderIdCollection {
    fn from(ids: Vec<BaseFolderId>) -> Self {
        ids.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a FolderIdCollection {
    type Item = &'a BaseFolderId;
    type IntoIter = std::slice::Iter<'a, BaseFolderId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
