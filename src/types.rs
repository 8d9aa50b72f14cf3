/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

mod common;
mod folder_ids;
mod operations;
mod server_version;

pub use common::*;
pub use folder_ids::*;
pub use operations::*;
pub use server_version::*;

pub mod soap;

pub mod delete_folder;
pub mod delete_user_configuration;
pub mod empty_folder;
