/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

/// Declares the element names of an [`Operation`] implementation.
///
/// EWS names the response to an operation `Foo` `FooResponse`, and each of
/// the messages it contains `FooResponseMessage`. This macro is meant to be
/// used inside an `impl Operation for Foo` block:
///
/// ```ignore
/// impl Operation for EmptyFolder {
///     crate::macros::operation_names!(EmptyFolder);
///     // ...
/// }
/// ```
///
/// [`Operation`]: crate::Operation
macro_rules! operation_names {
    ($name:ident) => {
        const NAME: &'static str = stringify!($name);
        const RESPONSE_NAME: &'static str = concat!(stringify!($name), "Response");
        const RESPONSE_MESSAGE_NAME: &'static str = concat!(stringify!($name), "ResponseMessage");
    };
}

pub(crate) use operation_names;
