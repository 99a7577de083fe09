//! File operations behind the connector.
//!
//! Each operation takes resolved [`FileObject`](crate::vfs::FileObject)s and
//! returns a typed outcome; mapping outcomes and errors to an
//! [`OperationResult`](crate::connector::OperationResult) is the
//! connector's job.

mod append;
mod copy;
mod create;
mod delete;
mod exist;
mod list_zip;
mod mv;
mod search;
mod unzip;

pub use append::append;
pub use copy::copy;
pub use create::create;
pub use delete::delete;
pub use exist::exists;
pub use list_zip::list_zip;
pub use mv::move_into;
pub use search::{EntryKind, ListedEntry, search};
pub use unzip::{sanitize_entry_name, unzip};
