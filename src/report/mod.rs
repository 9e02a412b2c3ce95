//! Turning records into something people can read.
//! [format] renders single records, [pages] groups them into pages and [session::PaginatedSession]
//! lets someone flip through the pages until they stop paying attention.

pub mod channel;
pub mod format;
pub mod pages;
pub mod session;
