#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

//! A forensic reader for OLE Compound File Binary containers (`.doc`, `.xls`, `.msg`,
//! `Thumbs.db`, ...) and the OLE property-set streams stored inside them.
//!
//! ```no_run
//! use olecf::Container;
//!
//! let container = Container::from_path("sample.doc").unwrap();
//! for item in container.walk().unwrap() {
//!     println!("{} {}", item.sid, item.path);
//! }
//! ```

pub use container::{Container, DEFAULT_CODE_PAGE, OpenOptions, ReadSeek};
pub use directory::{Color, DirectoryEntry, EntryType, WalkItem};
pub use err::{CfbError, PropertyError, Result};
pub use guid::Guid;
pub use property_set::{
    PropertySet, PropertySetStream, StreamMetadata, SummaryInformation, TypedValue, VarType,
};
pub use stream_view::StreamView;
pub use utils::FileTime;

pub mod allocation;
pub mod cfb_header;
pub mod codepage;
mod container;
pub mod directory;
pub mod err;
mod guid;
pub mod property_set;
mod stream_view;
pub mod utils;
