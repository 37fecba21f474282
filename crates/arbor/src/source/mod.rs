// ABOUTME: Local document sources: path resolution, markup discovery, and input predicates.
// ABOUTME: Everything here touches only the filesystem, never the network.

pub mod load;
pub mod path;
pub mod predicates;

pub use load::{load_document, read_text};
pub use path::{resolve, PathKind, ResolvedPath};
pub use predicates::{is_markup_extension, is_path, is_url};
