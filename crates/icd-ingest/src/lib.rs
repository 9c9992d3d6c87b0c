pub mod decode;
pub mod delimited;
pub mod detection;
pub mod error;
pub mod fixed;
pub mod ods;
pub mod provider;
pub mod source;

pub use decode::{CharReader, resolve_encoding};
pub use delimited::{DelimitedReader, Dialect};
pub use detection::{ContainerKind, detect_container, detect_container_at};
pub use error::ParseError;
pub use fixed::FixedReader;
pub use ods::OdsReader;
pub use provider::SheetProvider;
pub use source::{RowStream, open_auto_rows, open_data_rows};
