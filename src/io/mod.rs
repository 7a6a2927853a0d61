//! I/O layer: decoding source images (`reader`) and encoding/persisting
//! redacted results (`writers`).
pub mod reader;
pub use reader::{ImageSource, is_accepted_extension, is_accepted_image, load_canvas};

pub mod writers;
pub use writers::{encode_canvas, persist_atomic};
