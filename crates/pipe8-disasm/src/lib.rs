pub mod analyze;
pub mod model;

pub use analyze::{analyze_entries, build_report, BlockOut, Edge, EdgeKind, EdgeOut, FunctionOut, Report, Walk};
pub use model::{is_mapped, load_image, read_word, Image};
