pub mod convert;
pub mod error;
pub mod fix;
pub mod lookup;
pub mod output;
pub mod path;
pub mod record;
pub mod transformer;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{FixError, Result};
pub use fix::{Fix, OperationNode, Vars};
pub use lookup::{FileMap, InlineMap, Lookup, MapRegistry};
pub use output::{to_json, to_json_pretty};
pub use path::{FixPath, InsertMode, PathSegment, Reference};
pub use record::Record;
pub use transformer::{Metafix, Outcome, RecordTransformer};
pub use value::{Array, Hash, Scalar, Value, ValueType};
