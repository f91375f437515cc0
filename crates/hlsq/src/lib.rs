// M3U8 (HLS manifest) tag parsing, querying and re-serialization.
//
// Lines are grouped into tags by the `Scanner`, attribute values are typed by
// simple heuristics, and a `Serializer` writes tags back out through a chain
// of transforms (blank-line removal, query filtering, or caller supplied ones
// such as terminal coloring).
pub mod attribute;
pub mod error;
pub mod query;
pub mod scanner;
pub mod serialize;
pub mod tag;

// Export common types for ease of use
pub use attribute::{AttrValue, Attribute, parse_attribute};
pub use error::{QueryError, Result};
pub use query::{Query, QueryOp, compile_query};
pub use scanner::Scanner;
pub use serialize::{Chomp, QueryFilter, Serializer, Transform, render, serialize, write_tag};
pub use tag::{Line, Tag, parse_line, parse_tag};
