// src/lib.rs
pub mod collapse;
pub mod error;
pub mod field_set;
pub mod filter;
pub mod lexer;
pub mod pipe;
pub mod pipeline;
pub mod row;

pub use collapse::{append_collapse_nums, collapse_nums, prettify_placeholders, PLACEHOLDER};
pub use error::{ProcessingError, SyntaxError};
pub use field_set::FieldSet;
pub use filter::Filter;
pub use pipe::{parse_query, update_needed_fields, Pipe};
pub use pipeline::{
    ErrorStrategy, InputFormat, OutputFormat, PipelineConfig, ProcessingStats, QueryPipeline,
};
pub use row::{Field, Row, MSG_FIELD};
