//! Converts GraphQL query documents into field queries: flat, dot-separated
//! field paths understood by the field-query execution engine.
//!
//! ```
//! use field_query_converter::{FeedbackMessageStore, GraphQLQueryConvertor, Variables};
//!
//! let convertor = GraphQLQueryConvertor::default();
//! let mut feedback = FeedbackMessageStore::new();
//! let field_query = convertor.convert_from_graphql_to_field_query(
//!     "{ posts { id title } }",
//!     &Variables::new(),
//!     false,
//!     None,
//!     &mut feedback,
//! );
//! assert_eq!(field_query, "posts.id,posts.title");
//! ```

pub mod arguments;
pub mod batch;
pub mod config;
pub mod conversion;
pub mod feedback;
pub mod field_query;
pub mod paths;
pub mod request;
pub mod symbols;


pub use batch::FieldQuerySet;
pub use config::ConvertorConfig;
pub use conversion::{ConversionError, ErrorKind, GraphQLQueryConvertor};
pub use feedback::{ErrorExtensions, FeedbackMessageStore, FeedbackStore, Location, QueryError};
pub use request::Variables;
