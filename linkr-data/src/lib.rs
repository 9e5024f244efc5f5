pub mod error;
pub mod gateway;
pub mod memory;
pub mod page;
pub mod query;
pub mod row;
pub mod schema;

pub use error::DataError;
pub use gateway::{FetchGateway, FetchResult};
pub use memory::MemoryGateway;
pub use page::{PageMeta, PageRequest};
pub use query::{PageLimits, Predicate, QueryDescriptor, QueryPlanner, SortKey, MAX_OFFSET};
pub use row::Row;
pub use schema::{
    Computed, Entity, EntityDef, Field, FieldSource, IdentifierStrategy, Relationship,
    SchemaRegistry, ValueKind,
};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Computed, EntityDef, Field, FetchGateway, QueryPlanner, Relationship, Row, SchemaRegistry,
    };
}
