pub mod envelope;
pub mod error;
pub mod links;
pub mod mapper;
pub mod negotiate;
pub mod pipeline;
pub mod resource;

pub use envelope::{EnvelopeSerializer, HalJson, PlainJson, HAL_JSON, PLAIN_JSON};
pub use error::HalError;
pub use links::{LinkBase, LinkResolver};
pub use mapper::ResourceMapper;
pub use negotiate::ContentNegotiator;
pub use pipeline::{Pipeline, PipelineBuilder, Rendered};
pub use resource::{Collection, Link, LinkSet, Resource};

pub mod prelude {
    //! Re-exports of the most commonly used hypermedia types.
    pub use crate::{ContentNegotiator, HalError, LinkBase, LinkResolver, Pipeline, Rendered};
}
