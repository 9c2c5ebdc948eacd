//! Retrievers backed by remote search services.
//!
//! A [`RemoteRetriever`] knows how to shape a request body and read a
//! response; [`RemoteRetrieverClient`] does the HTTP round trip and exposes
//! the pair as a core [`Retriever`](chainkit_core::document::Retriever).

pub mod remote;
pub mod vespa;

pub use remote::{RemoteRetriever, RemoteRetrieverClient};
pub use vespa::VespaRetriever;
