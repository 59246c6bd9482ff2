//! Client library and object model for the dpservice dataplane.
//!
//! The dataplane service owns all packet processing state (interfaces,
//! routes, NAT, load balancers, firewall rules). This crate talks to it over
//! gRPC and provides the generic object model used to drive it from
//! declarative JSON/YAML documents.
//!
//! # Modules
//!
//! - [`api`] - Record types (`Interface`, `Route`, ...) and the [`Object`] sum type
//! - [`scheme`] - Kind registry mapping `kind` strings to record types
//! - [`decoder`] - Peek-then-decode reader for multi-document JSON/YAML streams
//! - [`sources`] - Iteration over files, directories and stdin
//! - [`client`] - Typed dataplane API, gRPC implementation and dynamic dispatch
//! - [`output`] - JSON/YAML/name/table rendering
//!
//! # Example
//!
//! ```ignore
//! use dpservice::client::{DynamicClient, GrpcClient};
//! use dpservice::scheme::Scheme;
//! use dpservice::sources::Sources;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> dpservice::Result<()> {
//!     let scheme = Scheme::with_defaults();
//!     let grpc = GrpcClient::connect("localhost:1337", Duration::from_secs(4)).await?;
//!     let mut client = DynamicClient::new(grpc, &scheme);
//!
//!     let mut sources = Sources::new(["objects.yaml"]);
//!     while let Some(source) = sources.next_source()? {
//!         let result = client.create_all(source.objects(&scheme)).await?;
//!         println!("{}", result.summary_text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod decoder;
pub mod error;
pub mod output;
pub mod scheme;
pub mod sources;
pub mod util;

mod proto;

// Re-export common types at crate root for convenience
pub use api::{Object, Record};
pub use error::{Error, Result};
pub use scheme::Scheme;
