//! Upstream provider clients for the Medley backend
//!
//! One client per upstream data source: the movie/TV metadata provider, the
//! video platform used for trailer lookups, and the internet radio
//! directory. Each client translates internal operations into authenticated
//! HTTP calls, normalizes raw payloads into the provider-agnostic model, and
//! consults its own injected TTL cache before going to the network.

pub mod error;
pub mod http;
pub mod metadata;
pub mod models;
pub mod radio;
pub mod video;

pub use error::{ProviderError, ProviderResult};
pub use metadata::{Category, MetadataClient, MetadataConfig};
pub use models::{MediaKind, NormalizedItem, RadioStationRecord, StreamSource};
pub use radio::{RadioConfig, RadioDirectoryClient};
pub use video::{VideoConfig, VideoPlatformClient};
