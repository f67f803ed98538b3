//! Delivery layer: ships analysis events to the logging sheet, primary
//! transport first, address-embedded transport as the fallback.

mod error;
pub mod pipeline;
pub mod transport;

pub use error::{DeliveryError, TransportError};
pub use pipeline::{Delivery, DeliveryPipeline};
#[cfg(feature = "http")]
pub use transport::{PostTransport, QueryTransport};
pub use transport::{Transport, append_payload, query_pairs};
