//! Transport seam: what the meta listener accepts *from*.
//!
//! - [`Endpoint`] the inner-listener contract (accept / close / addr) every
//!   managed transport implements; [`EndpointRef`] is the shared handle the
//!   registry stores.
//! - [`Connection`] an accepted stream tagged with its addresses and source
//!   listener id.
//! - [`EndpointAddr`] / [`MetaAddr`] single and composite addresses.
//! - [`TcpEndpoint`] a production-hardened TCP implementation.

mod addr;
mod conn;
mod endpoint;
mod tcp;

pub use addr::{EndpointAddr, MetaAddr};
pub use conn::{BoxStream, Connection, Stream};
pub use endpoint::{Endpoint, EndpointRef};
pub use tcp::TcpEndpoint;
