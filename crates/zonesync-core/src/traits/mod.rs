//! Core traits for zonesync
//!
//! The reconciler only ever talks to the outside world through these two
//! interfaces:
//!
//! - [`IpResolver`]: look up the caller's public IP address
//! - [`ZoneRecordSource`]: list and update records in a provider zone
//!
//! Both take a [`CycleContext`](crate::context::CycleContext) and must honor its deadline.

pub mod ip_resolver;
pub mod zone_source;

pub use ip_resolver::{IpResolver, IpResolverFactory};
pub use zone_source::{DnsRecord, ZoneRecordSource, ZoneRecordSourceFactory};
