// # zonesync-core
//
// Core library for the zonesync dynamic DNS daemon.
//
// ## Architecture Overview
//
// zonesync keeps one DNS record pointed at the host's public IP address by
// polling, comparing and correcting:
// - **IpResolver**: Trait for looking up the current public IP
// - **ZoneRecordSource**: Trait for listing and updating records in a zone
// - **Reconciler**: Runs one cycle (resolve → list → compare → update)
// - **Scheduler**: Runs the reconciler forever at a fixed interval
// - **AdapterRegistry**: Plugin-based registry for resolvers and providers
//
// ## Design Principles
//
// 1. **Stateless cycles**: Nothing carries over between cycles; drift is re-derived every time
// 2. **Bounded cycles**: Each cycle has a deadline every adapter call honors
// 3. **Isolated failures**: A failed step is logged and skipped, never fatal
// 4. **Library-First**: The daemon is a thin shell over this crate

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{DaemonConfig, ProviderConfig, ReconcileConfig, ResolverConfig, SchedulerConfig};
pub use context::{CycleContext, DeadlineExceeded};
pub use engine::{CycleReport, RecordStatus, Reconciler, Scheduler, SchedulerEvent, SchedulerState};
pub use error::{Error, Result};
pub use registry::AdapterRegistry;
pub use traits::{DnsRecord, IpResolver, ZoneRecordSource};
