//! treesync - Continuous Bidirectional Directory Synchronization
//!
//! treesync mirrors a directory tree between the local machine and one or
//! more remote hosts, using a dedicated git engine as the transport and
//! merge mechanism. This crate implements the endpoint core: everything a
//! sync session needs to identify a side, validate its engine, decide
//! whether two sides may merge, and manage the background daemons it
//! spawns there.
//!
//! ## Core Features
//!
//! - **Address Parsing**: `[[user@]host:]path` endpoint addresses
//! - **Deterministic Naming**: collision-resistant per-endpoint branch
//!   names, stable across restarts, with no central coordinator
//! - **Compatibility Probing**: engine version checks and repository
//!   tail-hash fingerprints that gate merging of unrelated histories
//! - **Daemon Lifecycle**: pidfile-scoped save / liveness-check /
//!   terminate that never disturbs another sync session's daemons
//!
//! ## Modules
//!
//! - [`address`]: endpoint address parsing
//! - [`endpoint`]: endpoint context, registry, and probes
//! - [`daemon`]: pidfile-based daemon lifecycle management
//! - [`transport`]: execution capability consumed by endpoints
//! - [`config`]: configuration management and parsing

pub mod address;
pub mod config;
pub mod daemon;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use address::SyncAddress;
pub use config::{Config, EngineConfig};
pub use endpoint::{Endpoint, EndpointRegistry, InstallState};
pub use error::SyncError;
pub use transport::{ExecOutput, LocalTransport, Transport};
