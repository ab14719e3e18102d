//! # ndbctl-core
//!
//! Shared engine for managing Nutanix NDB database server VMs. The CLI is a
//! thin layer over this crate.
//!
//! ## What Lives Here
//!
//! - **Models** - wire types for the NDB v0.9 API ([`models`])
//! - **Params** - user-facing configuration and request builders ([`params`])
//! - **Client** - the HTTP client and the traits it implements ([`client`])
//! - **Progress** - the asynchronous operation poller ([`progress`])
//! - **Flatten** - projection of a server into attribute state ([`flatten`])
//! - **Workflows** - create/read/update/delete composed end to end ([`workflows`])
//! - **Config** - profiles, credentials and wait timings ([`config`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use ndbctl_core::params::DbServerConfig;
//! use ndbctl_core::{NdbClient, ResourceState, WaitOptions, create_dbserver_and_wait};
//!
//! let client = NdbClient::builder("https://ndb.lab.local", "admin", "secret")
//!     .insecure(true)
//!     .build()?;
//!
//! let config = DbServerConfig::new("postgres_database", "np-1", "cp-1", "cluster-1", "vm-pw")
//!     .with_software_profile("sp-1", "spv-1");
//!
//! let mut state = ResourceState::new();
//! let wait = WaitOptions::default();
//! let server = create_dbserver_and_wait(&client, &config, &mut state, wait, None).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod flatten;
pub mod models;
pub mod params;
pub mod progress;
pub mod workflows;

pub use client::{NdbApi, NdbClient, NdbClientBuilder, OperationSource};
pub use error::{CoreError, Result};
pub use flatten::{ResourceState, StateWriter, flatten_dbserver};
pub use progress::{PollRequest, PollResult, ProgressCallback, ProgressEvent, poll_operation};
pub use workflows::{
    WaitOptions, create_dbserver_and_wait, delete_dbserver_and_wait, read_dbserver,
    update_dbserver, wait_for_operation,
};
