//! Wire contract shared by the vcsbridge engine, its backends and the host.
//!
//! The crate holds the data model the editor and the bridge exchange:
//! versioned assets with their state flag sets, changelists, configuration
//! fields, status items, the command table, capability advertisement, the
//! request and response messages, and the [`Connection`] abstraction with
//! its JSONL implementation.
//!
//! Nothing here talks to a version-control system. The dispatch engine in
//! `vcsbridged` drives a backend through these types, and every backend
//! therefore presents the same contract to the host.
//!
//! # Example
//!
//! ```
//! use vcsbridge_protocol::{AssetState, HostRequest, VersionedAsset};
//!
//! let request = HostRequest::parse(
//!     r#"{"command":"checkout","assets":[{"path":"foo.txt","state":1}]}"#,
//! )
//! .expect("valid request");
//! assert_eq!(request.command, "checkout");
//! assert_eq!(request.assets, vec![VersionedAsset::with_state("foo.txt", AssetState::Local)]);
//! ```

pub mod asset;
pub mod capability;
pub mod changes;
pub mod command;
pub mod config_field;
pub mod connection;
pub mod error;
pub mod flags;
pub mod message;
pub mod status;

pub use self::asset::{
    AssetState, AssetStates, FOLDER_SUFFIX, META_EXTENSION, VersionedAsset, VersionedAssetList,
};
pub use self::capability::{BackendTrait, Capabilities, Overlays, TraitFlags};
pub use self::changes::{Changelist, ChangelistRevision, ChangelistRevisions, Changes};
pub use self::command::{Command, CommandFlags, EngineCommand, VcsCommand};
pub use self::config_field::{ConfigField, ConfigFields, FieldFlag, FieldFlags};
pub use self::connection::{Connection, JsonlConnection, RequestLine};
pub use self::error::{ProtocolError, TransportError};
pub use self::flags::{Flag, FlagSet};
pub use self::message::{BridgeMessage, CommandResponse, HostRequest, ResponsePayload};
pub use self::status::{Severity, StatusItem, VcsStatus};
