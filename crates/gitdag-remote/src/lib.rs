//! Remote-helper front end for the gitdag migrator.
//!
//! Git runs `git-remote-<name>` and talks to it over stdin/stdout. [`serve`]
//! implements that line protocol on top of a [`ProtocolHandler`];
//! [`DagRemote`] is the handler that resolves local refs, migrates them with
//! [`gitdag_push::Push`] and remembers what each remote ref points to.
//!
//! # Modules
//!
//! - [`error`] -- error type for handler operations
//! - [`handler`] -- the [`ProtocolHandler`] trait and [`DagRemote`]
//! - [`refs`] -- local ref resolution and the remote ref table
//! - [`names`] -- ref name validation
//! - [`helper`] -- the remote-helper command loop

pub mod error;
pub mod handler;
pub mod helper;
pub mod names;
pub mod refs;

pub use error::{RemoteError, RemoteResult};
pub use handler::{DagRemote, ProtocolHandler};
pub use helper::{serve, Command};
pub use names::validate_ref_name;
pub use refs::{RefResolver, RemoteRefs};
