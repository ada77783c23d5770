//! Document model, addressing, and the driver seam for Firedoc.
//!
//! `firedoc-api` builds its accessor on top of the types here; drivers
//! implement [`DocumentDriver`]. [`MemoryDriver`] is the in-process driver
//! used for tests and embedded use.

pub mod error;
pub mod types;
pub mod path;
pub mod query;
pub mod driver;
pub mod batch;
pub mod stream; // change records for listeners
pub mod config;
pub mod memory;

pub use error::{Error, Result};
pub use types::*;
pub use path::{CollectionRef, DocumentRef, ResourcePath};
pub use query::{Direction, FilterOp, Query, QueryConstraint};
pub use driver::{DocumentDriver, DocumentSnapshot, QuerySnapshot, SnapshotStream};
pub use batch::{BatchWrite, WriteBatch};
pub use config::DriverConfig;
pub use memory::MemoryDriver;
