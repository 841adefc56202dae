//! Uniform capture facade over native clipboard and drag data carriers.
//!
//! Native transfer objects are often readable only synchronously inside the
//! event that produced them, expose data under inconsistent keys, and cannot
//! always carry custom entries. [`TransferHandle`] hides all of that behind
//! one get/set surface with an internal snapshot cache, and carries the
//! correlation token that lets a later event in the same gesture (a drop
//! after a drag start, a paste after a copy) find the data captured earlier.
//! [`SessionRegistry`] is the process-scoped home for those in-flight
//! gestures.

pub mod key;
pub mod native;
pub mod session;
pub mod transfer;

pub use key::DataKey;
pub use native::{decode_slot_bytes, FileHandle, NativeDataSource, SlotPayload, TransferError};
pub use session::SessionRegistry;
pub use transfer::{CorrelationToken, SurfaceId, TransferHandle, TransferType};
