//! Domain model (ids, status, render instructions, errors).

pub mod errors;
pub mod ids;
pub mod render;
pub mod status;

pub use self::errors::DomainError;
pub use self::ids::{EntityId, Id, IdMarker, SessionId};
pub use self::render::{
    IN_FLIGHT_CLASS, MARKER_CLASS, RenderInstruction, RenderState, STATE_CLASSES, StatusBoard,
    StatusElement, render,
};
pub use self::status::Status;
