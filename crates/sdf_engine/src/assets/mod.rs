//! Asset loading
//!
//! File-format boundaries for the engine. Only the OBJ mesh loader lives
//! here; the collision core consumes its triangle-list output and never
//! touches file formats itself.

pub mod obj_loader;

pub use obj_loader::{ObjError, ObjLoader};
