mod commands;
mod config;
mod core;
mod error;
mod history;
mod keys;
mod node;
mod normalize;
mod ops;
pub mod path;
mod plugin;
pub mod query;
mod render;
mod schema;
mod transforms;

pub use crate::config::*;
pub use crate::core::*;
pub use crate::error::*;
pub use crate::history::*;
pub use crate::keys::*;
pub use crate::node::*;
pub use crate::normalize::*;
pub use crate::ops::*;
pub use crate::path::{Path, PathError};
pub use crate::plugin::*;
pub use crate::render::*;
pub use crate::schema::*;
pub use crate::transforms::*;
