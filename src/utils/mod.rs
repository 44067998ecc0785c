//! Numeric helpers shared by the resolver
//!
//! - [`quantity`] - Kubernetes resource quantities: parse, compare, add, format
//! - [`resources`] - memory/cpu requirements of container components

pub mod quantity;
pub mod resources;

pub use quantity::{Quantity, QuantityFormat};
pub use resources::{ResourceList, ResourceName, ResourceRequirements};
