// Domain layer: value objects and collaborator ports. No I/O here.

pub mod layout;
pub mod model;
pub mod ports;
