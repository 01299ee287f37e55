// Adapters layer: concrete collaborators for the ports in `domain::ports`.

pub mod console;
pub mod inputs;
pub mod reference;
pub mod writers;
