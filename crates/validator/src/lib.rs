mod gate;

pub use gate::ValidationGate;
