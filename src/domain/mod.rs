pub mod contract;
pub mod participant;
pub mod payment;
pub mod registration;
pub mod trip;

pub use contract::*;
pub use participant::*;
pub use payment::*;
pub use registration::*;
pub use trip::*;
