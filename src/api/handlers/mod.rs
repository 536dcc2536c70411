pub mod contracts;
pub mod payments;
pub mod people;
pub mod registrations;
pub mod root;
pub mod trips;
