pub mod coordinator;
pub mod dispatch;
pub mod reference;

pub use coordinator::{
    PaymentIntent, ReservationCoordinator, ReservationOutcome, ReservationRequest,
};
pub use dispatch::dispatch_effects;
