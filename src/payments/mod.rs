//! Payment integration: YooKassa client and the reconciliation state machine.

pub mod gateway;
pub mod reconciler;

pub use gateway::{CreatedPayment, GatewayError, YooKassa};
pub use reconciler::{PaymentError, PaymentRecord, PaymentService, PaymentStatus};
