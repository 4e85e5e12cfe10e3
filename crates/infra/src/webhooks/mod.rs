//! Signed webhook delivery: signature, target guard, sender, and worker

mod guard;
mod sender;
mod signature;
mod worker;

pub use guard::{ResolveHost, SystemResolver, TargetGuard};
pub use sender::{AttemptOutcome, DeliveryTransport, WebhookSender};
pub use signature::{sign_payload, verify_payload};
pub use worker::{DeliveryWorker, DeliveryWorkerConfig};
