//! # Algorithms
//!
//! Pure transition planning over a draft [`AgreementRecord`](crate::domain::AgreementRecord).
//! Nothing here reads the clock or touches a port; the service commits the
//! draft only after the invariants pass.

pub mod escrow;
pub mod lifecycle;
pub mod signatures;
pub mod terms;

pub use signatures::SignOutcome;
pub use terms::TermOutcome;
