//! Operation surface implementations.
//!
//! One service per component. Every method takes the calling [`Principal`]
//! first, consults the policy table before touching storage, and returns
//! `Result<T, ServiceError>`; transports wrap that in an [`Envelope`].
//!
//! [`Principal`]: campus_core::Principal
//! [`Envelope`]: crate::envelope::Envelope

pub mod analytics_service;
pub mod course_service;
pub mod enrollment_service;
pub mod feedback_service;
pub mod progress_service;
