//! # Repository Module
//!
//! Database repository implementations for Campus.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Service Method                                                        │
//! │       │                                                                 │
//! │       │  db.courses().list(&filter)                                    │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  CourseRepository                                                      │
//! │  ├── list(&self, filter)                                               │
//! │  ├── get(&self, id)                                                    │
//! │  ├── insert(&self, course)                                             │
//! │  └── update(&self, course)                                             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test (in-memory database per test)                          │
//! │  • SQL is isolated in one place                                        │
//! │  • Can swap database implementations                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`course::CourseRepository`] - Course CRUD, search and lifecycle guards
//! - [`enrollment::EnrollmentRepository`] - Seat admission and the enrollment ledger
//! - [`progress::ProgressRepository`] - Progress upserts and course summaries
//! - [`feedback::FeedbackRepository`] - One-shot feedback and rating aggregates

pub mod course;
pub mod enrollment;
pub mod feedback;
pub mod progress;
