//! # Validation Module
//!
//! Input validation utilities for the Campus platform.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (external collaborator)                            │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service operation (Rust)                                     │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints                                                │
//! │  └── CHECK constraints (capacity, rating, percentage)                  │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use campus_core::validation::{validate_course_code, validate_rating};
//!
//! // Validate a code before database insert
//! validate_course_code("CS-101").unwrap();
//!
//! // Validate a rating before feedback submit
//! validate_rating(4).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_COMPLETED_MODULES, MAX_FEEDBACK_CATEGORIES, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a course code.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Should contain only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use campus_core::validation::validate_course_code;
///
/// assert!(validate_course_code("CS-101").is_ok());
/// assert!(validate_course_code("").is_err());
/// assert!(validate_course_code("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_course_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    // Check for valid characters (alphanumeric, hyphen, underscore)
    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a course title.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 200 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a course description.
///
/// ## Rules
/// - Can be empty here (publishing separately requires it non-empty)
/// - Maximum 2000 characters
pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.len() > 2000 {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 2000,
        });
    }

    Ok(())
}

/// Validates a feedback comment.
///
/// ## Rules
/// - Can be empty (rating-only feedback)
/// - Maximum 2000 characters
pub fn validate_comment(comment: &str) -> ValidationResult<()> {
    if comment.len() > 2000 {
        return Err(ValidationError::TooLong {
            field: "comment".to_string(),
            max: 2000,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a course capacity.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (a course nobody can enroll in yet)
pub fn validate_capacity(capacity: i64) -> ValidationResult<()> {
    if capacity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "capacity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a credit value.
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_credits(credits: i64) -> ValidationResult<()> {
    if credits < 0 {
        return Err(ValidationError::OutOfRange {
            field: "credits".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a feedback rating.
///
/// ## Rules
/// - Must be between 1 and 5 inclusive
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Feedback: Submit                                                       │
/// │                                                                         │
/// │  Student picks rating: 4                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_rating(4) ← THIS FUNCTION                                    │
/// │       │                                                                 │
/// │       ├── rating < 1? → Error: "rating must be between 1 and 5"        │
/// │       │                                                                 │
/// │       ├── rating > 5? → Error: "rating must be between 1 and 5"        │
/// │       │                                                                 │
/// │       └── OK → Proceed with submit_feedback                            │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_rating(rating: i64) -> ValidationResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        });
    }

    Ok(())
}

/// Validates a completion percentage.
///
/// ## Rules
/// - Must be a finite number
/// - Must be between 0.0 and 100.0 inclusive
pub fn validate_percentage(percentage: f64) -> ValidationResult<()> {
    if !percentage.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "completion_percentage".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if !(0.0..=100.0).contains(&percentage) {
        return Err(ValidationError::OutOfRange {
            field: "completion_percentage".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates pagination parameters.
///
/// ## Rules
/// - `limit` must be positive and at most MAX_PAGE_SIZE (100)
/// - `offset` must be non-negative
pub fn validate_page(limit: i64, offset: i64) -> ValidationResult<()> {
    if limit <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "limit".to_string(),
        });
    }

    if limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        });
    }

    if offset < 0 {
        return Err(ValidationError::OutOfRange {
            field: "offset".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a completed-modules list.
///
/// ## Rules
/// - At most MAX_COMPLETED_MODULES (500) entries
/// - Every module id non-empty and at most 100 characters
pub fn validate_module_ids(modules: &[String]) -> ValidationResult<()> {
    if modules.len() > MAX_COMPLETED_MODULES {
        return Err(ValidationError::OutOfRange {
            field: "completed_modules".to_string(),
            min: 0,
            max: MAX_COMPLETED_MODULES as i64,
        });
    }

    for module in modules {
        if module.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "completed_modules entry".to_string(),
            });
        }
        if module.len() > 100 {
            return Err(ValidationError::TooLong {
                field: "completed_modules entry".to_string(),
                max: 100,
            });
        }
    }

    Ok(())
}

/// Validates feedback category ratings.
///
/// ## Rules
/// - At most MAX_FEEDBACK_CATEGORIES (20) categories
/// - Every category name non-empty and at most 100 characters
/// - Every category rating between 1 and 5
pub fn validate_category_ratings<'a, I>(categories: I) -> ValidationResult<()>
where
    I: IntoIterator<Item = (&'a String, &'a i64)>,
{
    let mut count = 0usize;

    for (name, rating) in categories {
        count += 1;
        if count > MAX_FEEDBACK_CATEGORIES {
            return Err(ValidationError::OutOfRange {
                field: "categories".to_string(),
                min: 0,
                max: MAX_FEEDBACK_CATEGORIES as i64,
            });
        }

        if name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "category name".to_string(),
            });
        }
        if name.len() > 100 {
            return Err(ValidationError::TooLong {
                field: "category name".to_string(),
                max: 100,
            });
        }
        if !(1..=5).contains(rating) {
            return Err(ValidationError::OutOfRange {
                field: format!("categories[{name}]"),
                min: 1,
                max: 5,
            });
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Rules
/// - Must be a valid UUID v4 format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
///
/// ## Example
/// ```rust
/// use campus_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    // Try to parse as UUID
    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
