//! Environment-setup error categories for enconda.
//!
//! This crate provides the category codes that README analyzers emit and that
//! evaluation reports are keyed by.
//!
//! # Usage
//!
//! ```
//! use enconda_categories::{CATEGORIES_DATA, get_category_name};
//!
//! // CATEGORIES_DATA is a static array of (id, name, description) tuples
//! for (id, name, _) in CATEGORIES_DATA {
//!     println!("{}: {}", id, name);
//! }
//!
//! assert_eq!(get_category_name("E1"), Some("Dependency Installation Error"));
//! ```
//!
//! # Categories
//!
//! - **E1**: Dependency installation
//! - **E2**: Command usage or syntax
//! - **E4**: File path or missing file
//! - **E6**: Logical order of steps
//! - **E7**: Version compatibility
//! - **E8**: Everything else

include!(concat!(env!("OUT_DIR"), "/categories_data.rs"));

/// Returns the total number of categories.
pub fn category_count() -> usize {
    CATEGORIES_DATA.len()
}

/// Looks up a category by ID, returning the name if found.
pub fn get_category_name(id: &str) -> Option<&'static str> {
    CATEGORIES_DATA
        .iter()
        .find(|(category_id, _, _)| *category_id == id)
        .map(|(_, name, _)| *name)
}

/// Looks up a category by ID, returning the description if found.
pub fn get_category_description(id: &str) -> Option<&'static str> {
    CATEGORIES_DATA
        .iter()
        .find(|(category_id, _, _)| *category_id == id)
        .map(|(_, _, description)| *description)
}

/// Check whether an ID is in the catalog (exact, case-sensitive).
pub fn is_known_category(id: &str) -> bool {
    CATEGORIES_DATA.iter().any(|(category_id, _, _)| *category_id == id)
}

/// Normalize a category ID to its canonical form.
///
/// Performs case-insensitive matching after trimming whitespace.
///
/// # Example
/// ```
/// use enconda_categories::normalize_category;
///
/// assert_eq!(normalize_category(" e7 "), Some("E7"));
/// assert_eq!(normalize_category("E3"), None);
/// ```
pub fn normalize_category(id: &str) -> Option<&'static str> {
    let trimmed = id.trim();
    CATEGORIES_DATA
        .iter()
        .find(|(category_id, _, _)| category_id.eq_ignore_ascii_case(trimmed))
        .map(|(category_id, _, _)| *category_id)
}
