//! # Ingredient Resolver
//!
//! Maps a recipe's reference ingredient onto the row stocked by a target
//! branch.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve("ing-A1", branch B)                                            │
//! │                                                                         │
//! │  1. look up ing-A1            → name "Mozzarella "                      │
//! │  2. normalize (trim + lower)  → "mozzarella"                            │
//! │  3. search branch B by name   → ing-B7 ?                                │
//! │        │                                                                │
//! │        ├── found     → Resolved("ing-B7")                               │
//! │        └── not found → Fallback("ing-A1")   (reference id unchanged)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A fallback is not an error: a deduction against the fallback id lands on
//! a foreign-branch row. Callers collect fallbacks so they can be reported.
//!
//! The trait is the seam: settlement and production only see
//! [`IngredientResolver`], so a canonical-id scheme can replace name
//! matching without touching them.

use std::collections::HashMap;

use crate::catalog::Ingredient;

/// Normalizes an ingredient name for cross-branch matching.
///
/// ```rust
/// use comanda_core::resolver::normalize_name;
///
/// assert_eq!(normalize_name("  Mozzarella "), "mozzarella");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// Resolution Result
// =============================================================================

/// Outcome of resolving one reference id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A row in the target branch matched by name.
    Resolved(String),
    /// No match; carries the reference id unchanged.
    Fallback(String),
}

impl Resolution {
    /// The id to use, whichever way it was obtained.
    pub fn id(&self) -> &str {
        match self {
            Resolution::Resolved(id) | Resolution::Fallback(id) => id,
        }
    }

    pub fn into_id(self) -> String {
        match self {
            Resolution::Resolved(id) | Resolution::Fallback(id) => id,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback(_))
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Read access to ingredient rows by id.
pub trait IngredientLookup {
    fn ingredient(&self, id: &str) -> Option<&Ingredient>;
}

/// Cross-branch ingredient resolution. Implementations must be side-effect
/// free.
pub trait IngredientResolver: IngredientLookup {
    fn resolve(&self, reference_id: &str, target_branch_id: &str) -> Resolution;
}

// =============================================================================
// Name Resolver
// =============================================================================

/// Name-based resolver over a snapshot of ingredient rows.
///
/// Built from the rows of every branch involved. When a branch holds two
/// rows with the same normalized name, the first one given wins.
#[derive(Debug, Default, Clone)]
pub struct NameResolver {
    by_id: HashMap<String, Ingredient>,
    by_branch_name: HashMap<(String, String), String>,
}

impl NameResolver {
    pub fn new(ingredients: impl IntoIterator<Item = Ingredient>) -> Self {
        let mut resolver = NameResolver::default();
        for ingredient in ingredients {
            resolver.insert(ingredient);
        }
        resolver
    }

    /// Adds (or replaces) a row.
    pub fn insert(&mut self, ingredient: Ingredient) {
        let key = (ingredient.branch_id.clone(), ingredient.normalized_name());
        self.by_branch_name
            .entry(key)
            .or_insert_with(|| ingredient.id.clone());
        self.by_id.insert(ingredient.id.clone(), ingredient);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl IngredientLookup for NameResolver {
    fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.by_id.get(id)
    }
}

impl IngredientResolver for NameResolver {
    fn resolve(&self, reference_id: &str, target_branch_id: &str) -> Resolution {
        let Some(reference) = self.by_id.get(reference_id) else {
            return Resolution::Fallback(reference_id.to_string());
        };
        let key = (target_branch_id.to_string(), reference.normalized_name());
        match self.by_branch_name.get(&key) {
            Some(id) => Resolution::Resolved(id.clone()),
            None => Resolution::Fallback(reference_id.to_string()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
