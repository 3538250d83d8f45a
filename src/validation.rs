//! Chain integrity validation.
//!
//! Checks structural integrity of an operation chain, typically after
//! ingesting external data. Detects:
//! - Duplicate IDs
//! - Predecessor references to missing operations
//! - Duplicate successors (two operations claiming the same predecessor)
//! - Circular predecessor chains
//! - Inverted windows and durations out of step with their window
//!
//! Propagation defends itself against cycles at cascade time; this
//! module is the up-front report for callers that want to surface
//! corrupted data before editing starts.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::models::{Chain, Operation};
use crate::timeutil;
use std::collections::{HashMap, HashSet};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two operations share the same ID.
    DuplicateId,
    /// An operation references a predecessor that doesn't exist.
    UnknownPredecessor,
    /// Two operations claim the same predecessor.
    DuplicateSuccessor,
    /// The predecessor chain contains a cycle.
    CyclicDependency,
    /// An operation's window ends before it starts.
    InvertedWindow,
    /// An operation's declared duration diverges from its window.
    DurationMismatch,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a chain's structural integrity.
///
/// Checks:
/// 1. No duplicate operation IDs
/// 2. All predecessor references point to existing operations
/// 3. No operation has more than one successor
/// 4. No circular predecessor chains
/// 5. No inverted working windows
/// 6. Declared durations match their windows
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_chain(chain: &Chain) -> ValidationResult {
    validate_operations(chain.operations())
}

/// Validates a raw operation list (before it becomes a chain).
pub fn validate_operations(operations: &[Operation]) -> ValidationResult {
    let mut errors = Vec::new();

    // Collect operation IDs
    let mut ids = HashSet::new();
    for op in operations {
        if !ids.insert(op.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate operation ID: {}", op.id),
            ));
        }
    }

    // Check predecessor references and successor uniqueness
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    for op in operations {
        if let Some(prev) = &op.previous_operation {
            if !ids.contains(prev.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownPredecessor,
                    format!("Operation '{}' references unknown predecessor '{prev}'", op.id),
                ));
            } else if let Some(other) = claimed.insert(prev.as_str(), op.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateSuccessor,
                    format!(
                        "Operations '{other}' and '{}' both follow operation '{prev}'",
                        op.id
                    ),
                ));
            }
        }
    }

    // Check window consistency
    for op in operations {
        if op.end < op.start {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvertedWindow,
                format!("Operation '{}' ends before it starts", op.id),
            ));
        } else if op.duration_minutes != timeutil::duration_minutes(op.start, op.end) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DurationMismatch,
                format!(
                    "Operation '{}' declares {} minutes but its window spans {}",
                    op.id,
                    op.duration_minutes,
                    timeutil::duration_minutes(op.start, op.end)
                ),
            ));
        }
    }

    // Check for cycles in the predecessor graph (DFS-based)
    if let Some(cycle_err) = detect_cycles(operations) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the predecessor graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(operations: &[Operation]) -> Option<ValidationError> {
    // Build adjacency list: predecessor ID -> successors
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut all_ids: HashSet<&str> = HashSet::new();

    for op in operations {
        all_ids.insert(&op.id);
        if let Some(prev) = &op.previous_operation {
            adj.entry(prev.as_str()).or_default().push(op.id.as_str());
        }
    }

    // DFS cycle detection
    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for &node in &all_ids {
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving operation '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge -> cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}
