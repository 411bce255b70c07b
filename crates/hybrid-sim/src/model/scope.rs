use std::cell::RefCell;
use std::rc::Rc;

use super::system::SystemInner;

/// Construction-time parent of a `State`, `Signal`, `Port` or event source.
///
/// Per §9 of the design notes: blocks are a pure naming/grouping construct,
/// so every entity constructor routes its allocation through to the root
/// `System`'s registry regardless of whether its immediate parent is the
/// `System` itself or a nested `Block`. `Scope` is the trait object that
/// makes both acceptable as a "parent" argument.
pub trait Scope {
    #[doc(hidden)]
    fn system_inner(&self) -> Rc<RefCell<SystemInner>>;

    /// Dotted hierarchical path prefix for names declared under this scope.
    fn path(&self) -> String;
}

/// Builds the dotted display name `{parent.path()}{local_name}`, inserting a
/// separator only when the parent itself has a non-empty path (i.e. isn't
/// the System root).
pub(crate) fn qualify(parent: &dyn Scope, local_name: &str) -> String {
    let prefix = parent.path();
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{prefix}.{local_name}")
    }
}
