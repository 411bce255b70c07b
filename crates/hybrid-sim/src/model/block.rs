use std::cell::RefCell;
use std::rc::Rc;

use super::scope::{qualify, Scope};
use super::system::SystemInner;

/// A named hierarchical container. Blocks are organizational only — they do
/// not own storage; every entity declared under one routes its allocation
/// straight through to the root `System`.
pub struct Block {
    system: Rc<RefCell<SystemInner>>,
    path: String,
}

impl Block {
    pub fn new(parent: &dyn Scope, name: &str) -> Rc<Block> {
        Rc::new(Block {
            system: parent.system_inner(),
            path: qualify(parent, name),
        })
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

impl Scope for Block {
    fn system_inner(&self) -> Rc<RefCell<SystemInner>> {
        self.system.clone()
    }

    fn path(&self) -> String {
        self.path.clone()
    }
}
