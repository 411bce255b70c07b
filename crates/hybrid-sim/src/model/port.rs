use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::CoreError;

use super::handle::OutputId;
use super::scope::{qualify, Scope};
use super::shape::Shape;
use super::signal::Signal;

/// What a `Port` redirects to: either a concrete `Signal`, or another `Port`
/// (in which case resolution continues through that port's own target).
#[derive(Clone)]
pub enum PortTarget {
    Signal(Rc<Signal>),
    Port(Rc<Port>),
}

impl From<Rc<Signal>> for PortTarget {
    fn from(s: Rc<Signal>) -> Self {
        PortTarget::Signal(s)
    }
}

impl From<Rc<Port>> for PortTarget {
    fn from(p: Rc<Port>) -> Self {
        PortTarget::Port(p)
    }
}

/// A connection endpoint that resolves to exactly one `Signal`, directly or
/// through a chain of other ports.
///
/// Modeled after `gwr-engine`'s `connected: RefCell<bool>` guard on its
/// `InPort`/`OutPort` types: a port may be connected at most once, and a
/// second `connect` call is an error rather than a silent overwrite (§4
/// Component Design, Port resolution).
pub struct Port {
    shape: Shape,
    name: String,
    target: RefCell<Option<PortTarget>>,
    output_id: Option<OutputId>,
}

impl Port {
    pub fn new(parent: &dyn Scope, name: &str, shape: impl Into<Shape>) -> Rc<Port> {
        Self::build(parent, name, shape, None)
    }

    /// A port additionally registered as a system-level output (an
    /// `OutputPort` in §3 Data Model).
    pub fn output(parent: &dyn Scope, name: &str, shape: impl Into<Shape>) -> Rc<Port> {
        let shape = shape.into();
        let inner = parent.system_inner();
        let output_id = inner.borrow_mut().registry.allocate_output(shape.size());
        let port = Self::build(parent, name, shape, Some(output_id));
        inner.borrow_mut().output_ports.push(port.clone());
        port
    }

    fn build(
        parent: &dyn Scope,
        name: &str,
        shape: impl Into<Shape>,
        output_id: Option<OutputId>,
    ) -> Rc<Port> {
        let shape = shape.into();
        let full_name = qualify(parent, name);
        log::trace!("declared port {full_name}");
        Rc::new(Port {
            shape,
            name: full_name,
            target: RefCell::new(None),
            output_id,
        })
    }

    /// Redirects this port to `target`. Fails with
    /// [`CoreError::ShapeMismatch`] if `target`'s shape differs from this
    /// port's declared shape (§4.B: "Port.connect(other) requires equal
    /// shape"), or with [`CoreError::MultipleSignals`] if the port is
    /// already connected (§7 Error Handling Design: "connecting a second
    /// source to an already-connected port").
    pub fn connect(&self, target: impl Into<PortTarget>) -> Result<(), CoreError> {
        let target = target.into();
        let target_shape = match &target {
            PortTarget::Signal(s) => s.shape().clone(),
            PortTarget::Port(p) => p.shape().clone(),
        };
        if target_shape.dims() != self.shape.dims() {
            return Err(CoreError::ShapeMismatch {
                entity: self.name.clone(),
                declared: self.shape.dims().to_vec(),
                actual: target_shape.dims().to_vec(),
            });
        }

        let mut slot = self.target.borrow_mut();
        if slot.is_some() {
            return Err(CoreError::MultipleSignals {
                port: self.name.clone(),
            });
        }
        *slot = Some(target);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.target.borrow().is_some()
    }

    /// Walks the redirection chain to the concrete `Signal` this port
    /// ultimately resolves to. Fails with [`CoreError::PortNotConnected`] if
    /// any port along the chain has no target.
    pub fn signal(&self) -> Result<Rc<Signal>, CoreError> {
        match self.target.borrow().as_ref() {
            Some(PortTarget::Signal(s)) => Ok(s.clone()),
            Some(PortTarget::Port(p)) => p.signal(),
            None => Err(CoreError::PortNotConnected {
                port: self.name.clone(),
            }),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.shape.size()
    }

    pub fn output_id(&self) -> Option<OutputId> {
        self.output_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("connected", &self.is_connected())
            .field("output_id", &self.output_id)
            .finish()
    }
}

impl PartialEq for Port {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Port {}
