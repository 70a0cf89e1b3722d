//! Fan-out of one dispatch to several handlers.

use super::{
    Capabilities, Handler, Scope, VisitsAlias, VisitsDocument, VisitsMapping, VisitsScalar,
    VisitsSequence,
};
use crate::document::tree::{NodeId, YamlTree};
use crate::error::{Error, ErrorSet, Result};
use std::fmt;

/// Dispatches every call to each member handler that supports it.
///
/// Members run in registration order. A failing member never prevents the
/// others from running; their failures are joined into one error.
pub struct CompositeHandler<'a> {
    handlers: Vec<Box<dyn Handler + 'a>>,
    capabilities: Capabilities,
}

impl<'a> CompositeHandler<'a> {
    /// # Errors
    ///
    /// Returns [`Error::NoHandlers`] when `handlers` is empty and
    /// [`Error::NoCapabilities`] for the first member without capabilities.
    pub fn new(mut handlers: Vec<Box<dyn Handler + 'a>>) -> Result<Self> {
        if handlers.is_empty() {
            return Err(Error::NoHandlers);
        }
        let mut capabilities = Capabilities::empty();
        for handler in &mut handlers {
            let supported = handler.capabilities();
            if supported.is_empty() {
                return Err(Error::NoCapabilities {
                    handler: handler.name(),
                });
            }
            capabilities |= supported;
        }
        Ok(Self {
            handlers,
            capabilities,
        })
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn into_handlers(self) -> Vec<Box<dyn Handler + 'a>> {
        self.handlers
    }
}

impl fmt::Debug for CompositeHandler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeHandler")
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl VisitsDocument for CompositeHandler<'_> {
    fn visit_document(&mut self, scope: &Scope, tree: &mut YamlTree, document: NodeId) -> Result<()> {
        let mut errors = ErrorSet::default();
        for handler in &mut self.handlers {
            if let Some(handler) = handler.as_document() {
                errors.record(handler.visit_document(scope, tree, document));
            }
        }
        errors.into_result()
    }
}

macro_rules! fan_out {
    ($capability:ident, $accessor:ident, $method:ident) => {
        impl $capability for CompositeHandler<'_> {
            fn $method(
                &mut self,
                scope: &Scope,
                tree: &mut YamlTree,
                key: Option<NodeId>,
                value: NodeId,
            ) -> Result<()> {
                let mut errors = ErrorSet::default();
                for handler in &mut self.handlers {
                    if let Some(handler) = handler.$accessor() {
                        errors.record(handler.$method(scope, tree, key, value));
                    }
                }
                errors.into_result()
            }
        }
    };
}

fan_out!(VisitsSequence, as_sequence, visit_sequence);
fan_out!(VisitsMapping, as_mapping, visit_mapping);
fan_out!(VisitsScalar, as_scalar, visit_scalar);
fan_out!(VisitsAlias, as_alias, visit_alias);

impl Handler for CompositeHandler<'_> {
    fn as_document(&mut self) -> Option<&mut dyn VisitsDocument> {
        self.capabilities
            .contains(Capabilities::DOCUMENT)
            .then_some(self as &mut dyn VisitsDocument)
    }

    fn as_sequence(&mut self) -> Option<&mut dyn VisitsSequence> {
        self.capabilities
            .contains(Capabilities::SEQUENCE)
            .then_some(self as &mut dyn VisitsSequence)
    }

    fn as_mapping(&mut self) -> Option<&mut dyn VisitsMapping> {
        self.capabilities
            .contains(Capabilities::MAPPING)
            .then_some(self as &mut dyn VisitsMapping)
    }

    fn as_scalar(&mut self) -> Option<&mut dyn VisitsScalar> {
        self.capabilities
            .contains(Capabilities::SCALAR)
            .then_some(self as &mut dyn VisitsScalar)
    }

    fn as_alias(&mut self) -> Option<&mut dyn VisitsAlias> {
        self.capabilities
            .contains(Capabilities::ALIAS)
            .then_some(self as &mut dyn VisitsAlias)
    }

    fn name(&self) -> String {
        "CompositeHandler".to_string()
    }

    fn capabilities(&mut self) -> Capabilities {
        self.capabilities
    }
}
