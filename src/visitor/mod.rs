//! Tree walking and handler dispatch.
//!
//! A [`Visitor`] walks one document of a [`YamlTree`] and hands every
//! key/value pair to a handler, choosing the callback by the value's kind.
//! Handlers opt into the kinds they care about by implementing any subset of
//! the five capability traits and exposing them through [`Handler`].
//!
//! # Example
//!
//! ```
//! use yamlwalk::document::parser::parse_yaml;
//! use yamlwalk::document::{NodeId, YamlTree};
//! use yamlwalk::visitor::{Handler, Scope, Visitor, VisitsScalar};
//!
//! #[derive(Default)]
//! struct CountScalars(usize);
//!
//! impl VisitsScalar for CountScalars {
//!     fn visit_scalar(
//!         &mut self,
//!         _scope: &Scope,
//!         _tree: &mut YamlTree,
//!         _key: Option<NodeId>,
//!         _value: NodeId,
//!     ) -> yamlwalk::Result<()> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! impl Handler for CountScalars {
//!     fn as_scalar(&mut self) -> Option<&mut dyn VisitsScalar> {
//!         Some(self)
//!     }
//! }
//!
//! let mut tree = parse_yaml("a: 1\nb: [2, 3]\n").unwrap();
//! let mut visitor = Visitor::new(CountScalars::default()).unwrap();
//! let doc = tree.documents()[0];
//! visitor.visit(&Scope::new(), &mut tree, doc).unwrap();
//! assert_eq!(visitor.handler().0, 3);
//! ```

pub mod composite;
pub mod conditional;
pub mod engine;
pub mod matcher;
pub mod scope;

pub use composite::CompositeHandler;
pub use conditional::{ConditionalHandler, ConditionalHandlerBuilder};
pub use engine::{Visitor, VisitorOptions};
pub use matcher::PathMatcher;
pub use scope::Scope;

use crate::document::tree::{NodeId, YamlTree};
use crate::error::Result;

bitflags::bitflags! {
    /// The set of node kinds a handler wants to be called for.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const DOCUMENT = 0b0000_0001;
        const SEQUENCE = 0b0000_0010;
        const MAPPING  = 0b0000_0100;
        const SCALAR   = 0b0000_1000;
        const ALIAS    = 0b0001_0000;
    }
}

/// Called once per visited document with the document node itself.
pub trait VisitsDocument {
    fn visit_document(&mut self, scope: &Scope, tree: &mut YamlTree, document: NodeId)
        -> Result<()>;
}

/// Called for every sequence value. `key` is `None` for sequence elements.
pub trait VisitsSequence {
    fn visit_sequence(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()>;
}

/// Called for every mapping value. `key` is `None` for sequence elements.
pub trait VisitsMapping {
    fn visit_mapping(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()>;
}

/// Called for every scalar value. `key` is `None` for sequence elements.
pub trait VisitsScalar {
    fn visit_scalar(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()>;
}

/// Called for every alias value. `key` is `None` for sequence elements.
pub trait VisitsAlias {
    fn visit_alias(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()>;
}

/// A visitor handler: exposes whichever capabilities it implements.
///
/// Every accessor defaults to `None`, so a handler only overrides the ones it
/// supports. A handler exposing none of them is rejected when a visitor or
/// composite is built.
pub trait Handler {
    fn as_document(&mut self) -> Option<&mut dyn VisitsDocument> {
        None
    }

    fn as_sequence(&mut self) -> Option<&mut dyn VisitsSequence> {
        None
    }

    fn as_mapping(&mut self) -> Option<&mut dyn VisitsMapping> {
        None
    }

    fn as_scalar(&mut self) -> Option<&mut dyn VisitsScalar> {
        None
    }

    fn as_alias(&mut self) -> Option<&mut dyn VisitsAlias> {
        None
    }

    /// Name used in error messages.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn capabilities(&mut self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::DOCUMENT, self.as_document().is_some());
        caps.set(Capabilities::SEQUENCE, self.as_sequence().is_some());
        caps.set(Capabilities::MAPPING, self.as_mapping().is_some());
        caps.set(Capabilities::SCALAR, self.as_scalar().is_some());
        caps.set(Capabilities::ALIAS, self.as_alias().is_some());
        caps
    }
}

macro_rules! forward_handler {
    () => {
        fn as_document(&mut self) -> Option<&mut dyn VisitsDocument> {
            (**self).as_document()
        }

        fn as_sequence(&mut self) -> Option<&mut dyn VisitsSequence> {
            (**self).as_sequence()
        }

        fn as_mapping(&mut self) -> Option<&mut dyn VisitsMapping> {
            (**self).as_mapping()
        }

        fn as_scalar(&mut self) -> Option<&mut dyn VisitsScalar> {
            (**self).as_scalar()
        }

        fn as_alias(&mut self) -> Option<&mut dyn VisitsAlias> {
            (**self).as_alias()
        }

        fn name(&self) -> String {
            (**self).name()
        }

        fn capabilities(&mut self) -> Capabilities {
            (**self).capabilities()
        }
    };
}

impl<H: Handler + ?Sized> Handler for &mut H {
    forward_handler!();
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    forward_handler!();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;
    impl Handler for Nothing {}

    struct Aliases;
    impl VisitsAlias for Aliases {
        fn visit_alias(
            &mut self,
            _scope: &Scope,
            _tree: &mut YamlTree,
            _key: Option<NodeId>,
            _value: NodeId,
        ) -> Result<()> {
            Ok(())
        }
    }
    impl Handler for Aliases {
        fn as_alias(&mut self) -> Option<&mut dyn VisitsAlias> {
            Some(self)
        }
    }

    #[test]
    fn test_capabilities() {
        assert!(Nothing.capabilities().is_empty());
        assert_eq!(Aliases.capabilities(), Capabilities::ALIAS);
    }

    #[test]
    fn test_forwarding_impls() {
        let mut handler = Aliases;
        assert_eq!((&mut handler).capabilities(), Capabilities::ALIAS);

        let mut boxed: Box<dyn Handler> = Box::new(Aliases);
        assert_eq!(boxed.capabilities(), Capabilities::ALIAS);
        assert!(boxed.name().ends_with("Aliases"));
    }
}
