//! Inheritance graph of the class universe.
//!
//! [`SubtypeGraph`] holds one vertex per known class and one edge per `extends` or `implements`
//! relation, pointing from the subtype to the supertype. It is populated once per run by
//! [`crate::analysis::AnalysisContext::set_app_class_list`]: application classes are marked as
//! such, library classes are added for context, and supertypes that were never resolved
//! themselves appear as [`VertexKind::Unresolved`] placeholders.
//!
//! Application and library classes are linked the same way, with every superclass and interface
//! edge. The two differ only in their [`VertexKind`], which is what
//! [`SubtypeGraph::is_application_class`] and [`SubtypeGraph::application_classes`] report.
//!
//! Queries walk the graph with [`crate::utils::graph::algorithms::dfs`] (towards supertypes) and
//! [`crate::utils::graph::algorithms::reverse_dfs`] (towards subtypes).
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use jvmscope::analysis::{AnalysisCache, AnalysisConfig, InMemoryClassPath, SubtypeGraph};
//! use jvmscope::metadata::class::{ClassInfo, ParsedClass};
//!
//! let classpath = InMemoryClassPath::new();
//! classpath.add_class(ParsedClass::new("a/Base"));
//! classpath.add_class(ParsedClass::new("a/Derived").with_superclass(Some("a/Base")));
//! let cache = AnalysisCache::new(Arc::new(classpath), AnalysisConfig::minimal());
//!
//! let graph = cache.get_database::<SubtypeGraph>();
//! for name in ["a/Base", "a/Derived"] {
//!     let class = cache.registry().class_descriptor(name)?;
//!     let info = cache.get_class_analysis::<ClassInfo>(&class)?;
//!     graph.add_application_class(&info)?;
//! }
//!
//! let base = cache.registry().class_descriptor("a/Base")?;
//! let derived = cache.registry().class_descriptor("a/Derived")?;
//! assert!(graph.is_subtype(&derived, &base));
//! assert!(!graph.is_subtype(&base, &derived));
//! # Ok::<(), jvmscope::Error>(())
//! ```

use std::{
    collections::{HashMap, HashSet},
    sync::RwLock,
};

use strum::Display;

use crate::{
    analysis::{AnalysisCache, Database},
    metadata::{class::ClassInfo, descriptor::ClassDescriptor},
    utils::graph::{
        algorithms::{dfs, reverse_dfs},
        DirectedGraph, NodeId,
    },
    Result,
};

/// How much is known about a vertex' class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum VertexKind {
    /// Class under analysis
    #[strum(serialize = "application")]
    Application,
    /// Class resolved for context only
    #[strum(serialize = "library")]
    Library,
    /// Class referenced as a supertype but never resolved
    #[strum(serialize = "unresolved")]
    Unresolved,
}

/// Kind of an inheritance edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum InheritanceEdge {
    /// `extends`
    #[strum(serialize = "superclass")]
    Superclass,
    /// `implements`, or `extends` between interfaces
    #[strum(serialize = "interface")]
    Interface,
}

/// A class in the inheritance graph
#[derive(Debug, Clone)]
pub struct ClassVertex {
    /// The class
    pub class: ClassDescriptor,
    /// How much is known about it
    pub kind: VertexKind,
    /// Is an interface; `false` for unresolved vertices
    pub is_interface: bool,
}

#[derive(Default)]
struct Inner {
    graph: DirectedGraph<ClassVertex, InheritanceEdge>,
    vertices: HashMap<ClassDescriptor, NodeId>,
    linked: HashSet<ClassDescriptor>,
}

impl Inner {
    fn vertex(&mut self, class: &ClassDescriptor) -> NodeId {
        if let Some(&node) = self.vertices.get(class) {
            return node;
        }
        let node = self.graph.add_node(ClassVertex {
            class: class.clone(),
            kind: VertexKind::Unresolved,
            is_interface: false,
        });
        self.vertices.insert(class.clone(), node);
        node
    }

    fn add(&mut self, class: &ClassInfo, kind: VertexKind) -> Result<()> {
        let node = self.vertex(class.descriptor());
        if let Some(vertex) = self.graph.node_mut(node) {
            // Application wins over library, either wins over unresolved
            if vertex.kind != VertexKind::Application {
                vertex.kind = kind;
            }
            vertex.is_interface = class.is_interface();
        }

        if !self.linked.insert(class.descriptor().clone()) {
            return Ok(());
        }

        if let Some(superclass) = class.superclass() {
            let target = self.vertex(superclass);
            self.graph
                .add_edge(node, target, InheritanceEdge::Superclass)?;
        }
        for interface in class.interfaces() {
            let target = self.vertex(interface);
            self.graph
                .add_edge(node, target, InheritanceEdge::Interface)?;
        }
        Ok(())
    }

    fn class_of(&self, node: NodeId) -> Option<ClassDescriptor> {
        self.graph.node(node).map(|vertex| vertex.class.clone())
    }
}

/// The class inheritance graph of one run.
#[derive(Default)]
pub struct SubtypeGraph {
    inner: RwLock<Inner>,
}

impl SubtypeGraph {
    /// Creates an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an application class and links it to its direct supertypes.
    ///
    /// A class already present as library or unresolved vertex is upgraded; linking happens
    /// only once per class.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if an edge cannot be inserted.
    pub fn add_application_class(&self, class: &ClassInfo) -> Result<()> {
        with_write!(self.inner, |inner: &mut Inner| inner
            .add(class, VertexKind::Application))
    }

    /// Adds a library class and links it to its direct supertypes.
    ///
    /// Library vertices get the same edges as application vertices; only the kind differs.
    /// An application vertex for the same class stays an application vertex.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if an edge cannot be inserted.
    pub fn add_class(&self, class: &ClassInfo) -> Result<()> {
        with_write!(self.inner, |inner: &mut Inner| inner.add(class, VertexKind::Library))
    }

    /// Returns `true` if `class` has a vertex
    #[must_use]
    pub fn contains(&self, class: &ClassDescriptor) -> bool {
        read_lock!(self.inner).vertices.contains_key(class)
    }

    /// The vertex kind of `class`, if it has a vertex
    #[must_use]
    pub fn vertex_kind(&self, class: &ClassDescriptor) -> Option<VertexKind> {
        let inner = read_lock!(self.inner);
        let node = *inner.vertices.get(class)?;
        inner.graph.node(node).map(|vertex| vertex.kind)
    }

    /// Returns `true` if `class` was added as an application class
    #[must_use]
    pub fn is_application_class(&self, class: &ClassDescriptor) -> bool {
        self.vertex_kind(class) == Some(VertexKind::Application)
    }

    /// All application classes, sorted by name
    #[must_use]
    pub fn application_classes(&self) -> Vec<ClassDescriptor> {
        let inner = read_lock!(self.inner);
        let mut classes: Vec<ClassDescriptor> = inner
            .graph
            .nodes()
            .filter(|(_, vertex)| vertex.kind == VertexKind::Application)
            .map(|(_, vertex)| vertex.class.clone())
            .collect();
        classes.sort();
        classes
    }

    /// Returns `true` if `subtype` equals `supertype` or inherits from it transitively.
    ///
    /// Unknown classes are only subtypes of themselves.
    #[must_use]
    pub fn is_subtype(&self, subtype: &ClassDescriptor, supertype: &ClassDescriptor) -> bool {
        if subtype == supertype {
            return true;
        }
        let inner = read_lock!(self.inner);
        let (Some(&from), Some(&to)) = (inner.vertices.get(subtype), inner.vertices.get(supertype))
        else {
            return false;
        };
        dfs(&inner.graph, from).any(|node| node == to)
    }

    /// Direct supertypes of `class`: superclass first, then interfaces in declaration order
    #[must_use]
    pub fn direct_supertypes(&self, class: &ClassDescriptor) -> Vec<ClassDescriptor> {
        let inner = read_lock!(self.inner);
        let Some(&node) = inner.vertices.get(class) else {
            return Vec::new();
        };
        inner
            .graph
            .outgoing_edges(node)
            .filter_map(|(target, _)| inner.class_of(target))
            .collect()
    }

    /// All transitive supertypes of `class`, excluding `class`, in depth-first order
    #[must_use]
    pub fn supertypes(&self, class: &ClassDescriptor) -> Vec<ClassDescriptor> {
        let inner = read_lock!(self.inner);
        let Some(&node) = inner.vertices.get(class) else {
            return Vec::new();
        };
        dfs(&inner.graph, node)
            .skip(1)
            .filter_map(|next| inner.class_of(next))
            .collect()
    }

    /// All transitive subtypes of `class`, excluding `class`, sorted by name
    #[must_use]
    pub fn subtypes(&self, class: &ClassDescriptor) -> Vec<ClassDescriptor> {
        let inner = read_lock!(self.inner);
        let Some(&node) = inner.vertices.get(class) else {
            return Vec::new();
        };
        let mut classes: Vec<ClassDescriptor> = reverse_dfs(&inner.graph, node)
            .skip(1)
            .filter_map(|next| inner.class_of(next))
            .collect();
        classes.sort();
        classes
    }

    /// Number of vertices
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        with_read!(self.inner, |inner: &Inner| inner.graph.node_count())
    }

    /// Number of inheritance edges
    #[must_use]
    pub fn num_edges(&self) -> usize {
        with_read!(self.inner, |inner: &Inner| inner.graph.edge_count())
    }
}

impl Database for SubtypeGraph {
    fn create(_cache: &AnalysisCache) -> Self {
        SubtypeGraph::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        analysis::{AnalysisConfig, InMemoryClassPath},
        metadata::class::{ClassAccessFlags, ParsedClass},
    };

    fn cache() -> AnalysisCache {
        let classpath = InMemoryClassPath::new();
        classpath.add_class(
            ParsedClass::new("java/util/Collection")
                .with_superclass(None)
                .with_access_flags(ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE),
        );
        classpath.add_class(
            ParsedClass::new("java/util/List")
                .with_superclass(None)
                .with_interface("java/util/Collection")
                .with_access_flags(ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE),
        );
        classpath.add_class(ParsedClass::new("a/Base"));
        classpath.add_class(
            ParsedClass::new("a/Items")
                .with_superclass(Some("a/Base"))
                .with_interface("java/util/List"),
        );
        AnalysisCache::new(Arc::new(classpath), AnalysisConfig::minimal())
    }

    fn info(cache: &AnalysisCache, name: &str) -> Arc<ClassInfo> {
        let class = cache.registry().class_descriptor(name).unwrap();
        cache.get_class_analysis::<ClassInfo>(&class).unwrap()
    }

    fn class(cache: &AnalysisCache, name: &str) -> ClassDescriptor {
        cache.registry().class_descriptor(name).unwrap()
    }

    fn populated() -> (AnalysisCache, SubtypeGraph) {
        let cache = cache();
        let graph = SubtypeGraph::new();
        graph.add_application_class(&info(&cache, "a/Base")).unwrap();
        graph.add_application_class(&info(&cache, "a/Items")).unwrap();
        graph.add_class(&info(&cache, "java/util/List")).unwrap();
        graph.add_class(&info(&cache, "java/util/Collection")).unwrap();
        (cache, graph)
    }

    #[test]
    fn transitive_subtyping() {
        let (cache, graph) = populated();
        let items = class(&cache, "a/Items");
        let collection = class(&cache, "java/util/Collection");
        let object = class(&cache, "java/lang/Object");

        assert!(graph.is_subtype(&items, &collection));
        assert!(graph.is_subtype(&items, &object));
        assert!(graph.is_subtype(&items, &items));
        assert!(!graph.is_subtype(&collection, &items));

        let unknown = class(&cache, "z/Unknown");
        assert!(!graph.is_subtype(&unknown, &object));
        assert!(graph.is_subtype(&unknown, &unknown));
    }

    #[test]
    fn vertex_kinds() {
        let (cache, graph) = populated();
        assert_eq!(
            graph.vertex_kind(&class(&cache, "a/Items")),
            Some(VertexKind::Application)
        );
        assert_eq!(
            graph.vertex_kind(&class(&cache, "java/util/List")),
            Some(VertexKind::Library)
        );
        assert_eq!(
            graph.vertex_kind(&class(&cache, "java/lang/Object")),
            Some(VertexKind::Unresolved)
        );
        assert_eq!(graph.vertex_kind(&class(&cache, "z/Unknown")), None);

        let names: Vec<_> = graph
            .application_classes()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["a/Base", "a/Items"]);
    }

    #[test]
    fn supertypes_and_subtypes() {
        let (cache, graph) = populated();
        let items = class(&cache, "a/Items");

        let direct: Vec<_> = graph
            .direct_supertypes(&items)
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(direct, vec!["a/Base", "java/util/List"]);

        let all = graph.supertypes(&items);
        assert_eq!(all.len(), 4);
        assert!(all.contains(&class(&cache, "java/util/Collection")));

        let subtypes: Vec<_> = graph
            .subtypes(&class(&cache, "java/lang/Object"))
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(subtypes, vec!["a/Base", "a/Items"]);
    }

    #[test]
    fn adding_twice_does_not_duplicate_edges() {
        let (cache, graph) = populated();
        let vertices = graph.num_vertices();
        let edges = graph.num_edges();
        assert_eq!(vertices, 5);
        assert_eq!(edges, 4);

        graph.add_class(&info(&cache, "a/Items")).unwrap();
        assert_eq!(graph.num_vertices(), vertices);
        assert_eq!(graph.num_edges(), edges);
        assert!(graph.is_application_class(&class(&cache, "a/Items")));
    }

    #[test]
    fn library_classes_are_linked_like_application_classes() {
        let cache = cache();
        let graph = SubtypeGraph::new();
        graph.add_class(&info(&cache, "a/Items")).unwrap();

        let items = class(&cache, "a/Items");
        assert!(!graph.is_application_class(&items));
        assert_eq!(graph.direct_supertypes(&items).len(), 2);
        assert!(graph.is_subtype(&items, &class(&cache, "java/util/List")));
        assert_eq!(
            graph.vertex_kind(&class(&cache, "java/util/List")),
            Some(VertexKind::Unresolved)
        );
    }
}
