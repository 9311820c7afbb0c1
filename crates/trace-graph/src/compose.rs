//! View Composer
//!
//! Merges the four edge pools into one de-duplicated edge list for the
//! active [`ViewScope`]. Recomposition is pure; [`ViewComposer`] suppresses
//! it entirely when the derived [`ViewKey`] has not changed.
//!
//! # Pools
//!
//! | category | collapsed | expanded |
//! |---|---|---|
//! | Structural | synthesized | synthesized |
//! | Traceability | all | touching valid ids or container |
//! | Manual | hidden (kept in memory) | touching valid ids or container |
//! | Hierarchy | all | all |

use crate::error::GraphResult;
use crate::flatten::{flatten_with_limit, FlatNodes};
use crate::layout::{LayoutAdapter, PositionedNode};
use crate::synthesize::EdgeSynthesizer;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use trace_model::wire::ParentSummary;
use trace_model::{
    ArtifactId, ArtifactNode, Edge, EdgeCategory, IdSet, ViewKey, ViewKeyHasher, ViewScope,
};

/// Block tree of the container that is currently expanded
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedBlocks {
    pub container: ArtifactId,
    pub roots: Vec<ArtifactNode>,
}

/// Edge pools fed by collaborator services and the mediator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePools {
    traceability: Vec<Edge>,
    manual: Vec<Edge>,
    hierarchy: Vec<Edge>,
}

impl EdgePools {
    #[inline]
    #[must_use]
    pub fn traceability(&self) -> &[Edge] {
        &self.traceability
    }

    #[inline]
    #[must_use]
    pub fn manual(&self) -> &[Edge] {
        &self.manual
    }

    #[inline]
    #[must_use]
    pub fn hierarchy(&self) -> &[Edge] {
        &self.hierarchy
    }

    /// Pool backing a category; structural edges are never pooled
    #[must_use]
    pub fn pool(&self, category: EdgeCategory) -> &[Edge] {
        match category {
            EdgeCategory::Structural => &[],
            EdgeCategory::Traceability => &self.traceability,
            EdgeCategory::Manual => &self.manual,
            EdgeCategory::Hierarchy => &self.hierarchy,
        }
    }

    /// Check whether a pool already holds this pair
    #[must_use]
    pub fn contains_pair(&self, category: EdgeCategory, source: &str, target: &str) -> bool {
        self.pool(category).iter().any(|e| e.pair() == (source, target))
    }
}

/// Collaborator data a view is composed from
///
/// Every mutation bumps the revision; the cache key hashes the content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollaboratorData {
    revision: u64,
    requirements: Vec<ArtifactNode>,
    parents: Vec<ParentSummary>,
    blocks: Option<ExpandedBlocks>,
    pools: EdgePools,
}

impl CollaboratorData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    #[must_use]
    pub fn requirements(&self) -> &[ArtifactNode] {
        &self.requirements
    }

    #[inline]
    #[must_use]
    pub fn parents(&self) -> &[ParentSummary] {
        &self.parents
    }

    #[inline]
    #[must_use]
    pub fn blocks(&self) -> Option<&ExpandedBlocks> {
        self.blocks.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn pools(&self) -> &EdgePools {
        &self.pools
    }

    /// Block roots for `container`, empty when another container is loaded
    #[must_use]
    pub fn blocks_for(&self, container: &str) -> &[ArtifactNode] {
        match &self.blocks {
            Some(b) if b.container == container => &b.roots,
            _ => &[],
        }
    }

    pub fn set_requirements(&mut self, roots: Vec<ArtifactNode>) {
        self.requirements = roots;
        self.bump();
    }

    pub fn set_parents(&mut self, parents: Vec<ParentSummary>) {
        self.parents = parents;
        self.bump();
    }

    pub fn set_blocks(&mut self, container: impl Into<ArtifactId>, roots: Vec<ArtifactNode>) {
        self.blocks = Some(ExpandedBlocks {
            container: container.into(),
            roots,
        });
        self.bump();
    }

    pub fn clear_blocks(&mut self) {
        if self.blocks.take().is_some() {
            self.bump();
        }
    }

    pub fn set_traceability(&mut self, edges: Vec<Edge>) {
        self.pools.traceability = edges;
        self.bump();
    }

    pub fn set_hierarchy(&mut self, edges: Vec<Edge>) {
        self.pools.hierarchy = edges;
        self.bump();
    }

    /// Append to a pool unless the pair is already present
    ///
    /// Returns `false` for a duplicate or a structural edge.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let (source, target) = edge.pair();
        if self.pools.contains_pair(edge.category, source, target) {
            return false;
        }
        let pool = match edge.category {
            EdgeCategory::Structural => return false,
            EdgeCategory::Traceability => &mut self.pools.traceability,
            EdgeCategory::Manual => &mut self.pools.manual,
            EdgeCategory::Hierarchy => &mut self.pools.hierarchy,
        };
        pool.push(edge);
        self.bump();
        true
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Cache key over the semantic inputs of a view
    ///
    /// Hashes content rather than the revision, so distinct datasets never
    /// share a key and equal ones always do.
    #[must_use]
    pub fn view_key(&self, scope: &ViewScope) -> ViewKey {
        let mut hasher = ViewKey::hasher().str(&scope.to_string());

        hasher = mix_forest(hasher.str("requirements"), &self.requirements);

        hasher = hasher.str("parents").len(self.parents.len());
        for parent in &self.parents {
            hasher = hasher
                .str(parent.id.as_str())
                .str(parent.filename.as_deref().unwrap_or_default())
                .u64(parent.block_count);
        }

        hasher = match &self.blocks {
            Some(b) => mix_forest(hasher.str("blocks").str(b.container.as_str()), &b.roots),
            None => hasher.str("no-blocks"),
        };

        for category in EdgeCategory::ALL {
            let pool = self.pools.pool(category);
            hasher = hasher.len(pool.len());
            for edge in pool {
                hasher = hasher
                    .str(edge.id.as_str())
                    .str(edge.label.as_deref().unwrap_or_default());
            }
        }

        hasher.finish()
    }
}

/// Mix a forest in pre-order, each node followed by its child count
fn mix_forest(mut hasher: ViewKeyHasher, roots: &[ArtifactNode]) -> ViewKeyHasher {
    hasher = hasher.len(roots.len());
    let mut stack: Vec<&ArtifactNode> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        let attributes = serde_json::to_string(&node.attributes).unwrap_or_default();
        hasher = hasher
            .str(node.id.as_ref().map_or("", ArtifactId::as_str))
            .str(node.display_name.as_deref().unwrap_or_default())
            .str(node.kind.as_str())
            .str(node.node_type.as_deref().unwrap_or_default())
            .str(&attributes)
            .len(node.children.len());
        stack.extend(node.children.iter().rev());
    }
    hasher
}

/// Whether `edge` belongs in a view of `scope`
///
/// `valid_ids` is the set of rendered block and requirement identifiers.
/// Structural edges are synthesized per scope and always pass.
#[must_use]
pub fn relevant_to(edge: &Edge, scope: &ViewScope, valid_ids: &IdSet) -> bool {
    let touches_scope = |container: &ArtifactId| {
        valid_ids.contains(edge.source.as_str())
            || valid_ids.contains(edge.target.as_str())
            || edge.touches(container.as_str())
    };
    match (edge.category, scope) {
        (EdgeCategory::Structural | EdgeCategory::Hierarchy, _)
        | (EdgeCategory::Traceability, ViewScope::Collapsed) => true,
        (EdgeCategory::Manual, ViewScope::Collapsed) => false,
        (EdgeCategory::Traceability | EdgeCategory::Manual, ViewScope::Expanded { container }) => {
            touches_scope(container)
        }
    }
}

/// Output of one composition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedView {
    pub key: String,
    pub scope: ViewScope,
    pub nodes: Vec<ArtifactNode>,
    pub edges: Vec<Edge>,
    /// Filtered block and requirement identifiers
    #[serde(skip)]
    pub valid_ids: IdSet,
    #[serde(skip)]
    rendered: IdSet,
}

impl ComposedView {
    /// Check whether a node with `id` is rendered
    #[inline]
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.rendered.contains(id)
    }

    /// Edges whose endpoints are both rendered
    pub fn renderable_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(|e| {
            self.rendered.contains(e.source.as_str()) && self.rendered.contains(e.target.as_str())
        })
    }

    /// Check whether the rendered edge set already holds this pair
    #[must_use]
    pub fn has_pair(&self, source: &str, target: &str) -> bool {
        self.edges.iter().any(|e| e.pair() == (source, target))
    }

    #[must_use]
    pub fn edges_of(&self, category: EdgeCategory) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.category == category).collect()
    }

    /// Hand the renderable graph to a layout adapter
    #[must_use]
    pub fn positioned(&self, adapter: &dyn LayoutAdapter) -> Vec<PositionedNode> {
        let edges: Vec<Edge> = self.renderable_edges().cloned().collect();
        adapter.layout(&self.nodes, &edges)
    }
}

/// Compose a view without caching
///
/// # Errors
///
/// Propagates the depth guard of flattening and synthesis.
pub fn compose_view(
    scope: &ViewScope,
    data: &CollaboratorData,
    synthesizer: &EdgeSynthesizer,
) -> GraphResult<ComposedView> {
    let filter = synthesizer.filter();
    let max_depth = synthesizer.max_depth();

    let requirement_flat = filter.retain(flatten_with_limit(data.requirements(), max_depth)?);
    let requirement_valid: IdSet = requirement_flat.keys().cloned().collect();
    let requirement_edges = synthesizer.synthesize(data.requirements(), &requirement_valid)?;

    let mut nodes = FlatNodes::new();
    let mut valid_ids = IdSet::new();
    let mut structural = Vec::new();

    match scope {
        ViewScope::Collapsed => {
            for parent in data.parents() {
                nodes.insert(parent.id.clone(), parent.to_node());
                valid_ids.insert(parent.id.clone());
            }
        }
        ViewScope::Expanded { container } => {
            if let Some(parent) = data.parents().iter().find(|p| p.id == *container) {
                nodes.insert(parent.id.clone(), parent.to_node());
            }
            let roots = data.blocks_for(container.as_str());
            let block_flat = filter.retain(flatten_with_limit(roots, max_depth)?);
            let block_valid: IdSet = block_flat.keys().cloned().collect();
            structural = synthesizer.synthesize(roots, &block_valid)?;
            valid_ids.extend(block_valid);
            nodes.extend(block_flat);
        }
    }

    valid_ids.extend(requirement_valid);
    nodes.extend(requirement_flat);
    structural.extend(requirement_edges);

    let mut edges = Vec::new();
    for category in EdgeCategory::ALL {
        let pool: Vec<&Edge> = match category {
            EdgeCategory::Structural => structural.iter().collect(),
            other => data
                .pools()
                .pool(other)
                .iter()
                .filter(|e| relevant_to(e, scope, &valid_ids))
                .collect(),
        };
        let mut seen = BTreeSet::new();
        edges.extend(pool.into_iter().filter(|e| seen.insert(e.pair())).cloned());
    }

    let rendered: IdSet = nodes.keys().cloned().collect();
    Ok(ComposedView {
        key: data.view_key(scope).to_string(),
        scope: scope.clone(),
        nodes: nodes.into_values().collect(),
        edges,
        valid_ids,
        rendered,
    })
}

/// Caching front of [`compose_view`]
#[derive(Debug, Clone, Default)]
pub struct ViewComposer {
    synthesizer: EdgeSynthesizer,
    last: Option<(ViewKey, Arc<ComposedView>)>,
}

impl ViewComposer {
    #[must_use]
    pub fn new(synthesizer: EdgeSynthesizer) -> Self {
        Self {
            synthesizer,
            last: None,
        }
    }

    /// Compose, reusing the previous output when the key is unchanged
    ///
    /// # Errors
    ///
    /// Propagates [`compose_view`] errors; the previous output is kept.
    pub fn compose(
        &mut self,
        scope: &ViewScope,
        data: &CollaboratorData,
    ) -> GraphResult<Arc<ComposedView>> {
        let key = data.view_key(scope);
        if let Some((last_key, view)) = &self.last {
            if *last_key == key {
                tracing::debug!(key = %key.short(), "View key unchanged, reusing composition");
                return Ok(Arc::clone(view));
            }
        }

        let view = Arc::new(compose_view(scope, data, &self.synthesizer)?);
        tracing::info!(
            key = %key.short(),
            %scope,
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            "Recomposed view"
        );
        self.last = Some((key, Arc::clone(&view)));
        Ok(view)
    }

    /// Last composed view, if any
    #[must_use]
    pub fn current(&self) -> Option<Arc<ComposedView>> {
        self.last.as_ref().map(|(_, view)| Arc::clone(view))
    }

    /// Forget the cached output
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}
