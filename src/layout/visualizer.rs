use log::{debug, trace};

use super::geometry::{Circle, Point, clamp_inside, enclosing_radius_about};
use super::pack::{PackOptions, pack, separate};
use crate::config::LayoutConfig;
use crate::render::{RenderBinding, ShapeInfo};
use crate::text_metrics::TextMeasure;
use crate::tree::{ExpandedLayout, NodeId, Tree};

/// Computes and maintains the nested circle layout of a [`Tree`].
///
/// All geometry lives in the tree's visual data; the binding only receives
/// the results.
#[derive(Debug, Clone)]
pub struct TreeVisualizer<M> {
    config: LayoutConfig,
    measure: M,
}

impl<M: TextMeasure> TreeVisualizer<M> {
    pub fn new(config: LayoutConfig, measure: M) -> Self {
        Self { config, measure }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn measure(&self) -> &M {
        &self.measure
    }

    fn pack_options(&self) -> PackOptions {
        PackOptions::from_config(&self.config)
    }

    /// Smallest radius that shows `label` centred in the circle.
    pub fn minimum_radius(&self, label: &str) -> f64 {
        self.measure.measure(label) / 2.0 + self.config.text_padding
    }

    /// Smallest radius that shows the label of `id` where it is drawn: centred
    /// for layout leaves, raised by the relative text position otherwise.
    pub fn label_radius(&self, tree: &Tree, id: NodeId) -> f64 {
        let node = tree.node(id);
        let base = self.minimum_radius(node.name());
        if node.is_layout_leaf() {
            return base;
        }
        let k = self.config.text_position();
        base / (1.0 - k * k).sqrt()
    }

    /// Absolute anchor of the label of `id`.
    pub fn text_anchor(&self, tree: &Tree, id: NodeId) -> Point {
        let node = tree.node(id);
        let center = node.visual.absolute();
        if node.is_layout_leaf() {
            center
        } else {
            center - Point::new(0.0, self.config.text_position() * node.visual.r)
        }
    }

    /// Initial layout: radii and relative positions bottom-up, then absolute
    /// positions top-down, then one `create_*` call per node.
    pub fn visualize_tree(&self, tree: &mut Tree, binding: &mut impl RenderBinding) {
        let root = tree.root();
        self.layout_subtree(tree, root);
        tree.visual_mut(root).set_offset(Point::ORIGIN);
        self.update_absolute(tree, root);
        debug!(
            "laid out {} nodes, root radius {:.2}",
            tree.len(),
            tree.visual(root).r
        );
        self.draw(tree, binding);
    }

    /// Reconciles geometry after [`Tree::change_fold`] toggled `id`.
    pub fn adapt_to_fold_state(
        &self,
        tree: &mut Tree,
        id: NodeId,
        binding: &mut impl RenderBinding,
    ) {
        if tree.node(id).original_children().is_empty() {
            return;
        }
        if tree.node(id).is_folded() {
            self.fold(tree, id);
        } else {
            self.unfold(tree, id);
        }
        let root = tree.root();
        self.update_absolute(tree, root);
        self.refresh(tree, binding);
    }

    /// Moves `id` by `(dx, dy)`, clamped to stay inside a non-root parent, and
    /// returns the translation that was applied. Descendants follow.
    pub fn drag_node(
        &self,
        tree: &mut Tree,
        id: NodeId,
        dx: f64,
        dy: f64,
        suppress_animation: bool,
        binding: &mut impl RenderBinding,
    ) -> Point {
        let offset = tree.visual(id).offset();
        let r = tree.visual(id).r;
        let mut candidate = offset + Point::new(dx, dy);
        let mut delta = Point::new(dx, dy);

        let parent = tree.parent(id);
        if let Some(parent) = parent
            && !tree.is_root(parent)
            && let Some(clamped) =
                clamp_inside(candidate, r, tree.visual(parent).r, self.config.tolerance)
        {
            trace!(
                "clamped drag of {} to its parent's rim",
                tree.node(id).full_name()
            );
            candidate = clamped;
            delta = clamped - offset;
        }

        tree.visual_mut(id).set_offset(candidate);
        for descendant in tree.post_order(id) {
            let visual = tree.visual_mut(descendant);
            let moved = visual.absolute() + delta;
            visual.set_absolute(moved);
        }

        if let Some(parent) = parent
            && tree.is_root(parent)
            && self.refit(tree, parent)
        {
            binding.update_circle_radius(parent, tree.visual(parent).r, false);
            binding.position_text(parent, self.text_anchor(tree, parent), suppress_animation);
        }

        let visible: Vec<NodeId> = tree.visible_descendants(id).collect();
        for node in visible {
            binding.update_circle_position(node, tree.visual(node).absolute(), suppress_animation);
            binding.position_text(node, self.text_anchor(tree, node), suppress_animation);
        }
        delta
    }

    fn layout_subtree(&self, tree: &mut Tree, id: NodeId) {
        for node in tree.post_order(id) {
            self.layout_node(tree, node);
        }
    }

    fn layout_node(&self, tree: &mut Tree, id: NodeId) {
        let node = tree.node(id);
        let leaf_radius = self.minimum_radius(node.name());
        let children = node.original_children().to_vec();
        if children.is_empty() {
            let visual = tree.visual_mut(id);
            visual.r = leaf_radius;
            visual.expanded = None;
            return;
        }

        let radii: Vec<f64> = children.iter().map(|c| tree.visual(*c).r).collect();
        let packing = pack(&radii, leaf_radius, &self.pack_options());
        for (child, position) in children.iter().zip(&packing.positions) {
            tree.visual_mut(*child).set_offset(*position);
        }

        let folded = tree.node(id).is_folded();
        // The label of an expanded node sits above the centre.
        let k = self.config.text_position();
        let expanded_r = packing
            .enclosing_radius
            .max(leaf_radius / (1.0 - k * k).sqrt());
        let visual = tree.visual_mut(id);
        if folded {
            visual.expanded = Some(ExpandedLayout {
                r: expanded_r,
                child_offsets: packing.positions,
            });
            visual.r = leaf_radius.max(visual.r);
        } else {
            visual.expanded = None;
            visual.r = expanded_r;
        }
    }

    fn fold(&self, tree: &mut Tree, id: NodeId) {
        let node = tree.node(id);
        let prior_r = node.visual.r;
        let child_offsets: Vec<Point> = node
            .original_children()
            .iter()
            .map(|c| tree.visual(*c).offset())
            .collect();
        // Shrink to the smallest circle on the same level, but keep the label.
        let level_min = match node.parent() {
            Some(parent) => tree
                .node(parent)
                .visible_children()
                .iter()
                .map(|sibling| tree.visual(*sibling).r)
                .fold(prior_r, f64::min),
            None => prior_r,
        };
        let r = self.minimum_radius(node.name()).max(level_min);
        debug!(
            "folded {}: radius {prior_r:.2} -> {r:.2}",
            tree.node(id).full_name()
        );

        let visual = tree.visual_mut(id);
        visual.expanded = Some(ExpandedLayout {
            r: prior_r,
            child_offsets,
        });
        visual.r = r;
        self.propagate_growth(tree, id, prior_r);
    }

    fn unfold(&self, tree: &mut Tree, id: NodeId) {
        let prior_r = tree.visual(id).r;
        let children = tree.node(id).original_children().to_vec();
        let cached = tree.visual_mut(id).expanded.take();
        match cached {
            Some(cache) if cache.child_offsets.len() == children.len() => {
                for (child, offset) in children.iter().zip(cache.child_offsets) {
                    tree.visual_mut(*child).set_offset(offset);
                }
                tree.visual_mut(id).r = cache.r;
            }
            _ => {
                debug!(
                    "no cached layout for {}, laying out again",
                    tree.node(id).full_name()
                );
                self.layout_subtree(tree, id);
            }
        }
        let r = tree.visual(id).r;
        debug!(
            "unfolded {}: radius {prior_r:.2} -> {r:.2}",
            tree.node(id).full_name()
        );

        if let Some(parent) = tree.parent(id)
            && !tree.is_root(parent)
        {
            let offset = tree.visual(id).offset();
            let outer = tree.visual(parent).r;
            if let Some(inside) = clamp_inside(offset, r, outer, self.config.tolerance) {
                debug!(
                    "moved {} back into {}",
                    tree.node(id).full_name(),
                    tree.node(parent).full_name()
                );
                tree.visual_mut(id).set_offset(inside);
            }
        }
        self.propagate_growth(tree, id, prior_r);
    }

    /// Walks up from `id` while radii grow: siblings are pushed away from the
    /// grown node and the parent is enlarged to enclose them. Ancestors are
    /// never re-packed and never shrink, so dragged positions survive.
    fn propagate_growth(&self, tree: &mut Tree, mut id: NodeId, mut before: f64) {
        let options = self.pack_options();
        while let Some(parent) = tree.parent(id) {
            if tree.visual(id).r <= before + options.tolerance {
                break;
            }
            let siblings = tree.node(parent).visible_children().to_vec();
            let pinned = siblings.iter().position(|s| *s == id);
            let mut circles: Vec<Circle> = siblings
                .iter()
                .map(|s| Circle::new(tree.visual(*s).offset(), tree.visual(*s).r))
                .collect();
            separate(
                &mut circles,
                pinned,
                options.padding,
                options.tolerance,
                options.max_iterations,
            );
            for (sibling, circle) in siblings.iter().zip(&circles) {
                tree.visual_mut(*sibling).set_offset(circle.center);
            }

            before = tree.visual(parent).r;
            self.refit(tree, parent);
            id = parent;
        }
    }

    /// Grows `id` so it encloses its visible children and its label. Radii
    /// never shrink here. Returns whether the radius changed.
    fn refit(&self, tree: &mut Tree, id: NodeId) -> bool {
        let circles: Vec<Circle> = tree
            .node(id)
            .visible_children()
            .iter()
            .map(|c| Circle::new(tree.visual(*c).offset(), tree.visual(*c).r))
            .collect();
        let needed = enclosing_radius_about(Point::ORIGIN, &circles).max(self.label_radius(tree, id));
        let visual = tree.visual_mut(id);
        if needed > visual.r + self.config.tolerance {
            trace!("grew circle from {:.2} to {needed:.2}", visual.r);
            visual.r = needed;
            return true;
        }
        false
    }

    fn update_absolute(&self, tree: &mut Tree, id: NodeId) {
        let origin = match tree.parent(id) {
            Some(parent) => tree.visual(parent).absolute(),
            None => Point::ORIGIN,
        };
        let mut stack = vec![(id, origin)];
        while let Some((current, parent_abs)) = stack.pop() {
            let absolute = parent_abs + tree.visual(current).offset();
            tree.visual_mut(current).set_absolute(absolute);
            for child in tree.node(current).original_children() {
                stack.push((*child, absolute));
            }
        }
    }

    fn draw(&self, tree: &Tree, binding: &mut impl RenderBinding) {
        for id in tree.ids() {
            let node = tree.node(id);
            let info = ShapeInfo {
                label: node.name(),
                full_name: node.full_name(),
                depth: node.depth(),
                folded: node.is_folded(),
            };
            binding.create_circle(id, &info, node.visual.absolute(), node.visual.r);
            binding.create_text(id, node.name());
            binding.position_text(id, self.text_anchor(tree, id), true);
            binding.bind_drag_handler(id);
            if !tree.is_visible(id) {
                binding.set_visible(id, false);
            }
        }
    }

    fn refresh(&self, tree: &Tree, binding: &mut impl RenderBinding) {
        for id in tree.ids() {
            let visible = tree.is_visible(id);
            binding.set_visible(id, visible);
            if !visible {
                continue;
            }
            let node = tree.node(id);
            binding.update_circle_radius(id, node.visual.r, node.is_folded());
            binding.update_circle_position(id, node.visual.absolute(), false);
            binding.position_text(id, self.text_anchor(tree, id), false);
        }
    }
}
