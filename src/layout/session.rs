use super::geometry::Point;
use super::visualizer::TreeVisualizer;
use crate::render::RenderBinding;
use crate::text_metrics::TextMeasure;
use crate::tree::{NodeId, Tree};

/// A laid out tree together with the binding that shows it. User actions
/// (fold toggles, drags) enter here and are forwarded to the visualizer, so
/// the binding never touches node state.
#[derive(Debug)]
pub struct Session<M, B> {
    tree: Tree,
    visualizer: TreeVisualizer<M>,
    binding: B,
}

impl<M: TextMeasure, B: RenderBinding> Session<M, B> {
    pub fn new(mut tree: Tree, visualizer: TreeVisualizer<M>, mut binding: B) -> Self {
        visualizer.visualize_tree(&mut tree, &mut binding);
        Self {
            tree,
            visualizer,
            binding,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn visualizer(&self) -> &TreeVisualizer<M> {
        &self.visualizer
    }

    pub fn toggle_fold(&mut self, id: NodeId) {
        self.tree.change_fold(id);
        self.visualizer
            .adapt_to_fold_state(&mut self.tree, id, &mut self.binding);
    }

    pub fn set_folded(&mut self, id: NodeId, folded: bool) {
        if self.tree.node(id).is_folded() != folded {
            self.toggle_fold(id);
        }
    }

    /// Pointer-drag callback for the circle of `id`.
    pub fn drag(&mut self, id: NodeId, dx: f64, dy: f64, suppress_animation: bool) -> Point {
        self.visualizer.drag_node(
            &mut self.tree,
            id,
            dx,
            dy,
            suppress_animation,
            &mut self.binding,
        )
    }

    /// Discards interactive changes to positions and lays everything out again.
    pub fn relayout(&mut self) {
        self.visualizer
            .visualize_tree(&mut self.tree, &mut self.binding);
    }

    pub fn into_parts(self) -> (Tree, B) {
        (self.tree, self.binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::render::SceneBinding;
    use crate::text_metrics::FixedWidthMeasure;

    fn session() -> Session<FixedWidthMeasure, SceneBinding> {
        let mut tree = Tree::new("com.example").unwrap();
        let root = tree.root();
        let core = tree.add_child(root, "core").unwrap();
        tree.add_child(core, "Engine").unwrap();
        tree.add_child(core, "Wheel").unwrap();
        tree.add_child(root, "App").unwrap();
        let visualizer = TreeVisualizer::new(LayoutConfig::default(), FixedWidthMeasure::new(6.0));
        Session::new(tree, visualizer, SceneBinding::new())
    }

    #[test]
    fn toggling_fold_hides_and_shows_children() {
        let mut session = session();
        let core = session.tree().id_of("com.example.core").unwrap();
        let engine = session.tree().id_of("com.example.core.Engine").unwrap();

        session.toggle_fold(core);
        assert!(!session.binding().shape(engine).unwrap().visible);
        assert!(session.binding().shape(core).unwrap().folded);

        session.toggle_fold(core);
        assert!(session.binding().shape(engine).unwrap().visible);
        assert!(!session.binding().shape(core).unwrap().folded);
    }

    #[test]
    fn set_folded_is_idempotent() {
        let mut session = session();
        let core = session.tree().id_of("com.example.core").unwrap();
        session.set_folded(core, true);
        let r = session.tree().visual(core).r;
        session.set_folded(core, true);
        assert!(session.tree().node(core).is_folded());
        assert_eq!(session.tree().visual(core).r, r);
    }

    #[test]
    fn drag_updates_binding_positions() {
        let mut session = session();
        let core = session.tree().id_of("com.example.core").unwrap();
        let wheel = session.tree().id_of("com.example.core.Wheel").unwrap();
        let before = session.binding().shape(wheel).unwrap().x;
        session.drag(core, 5.0, 0.0, false);
        let after = session.binding().shape(wheel).unwrap().x;
        assert!((after - before - 5.0).abs() < 1e-9);
        assert!(session.binding().animated_moves > 0);
    }

    #[test]
    fn relayout_restores_packed_positions() {
        let mut session = session();
        let app = session.tree().id_of("com.example.App").unwrap();
        let packed = session.tree().visual(app).offset();
        session.drag(app, 40.0, -25.0, true);
        session.relayout();
        assert_eq!(session.tree().visual(app).offset(), packed);
    }
}
