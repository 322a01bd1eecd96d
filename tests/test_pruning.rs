use vascular_cco::model::{Point, VascularTree, VascularTreeBuilder, Vessel};
use vascular_cco::pruning::{OldLeavesRule, PredicateRule, PruneError, PruningRule, prune};

fn relative_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * a.abs().max(b.abs())
}

fn stage_zero_tree() -> VascularTree {
    let mut tree = VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 1.0)
        .with_root_radius(0.1)
        .build();
    tree.add_root(Point::new(0.0, 2.0, 0.0)).unwrap();
    tree.insert(0, Point::new(0.0, 1.0, 0.0), Point::new(1.0, 1.5, 0.0), 0).unwrap();
    tree.insert(1, Point::new(0.0, 1.5, 0.0), Point::new(-1.0, 2.0, 0.0), 0).unwrap();
    tree
}

fn find_by_id(tree: &VascularTree, id: u64) -> &Vessel {
    tree.vessels().iter().find(|vessel| vessel.id() == id).unwrap()
}

#[test]
fn test_prune_nothing() {
    let tree = stage_zero_tree();
    let keep_all = PredicateRule::new(|_: &Vessel| false);

    let pruned = prune(&tree, &[&keep_all]).unwrap();
    assert_eq!(pruned.num_vessels(), tree.num_vessels());
    assert_eq!(pruned.num_terminals(), tree.num_terminals());
    assert!(pruned.is_valid());

    for vessel in tree.vessels() {
        let copy = find_by_id(&pruned, vessel.id());
        assert_eq!(copy.segment(), vessel.segment());
        assert!(relative_eq(copy.flow(), vessel.flow(), 1e-9));
        assert!(relative_eq(copy.resistance(), vessel.resistance(), 1e-4));
        assert!(relative_eq(copy.radius(), vessel.radius(), 1e-4));
    }
    assert!(relative_eq(pruned.total_cost(), tree.total_cost(), 1e-4));
}

#[test]
fn test_prune_leaves_of_a_stage() {
    let mut tree = stage_zero_tree();
    let stage_zero_cost = tree.total_cost();
    let stage_zero_segments: Vec<_> = tree.vessels().iter().map(Vessel::segment).collect();

    tree.set_current_stage(1);
    tree.insert(2, Point::new(0.5, 1.1, 0.0), Point::new(0.5, 0.3, 0.0), 0).unwrap();
    assert_eq!(tree.num_terminals(), 4);

    let pruned = prune(&tree, &[&OldLeavesRule::new(1)]).unwrap();
    assert_eq!(pruned.num_terminals(), 3);
    assert_eq!(pruned.num_vessels(), 5);
    assert!(pruned.is_valid());
    assert!(pruned.is_consistent(1e-9));
    assert!(pruned.vessels().iter().all(|vessel| vessel.stage() == 0));

    // the split vessel is fused back into its former segment
    let mut segments: Vec<_> = pruned.vessels().iter().map(Vessel::segment).collect();
    for segment in &stage_zero_segments {
        assert!(segments.contains(segment));
    }
    segments.retain(|segment| !stage_zero_segments.contains(segment));
    assert!(segments.is_empty());
    assert!(relative_eq(pruned.total_cost(), stage_zero_cost, 1e-4));
}

#[test]
fn test_pruned_vessel_drops_its_subtree() {
    let tree = stage_zero_tree();
    // vessel 1 carries the terminals 3 and 4
    let id = tree[1].id();
    let rule = PredicateRule::new(move |vessel: &Vessel| vessel.id() == id);

    let pruned = prune(&tree, &[&rule]).unwrap();
    // the root is fused with its remaining child
    assert_eq!(pruned.num_vessels(), 1);
    assert_eq!(pruned.num_terminals(), 1);
    assert_eq!(pruned.root().segment(), (Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.5, 0.0)));
    assert_eq!(pruned.root().id(), tree.root().id());
    assert!(pruned.is_valid());
    assert!(relative_eq(pruned.root().flow(), 1.0, 1e-12));
}

#[test]
fn test_any_rule_prunes() {
    let tree = stage_zero_tree();
    let never = PredicateRule::new(|_: &Vessel| false);
    let left_terminal = PredicateRule::new(|vessel: &Vessel| vessel.is_leaf() && vessel.distal().x < 0.0);
    let rules: [&dyn PruningRule; 2] = [&never, &left_terminal];

    let pruned = prune(&tree, &rules).unwrap();
    assert_eq!(pruned.num_terminals(), 2);
    assert_eq!(pruned.num_vessels(), 3);
    assert!(pruned.vessels().iter().all(|vessel| vessel.distal().x >= 0.0));
    assert!(pruned.is_valid());
}

#[test]
fn test_prune_errors() {
    let tree = stage_zero_tree();
    let root_rule = PredicateRule::new(|vessel: &Vessel| vessel.is_root());
    assert_eq!(prune(&tree, &[&root_rule]).map(|_| ()), Err(PruneError::RootPruned));

    let empty = VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 1.0).build();
    assert_eq!(prune(&empty, &[]).map(|_| ()), Err(PruneError::EmptyTree));
}
