use vascular_cco::hydraulics::{self, LengthUnit, SolverError};
use vascular_cco::model::{Point, TreeConstraints, TreeError, VascularTree, VascularTreeBuilder};

const EPSILON: f64 = 1e-9;

fn builder() -> VascularTreeBuilder {
    VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 2.0).with_root_radius(0.2)
}

fn grown(mut tree: VascularTree) -> VascularTree {
    tree.add_root(Point::new(0.0, 4.0, 0.0)).unwrap();
    tree.insert(0, Point::new(0.0, 2.0, 0.0), Point::new(1.5, 3.0, 0.0), 0).unwrap();
    tree.insert(1, Point::new(0.0, 3.0, 0.0), Point::new(-1.0, 3.5, 0.0), 0).unwrap();
    tree.insert(2, Point::new(0.8, 2.6, 0.0), Point::new(1.0, 1.0, 0.0), 0).unwrap();
    tree
}

#[test]
fn test_settled_tree_is_consistent() {
    let tree = grown(builder().build());
    assert_eq!(tree.num_terminals(), 4);
    assert!(tree.is_consistent(1e-9));

    let terminal_flow = tree.terminal_flow();
    assert!((terminal_flow - 0.5).abs() < EPSILON);
    for vessel in tree.vessels() {
        match vessel.children() {
            None => assert!((vessel.flow() - terminal_flow).abs() < EPSILON),
            Some((left, right)) => {
                assert!((vessel.flow() - tree[left].flow() - tree[right].flow()).abs() < EPSILON);
            }
        }
    }
    assert!((tree.root().flow() - 2.0).abs() < EPSILON);
}

#[test]
fn test_sibling_betas_follow_exponent() {
    let tree = grown(builder().build());
    for vessel in tree.vessels() {
        if let Some((left, right)) = vessel.children() {
            let sum = tree[left].beta().powi(3) + tree[right].beta().powi(3);
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }
}

#[test]
fn test_symmetric_bifurcation_has_murray_ratio() {
    let mut tree = builder().with_tolerance(1e-12).build();
    tree.add_root(Point::new(0.0, 2.0, 0.0)).unwrap();
    tree.insert(0, Point::new(0.0, 1.0, 0.0), Point::new(1.0, 1.0, 0.0), 0).unwrap();

    let expected = 0.5f64.powf(1.0 / 3.0);
    assert!((tree[1].beta() - expected).abs() < 1e-9);
    assert!((tree[2].beta() - expected).abs() < 1e-9);
    assert!((tree[1].radius() - tree[2].radius()).abs() < 1e-9);
}

#[test]
fn test_settle_is_idempotent() {
    let mut tree = grown(builder().with_tolerance(1e-9).build());
    let betas: Vec<f64> = tree.vessels().iter().map(|vessel| vessel.beta()).collect();

    let iterations = tree.settle().unwrap();
    assert!(iterations >= 1);
    for (vessel, beta) in tree.vessels().iter().zip(betas) {
        assert!((vessel.beta() - beta).abs() < 1e-7);
    }
}

#[test]
fn test_pressure_decreases_downstream() {
    let tree = grown(builder().with_reference_pressure(10.0).build());
    assert!(tree.pressure_drop() > 0.0);
    for vessel in tree.vessels() {
        assert!(vessel.pressure() > 10.0);
        if let Some(parent) = vessel.parent_index() {
            assert!(tree[parent].pressure() > vessel.pressure());
        }
    }
}

#[test]
fn test_viscosity_follows_radius() {
    let tree = grown(builder().build());
    for vessel in tree.vessels() {
        let expected = hydraulics::fahraeus_lindqvist_viscosity(vessel.radius(), LengthUnit::Millimeter);
        assert!((vessel.viscosity() - expected).abs() < EPSILON * expected);
    }
}

#[test]
fn test_divergence_is_reported_and_insert_is_atomic() {
    let constraints = TreeConstraints::new(
        TreeConstraints::constant_viscosity(),
        |level: u32| if level == 0 { 3.0 } else { f64::NAN },
        TreeConstraints::no_symmetry(),
    );
    let mut tree = builder().with_constraints(constraints).build();
    tree.add_root(Point::new(0.0, 4.0, 0.0)).unwrap();
    let root_before = tree.root().clone();

    let result = tree.insert(0, Point::new(0.0, 2.0, 0.0), Point::new(1.0, 2.5, 0.0), 0);
    assert!(matches!(
        result,
        Err(TreeError::Solver(SolverError::Diverged { iteration: 1, .. }))
    ));

    assert_eq!(tree.num_vessels(), 1);
    assert_eq!(tree.num_terminals(), 1);
    assert_eq!(tree.segment_index().len(), 1);
    assert_eq!(tree.root(), &root_before);
    assert!(tree.is_valid());

    // ids are not consumed by a failed insertion
    let (connection, terminal) = tree.split(0, Point::new(0.0, 2.0, 0.0), Point::new(1.0, 2.5, 0.0), 0).unwrap();
    assert_eq!(tree[connection].id(), 1);
    assert_eq!(tree[terminal].id(), 2);
}

#[test]
fn test_iteration_cap() {
    let mut tree = builder().with_tolerance(0.0).with_max_iterations(1).build();
    tree.add_root(Point::new(0.0, 4.0, 0.0)).unwrap();

    let result = tree.insert(0, Point::new(0.0, 1.0, 0.0), Point::new(2.0, 3.0, 0.0), 0);
    assert!(matches!(
        result,
        Err(TreeError::Solver(SolverError::NotConverged { iterations: 1, .. }))
    ));
    assert_eq!(tree.num_terminals(), 1);
}

#[test]
fn test_centimeter_trees_use_scaled_viscosity() {
    let mut tree = builder().with_length_unit(LengthUnit::Centimeter).build();
    tree.add_root(Point::new(0.0, 4.0, 0.0)).unwrap();
    let expected = hydraulics::fahraeus_lindqvist_viscosity(2.0, LengthUnit::Millimeter);
    assert!((tree.root().viscosity() - expected).abs() < EPSILON * expected);
}
