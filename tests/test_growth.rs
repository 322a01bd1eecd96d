use vascular_cco::growth::{BoxDomain, Domain, GrowthConfig, GrowthError, PowerCost, TreeGenerator};
use vascular_cco::model::{Point, TreeError, VascularTree, VascularTreeBuilder};

const INLET: Point = Point::new(0.0, 0.0, 0.0);

fn domain(seed: u64) -> BoxDomain {
    BoxDomain::new(Point::new(-1.0, 0.0, 0.0), Point::new(1.0, 2.0, 0.0), seed)
}

fn empty_tree() -> VascularTree {
    VascularTreeBuilder::new(INLET, 1.0).with_root_radius(0.1).build()
}

fn config() -> GrowthConfig {
    GrowthConfig::builder().with_bifurcation_tests(5).build().unwrap()
}

#[test]
fn test_grow_to_target() {
    let mut tree = empty_tree();
    let mut generator = TreeGenerator::new(domain(1), config());
    generator.grow(&mut tree, 6).unwrap();

    assert_eq!(tree.num_terminals(), 6);
    assert_eq!(tree.num_vessels(), 11);
    assert!(tree.is_valid());
    assert!(tree.is_consistent(1e-9));
    assert_eq!(tree.root().proximal(), INLET);
    for vessel in tree.vessels() {
        assert!(generator.domain().contains(vessel.distal()));
        assert!(vessel.radius() > 0.0);
    }
}

#[test]
fn test_growth_is_reproducible() {
    let mut first = empty_tree();
    let mut second = empty_tree();
    TreeGenerator::new(domain(5), config()).grow(&mut first, 5).unwrap();
    let sequential = GrowthConfig::builder().with_bifurcation_tests(5).sequential().build().unwrap();
    TreeGenerator::new(domain(5), sequential).grow(&mut second, 5).unwrap();

    let segments = |tree: &VascularTree| tree.vessels().iter().map(|vessel| vessel.segment()).collect::<Vec<_>>();
    assert_eq!(segments(&first), segments(&second));
    assert_eq!(first.total_cost(), second.total_cost());
}

#[test]
fn test_recording() {
    let mut tree = empty_tree();
    let mut generator = TreeGenerator::new(domain(9), config()).with_function(4).recording();
    generator.grow(&mut tree, 4).unwrap();

    let records = generator.records().to_vec();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.function, 4);
        let terminal = tree
            .vessels()
            .iter()
            .find(|vessel| vessel.distal() == record.terminal)
            .unwrap();
        assert!(terminal.is_leaf());
        assert_eq!(terminal.function(), 4);
    }

    assert_eq!(generator.take_records(), records);
    assert!(generator.records().is_empty());
}

#[test]
fn test_not_recording_by_default() {
    let mut tree = empty_tree();
    let mut generator = TreeGenerator::new(domain(2), config());
    generator.grow(&mut tree, 3).unwrap();
    assert!(generator.records().is_empty());
}

#[test]
fn test_alternative_cost() {
    let mut tree = empty_tree();
    let config = GrowthConfig::builder()
        .with_bifurcation_tests(5)
        .with_cost_estimator(PowerCost::new(1, 1))
        .build()
        .unwrap();
    TreeGenerator::new(domain(3), config).grow(&mut tree, 4).unwrap();
    assert_eq!(tree.num_terminals(), 4);
    assert!(tree.is_valid());
}

#[test]
fn test_growth_errors() {
    let mut tree = empty_tree();
    let mut generator = TreeGenerator::new(domain(1), config());
    assert!(matches!(
        generator.add_terminal(&mut tree),
        Err(GrowthError::Tree(TreeError::EmptyTree))
    ));

    generator.grow_root(&mut tree).unwrap();
    assert!(matches!(
        generator.grow_root(&mut tree),
        Err(GrowthError::Tree(TreeError::RootAlreadySet))
    ));

    // the domain is a single point away from the inlet, so no root segment fits
    let point = Point::new(1.0, 1.0, 0.0);
    let limited = GrowthConfig::builder().with_max_attempts(10).build().unwrap();
    let mut stuck = TreeGenerator::new(BoxDomain::new(point, point, 1), limited);
    let mut empty = empty_tree();
    assert!(matches!(
        stuck.grow(&mut empty, 2),
        Err(GrowthError::Exhausted { terminals: 0, attempts: 10 })
    ));
    assert!(empty.is_empty());
}

#[test]
fn test_invalid_config() {
    let coarse = GrowthConfig::builder().with_bifurcation_tests(2).build();
    assert!(matches!(coarse, Err(GrowthError::InvalidConfig(_))));

    let no_reduction = GrowthConfig::builder().with_dlim_reduction_factor(1.0).build();
    assert!(matches!(no_reduction, Err(GrowthError::InvalidConfig(_))));

    let no_trials = GrowthConfig::builder().with_terminal_trials(0).build();
    assert!(matches!(no_trials, Err(GrowthError::InvalidConfig(_))));
}
