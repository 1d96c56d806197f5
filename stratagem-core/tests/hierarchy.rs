//! Parent/child registries wired through an application context.

use std::sync::Arc;

use serde_json::json;
use stratagem_core::{
    AppContext, Condition, Context, Declaration, HierarchicalRegistry, Implementation, Registry, RegistryHandle,
};

trait Region: Send + Sync {
    fn code(&self) -> &'static str;
}

macro_rules! region {
    ($ty:ident, $code:literal) => {
        struct $ty;

        impl Region for $ty {
            fn code(&self) -> &'static str {
                $code
            }
        }
    };
}

region!(P1, "p1");
region!(P2, "p2");
region!(C1, "c1");
region!(C2, "c2");
region!(C3, "c3");
region!(C4, "c4");

type RegionImpl = Implementation<dyn Region>;

fn p1() -> RegionImpl {
    RegionImpl::new::<P1>("p1", || Box::new(P1))
}

fn p2() -> RegionImpl {
    RegionImpl::new::<P2>("p2", || Box::new(P2))
}

fn c1() -> RegionImpl {
    RegionImpl::new::<C1>("c1", || Box::new(C1)).parent_slug("p1")
}

fn c2() -> RegionImpl {
    RegionImpl::new::<C2>("c2", || Box::new(C2)).parent_slug("p2")
}

fn c3() -> RegionImpl {
    RegionImpl::new::<C3>("c3", || Box::new(C3))
        .parent_slugs(["p1", "p2"])
        .with_priority(-1)
}

fn c4() -> RegionImpl {
    RegionImpl::new::<C4>("c4", || Box::new(C4))
        .parent_slug("p1")
        .with_condition(Condition::feature_flag("c4"))
}

static PARENTS: [Declaration<dyn Region>; 2] = [p1, p2];
static CHILDREN: [Declaration<dyn Region>; 4] = [c1, c2, c3, c4];

struct Setup {
    app: AppContext,
    parents: Arc<Registry<dyn Region>>,
    children: Arc<HierarchicalRegistry<dyn Region>>,
}

fn setup() -> Setup {
    let app = AppContext::default();
    let parents = Arc::new(
        app.registry_builder::<dyn Region>("Parents")
            .discover_from("parents", &PARENTS)
            .build(),
    );
    let children = Arc::new(
        app.hierarchical_builder::<dyn Region>("Children")
            .discover_from("children", &CHILDREN)
            .with_parent(parents.clone())
            .build(),
    );

    app.add(parents.clone()).unwrap();
    app.add(children.clone()).unwrap();
    app.discover_registries().unwrap();

    Setup { app, parents, children }
}

fn slugs<T>(pairs: Vec<(String, T)>) -> Vec<String> {
    pairs.into_iter().map(|(slug, _)| slug).collect()
}

#[test]
fn test_parent_child_validation() {
    let Setup { children, .. } = setup();

    assert!(children.validate_parent_child_relationship("p1", "c1"));
    assert!(!children.validate_parent_child_relationship("p2", "c1"));
    assert!(children.validate_parent_child_relationship("p2", "c2"));
    assert!(children.validate_parent_child_relationship("p1", "c3"));
    assert!(children.validate_parent_child_relationship("p2", "c3"));
}

#[test]
fn test_children_for_parent_with_context() {
    let Setup { children, .. } = setup();

    assert_eq!(slugs(children.get_children_for_parent("p1", None)), vec!["c1", "c3", "c4"]);

    let context = Context::new();
    assert_eq!(
        slugs(children.get_children_for_parent("p1", Some(&context))),
        vec!["c1", "c3"]
    );

    let context = Context::from(json!({"feature_flags": {"c4": true}}));
    assert_eq!(
        slugs(children.get_choices_for_parent("p1", Some(&context))),
        vec!["c3", "c1", "c4"]
    );
}

#[test]
fn test_hierarchy_map_follows_parent_order() {
    let Setup { parents, children, .. } = setup();

    let map = children.get_hierarchy_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map[0].0, "p1");
    assert_eq!(map[0].1, vec!["c1", "c3", "c4"]);
    assert_eq!(map[1].0, "p2");
    assert_eq!(map[1].1, vec!["c2", "c3"]);

    // A write to the child registry clears the map
    children.unregister("c3").unwrap();
    assert_eq!(children.get_hierarchy_map()[1].1, vec!["c2"]);

    // Parent writes do not clear it until the cache is cleared
    parents.unregister("p2").unwrap();
    assert_eq!(children.get_hierarchy_map().len(), 2);
    children.clear_cache();
    assert_eq!(children.get_hierarchy_map().len(), 1);
}

#[test]
fn test_relationships_recorded_by_context() {
    let Setup { app, parents, children } = setup();

    let recorded = app.relationships().get_children_registries(&*parents);
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].id(), children.registry().id());

    let descendants = app.relationships().get_all_descendants(&*parents);
    assert_eq!(descendants.len(), 1);

    // Closing the loop is rejected
    let parent_handle: Arc<dyn RegistryHandle> = parents.clone();
    let child_handle: Arc<dyn RegistryHandle> = children.clone();
    let err = app.relate(&child_handle, &parent_handle).unwrap_err();
    assert_eq!(err.error_code(), "NOT_HIERARCHICAL");

    let grandchildren: Arc<dyn RegistryHandle> = Arc::new(
        app.hierarchical_builder::<dyn Region>("Grandchildren")
            .discover_from("grandchildren", &[])
            .build(),
    );
    app.relate(&child_handle, &grandchildren).unwrap();
    let err = app.relate(&grandchildren, &child_handle).unwrap_err();
    assert_eq!(err.error_code(), "RELATIONSHIP_CYCLE");
    assert_eq!(app.relationships().get_all_descendants(&*parents).len(), 2);
}

#[test]
fn test_describe_output() {
    let Setup { app, .. } = setup();

    let json = serde_json::to_value(app.describe()).unwrap();
    assert_eq!(json[0]["name"], "Parents");
    assert_eq!(json[0]["children"], json!(["Children"]));
    assert_eq!(json[1]["hierarchical"], true);
    assert_eq!(json[1]["parent"], "Parents");

    let c4 = &json[1]["implementations"][3];
    assert_eq!(c4["slug"], "c4");
    assert_eq!(c4["conditional"], true);
    assert_eq!(c4["condition"], "FeatureFlag(c4)");
    assert_eq!(c4["parent_slugs"], json!(["p1"]));
}
