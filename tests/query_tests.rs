use metatree::{MetatreeError, NodeRef, Tree, Value, build_tree};

fn build(text: &str) -> Result<Tree, Box<dyn std::error::Error>> {
    let raw: Value = serde_yaml::from_str(text)?;
    Ok(build_tree(raw)?)
}

fn tags<'t>(nodes: &[NodeRef<'t>]) -> Vec<&'t str> {
    nodes
        .iter()
        .filter_map(|n| n.get("tag").ok().and_then(|t| t.as_str()))
        .collect()
}

const PARAMS: &str = "
name: a
value: 2.4
params:
  - {p1: '1', p2: 2, p3: [11, 22, 33], p4: {x: 10, y: 20, z: 100}}
  - {p1: '3', p2: 4, p3: [11, 22, 33], p4: {x: 20, y: 20, z: 200}}
  - {p1: '3', p2: 4, p3: [11, 22, 33], p4: {x: 20, y: 20, z: 300}}
  - {p1: '3', p2: 4, p3: [11, 22, 33], p4: {x: 30, z: 400}}
";

#[test]
fn query_with_local_key_check() -> Result<(), Box<dyn std::error::Error>> {
    let meta = build(PARAMS)?;

    let result = meta
        .root()
        .query(|n| Ok(n.contains_key("y") && n.property("x")?.as_i64() == Some(20)))
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].property("z")?.as_i64(), Some(200));
    assert_eq!(result[0].property("name")?.as_str(), Some("a"));
    assert_eq!(result[1].property("z")?.as_i64(), Some(300));
    assert_eq!(result[1].property("name")?.as_str(), Some("a"));
    Ok(())
}

#[test]
fn missing_property_skips_node() -> Result<(), Box<dyn std::error::Error>> {
    let meta = build(PARAMS)?;

    // Nodes without a resolvable `y` fail inside the predicate and are
    // skipped instead of ending the search.
    let result = meta
        .root()
        .query(|n| {
            let y = n.property("y")?;
            Ok(y.as_i64() == Some(20) && n.property("x")?.as_i64() == Some(20))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let z: Vec<Option<i64>> = result
        .iter()
        .map(|n| n.get("z").ok().and_then(|z| z.as_i64()))
        .collect();
    assert_eq!(z, vec![Some(200), Some(300)]);
    Ok(())
}

#[test]
fn deepest_first_left_to_right() -> Result<(), Box<dyn std::error::Error>> {
    let tree = build(
        "
tag: root
a:
  tag: a
  a1: {tag: a1, deep: {tag: a1x}}
  a2: {tag: a2}
list:
  - {tag: l0}
  - [{tag: l1x}]
b: {tag: b}
",
    )?;

    let all = tree
        .root()
        .query(|n| Ok(n.contains_key("tag")))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(tags(&all), vec!["a1x", "a1", "a2", "a", "l0", "l1x", "b"]);

    // Sequences are visited too, they just have no `tag` key.
    let sequences = tree
        .root()
        .query(|n| Ok(n.node_type() == metatree::NodeType::Sequence))
        .count();
    assert_eq!(sequences, 2);
    Ok(())
}

#[test]
fn start_node_and_scalars_are_never_yielded() -> Result<(), Box<dyn std::error::Error>> {
    let tree = build("{x: 1, y: [1, 2], z: {w: 3}}")?;
    let start = tree.root().id();

    let visited = tree
        .root()
        .query(|_| Ok(true))
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(visited.len(), 2);
    assert!(visited.iter().all(|n| n.id() != start));
    assert!(visited.iter().all(|n| n.node_type().is_container()));
    Ok(())
}

#[test]
fn query_from_subtree() -> Result<(), Box<dyn std::error::Error>> {
    let meta = build(PARAMS)?;
    let second = meta.root().child("params")?.child(1)?;

    let found = second
        .query(|n| Ok(n.property("p1")?.as_str() == Some("3")))
        .collect::<Result<Vec<_>, _>>()?;

    // p3 (inherits p1 = '3') then p4.
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].len(), 3);
    assert_eq!(found[1].get("z")?.as_i64(), Some(200));
    Ok(())
}

#[test]
fn query_is_lazy() -> Result<(), Box<dyn std::error::Error>> {
    let meta = build(PARAMS)?;
    let mut calls = 0;

    let mut query = meta.root().query(|n| {
        calls += 1;
        Ok(n.contains_key("z"))
    });
    let first = query.next().ok_or("expected a match")??;
    assert_eq!(first.get("z")?.as_i64(), Some(100));
    drop(query);

    // Only p3 and p4 of the first entry were tested.
    assert_eq!(calls, 2);
    Ok(())
}

#[test]
fn other_predicate_errors_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let meta = build(PARAMS)?;

    let results: Vec<_> = meta
        .root()
        .child("params")?
        .query(|n| Ok(n.get("z")?.as_i64() == Some(400)))
        .collect();

    let errors = results
        .iter()
        .filter(|r| matches!(r, Err(MetatreeError::KeyNotFound(_))))
        .count();
    let matches: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();

    // Each entry's p3 is a sequence and index lookups by name are invalid;
    // each entry itself lacks `z`.
    assert_eq!(matches.len(), 1);
    assert_eq!(errors, 4);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(MetatreeError::InvalidIndex(_))))
            .count(),
        4
    );
    Ok(())
}

#[test]
fn first_match() -> Result<(), Box<dyn std::error::Error>> {
    let meta = build(PARAMS)?;

    let found = meta
        .root()
        .first(|n| Ok(n.property("x")?.as_i64() == Some(20)))?;
    assert_eq!(found.get("z")?.as_i64(), Some(200));
    Ok(())
}

#[test]
fn first_without_match_fails() -> Result<(), Box<dyn std::error::Error>> {
    let meta = build(PARAMS)?;

    let err = meta
        .root()
        .first(|n| Ok(n.property("x")?.as_i64() == Some(99)))
        .expect_err("nothing has x == 99");
    assert!(matches!(err, MetatreeError::NoMatch));

    let empty = build("{a: 1}")?;
    assert!(matches!(
        empty.root().first(|_| Ok(true)),
        Err(MetatreeError::NoMatch)
    ));
    Ok(())
}
