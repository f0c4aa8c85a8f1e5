// SPDX-License-Identifier: MPL-2.0

//! Loading dependency universes from the plain-text benchmark format:
//! one package-version per line, followed by its dependency constraints.
//!
//! ```text
//! # comment
//! <pkg> <ver> [<dep>:singleton:<v> | <dep>:range:<lo>:<hi>]...
//! ```
//!
//! The loader is a collaborator of the solver, not part of it, so it lives
//! with the tests.

use std::collections::BTreeMap;

use concord::{resolve, Dependencies, DependencyProvider, OfflineDependencyProvider, Ranges};

type Provider = OfflineDependencyProvider<String, Ranges<u32>>;

/// Parse a dependency universe. Returns the provider and the version given
/// for the `root` package, if any.
fn parse_universe(text: &str) -> Result<(Provider, Option<u32>), String> {
    let mut provider = Provider::new();
    let mut root_version = None;
    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let package = fields
            .next()
            .ok_or_else(|| format!("line {line_num}: missing package name"))?;
        let version: u32 = fields
            .next()
            .ok_or_else(|| format!("line {line_num}: missing version"))?
            .parse()
            .map_err(|e| format!("line {line_num}: invalid version: {e}"))?;
        if package == "root" {
            root_version = Some(version);
        }
        let mut dependencies = Vec::new();
        for spec in fields {
            dependencies.push(parse_constraint(spec).map_err(|e| format!("line {line_num}: {e}"))?);
        }
        provider.add_dependencies(package.to_string(), version, dependencies);
    }
    Ok((provider, root_version))
}

/// Parse one `<dep>:singleton:<v>` or `<dep>:range:<lo>:<hi>` constraint.
fn parse_constraint(spec: &str) -> Result<(String, Ranges<u32>), String> {
    let mut parts = spec.split(':');
    let name = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| format!("missing dependency name in {spec:?}"))?;
    let kind = parts
        .next()
        .ok_or_else(|| format!("missing constraint kind in {spec:?}"))?;
    let range = match kind {
        "singleton" => {
            let v: u32 = parts
                .next()
                .ok_or_else(|| format!("missing version in {spec:?}"))?
                .parse()
                .map_err(|e| format!("invalid version in {spec:?}: {e}"))?;
            Ranges::singleton(v)
        }
        "range" => {
            let lo: u32 = parts
                .next()
                .ok_or_else(|| format!("missing lower bound in {spec:?}"))?
                .parse()
                .map_err(|e| format!("invalid lower bound in {spec:?}: {e}"))?;
            let hi: u32 = parts
                .next()
                .ok_or_else(|| format!("missing upper bound in {spec:?}"))?
                .parse()
                .map_err(|e| format!("invalid upper bound in {spec:?}: {e}"))?;
            Ranges::between(lo, hi)
        }
        other => return Err(format!("unknown constraint kind {other:?} in {spec:?}")),
    };
    if parts.next().is_some() {
        return Err(format!("trailing fields in {spec:?}"));
    }
    Ok((name.to_string(), range))
}

/// Check the solution against the provider: every selected version must
/// exist, and every dependency of every selected version must be satisfied
/// by the solution.
fn assert_solution_sound(provider: &Provider, solution: &BTreeMap<String, u32>) {
    for (package, version) in solution {
        let known: Vec<u32> = provider
            .versions(package)
            .map(|vs| vs.copied().collect())
            .unwrap_or_default();
        assert!(
            known.contains(version),
            "{package} {version} does not exist"
        );
        let Dependencies::Available(constraints) =
            provider.get_dependencies(package, version).unwrap()
        else {
            panic!("{package} {version} has no dependency record");
        };
        for (dependency, range) in constraints {
            let selected = solution
                .get(&dependency)
                .unwrap_or_else(|| panic!("{package} {version} needs {dependency}, not selected"));
            assert!(
                range.contains(selected),
                "{package} {version} needs {dependency} in {range}, got {selected}"
            );
        }
    }
}

#[test]
fn loads_comments_blanks_and_both_constraint_kinds() {
    let text = "
# A small universe with a root.
root 1 foo:range:1:3 bar:singleton:2

foo 1 bar:range:1:3
foo 2 bar:range:4:9
bar 1
bar 2
";
    let (provider, root_version) = parse_universe(text).unwrap();
    assert_eq!(root_version, Some(1));
    assert_eq!(provider.packages().count(), 3);

    let solution: BTreeMap<String, u32> = resolve(&provider, "root".to_string(), 1u32)
        .unwrap()
        .into_iter()
        .collect();
    assert_solution_sound(&provider, &solution);
    // foo 2 would need bar in [4, 9), which contradicts root's bar pin.
    assert_eq!(solution.get("foo"), Some(&1));
    assert_eq!(solution.get("bar"), Some(&2));
}

#[test]
fn rejects_malformed_lines() {
    assert!(parse_universe("root").is_err());
    assert!(parse_universe("root one").is_err());
    assert!(parse_universe("root 1 foo").is_err());
    assert!(parse_universe("root 1 foo:pinned:1").is_err());
    assert!(parse_universe("root 1 foo:range:1").is_err());
    assert!(parse_universe("root 1 foo:range:1:x").is_err());
    assert!(parse_universe("root 1 foo:singleton:1:9").is_err());
}

/// A layered synthetic universe in the spirit of generated benchmark graphs:
/// every package depends only on packages of the next layer, with a mix of
/// range and singleton constraints, so the graph is acyclic but full of
/// diamonds.
#[test]
fn resolves_a_generated_layered_universe() {
    let layers = 4usize;
    let width = 8usize;
    let mut text = String::from("root 10");
    for j in 0..width {
        text.push_str(&format!(" pkg-0-{j}:range:10:30"));
    }
    text.push('\n');
    for layer in 0..layers {
        for j in 0..width {
            for version in [10u32, 20u32] {
                text.push_str(&format!("pkg-{layer}-{j} {version}"));
                if layer + 1 < layers {
                    // A deterministic but irregular fan-out into the next layer.
                    for k in 0..3 {
                        let dep = (j * 7 + k * 5 + layer + version as usize) % width;
                        let next = layer + 1;
                        if (j + k) % 3 == 0 {
                            text.push_str(&format!(" pkg-{next}-{dep}:singleton:20"));
                        } else {
                            text.push_str(&format!(" pkg-{next}-{dep}:range:10:30"));
                        }
                    }
                }
                text.push('\n');
            }
        }
    }

    let (provider, root_version) = parse_universe(&text).unwrap();
    assert_eq!(root_version, Some(10));

    let solution: BTreeMap<String, u32> = resolve(&provider, "root".to_string(), 10u32)
        .unwrap()
        .into_iter()
        .collect();
    assert_solution_sound(&provider, &solution);
    // The whole first layer is reachable from the root.
    for j in 0..width {
        assert!(solution.contains_key(&format!("pkg-0-{j}")));
    }
}
