use crate::error::{ParseError, TreeError};
use crate::tree::{NodeId, Tree};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap());
static QUALIFIED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*$").unwrap());

/// Root name used when class names share no package prefix.
pub const DEFAULT_ROOT: &str = "default";

#[derive(Debug, Deserialize)]
struct TreeDocument {
    name: String,
    #[serde(default)]
    children: Vec<TreeDocument>,
    #[serde(default)]
    folded: bool,
}

/// Builds a tree from either a nested JSON/JSON5 document or a plain list of
/// fully-qualified class names.
pub fn parse_tree(input: &str) -> Result<Tree, ParseError> {
    if input.trim_start().starts_with('{') {
        parse_tree_document(input)
    } else {
        parse_class_list(input)
    }
}

/// `{ name: "com.tngtech", children: [{ name: "main", folded: true }] }`.
/// Child names may be simple or qualified by their parent's full name.
pub fn parse_tree_document(input: &str) -> Result<Tree, ParseError> {
    let document: TreeDocument = json5::from_str(input)?;
    let root_name = document.name.trim();
    if !QUALIFIED_RE.is_match(root_name) {
        return Err(TreeError::InvalidName(root_name.to_string()).into());
    }
    let mut tree = Tree::new(root_name)?;
    let mut folded = Vec::new();
    let root = tree.root();
    if document.folded {
        folded.push(root);
    }
    let mut stack: Vec<(NodeId, &TreeDocument)> = document
        .children
        .iter()
        .rev()
        .map(|child| (root, child))
        .collect();
    while let Some((parent, doc)) = stack.pop() {
        let name = doc.name.trim();
        let prefix = format!("{}.", tree.node(parent).full_name());
        let segment = name.strip_prefix(prefix.as_str()).unwrap_or(name);
        if !SEGMENT_RE.is_match(segment) {
            return Err(TreeError::InvalidName(name.to_string()).into());
        }
        let id = tree.add_child(parent, segment)?;
        if doc.folded {
            folded.push(id);
        }
        stack.extend(doc.children.iter().rev().map(|child| (id, child)));
    }
    for id in folded {
        tree.set_folded(id, true);
    }
    Ok(tree)
}

/// One fully-qualified class name per line; `#` starts a comment. Packages
/// are created for every prefix and the longest common package becomes the
/// root.
pub fn parse_class_list(input: &str) -> Result<Tree, ParseError> {
    let mut names: Vec<Vec<&str>> = Vec::new();
    for (idx, raw_line) in input.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if !QUALIFIED_RE.is_match(line) {
            return Err(ParseError::InvalidClassName {
                line: idx + 1,
                name: line.to_string(),
            });
        }
        names.push(line.split('.').collect());
    }
    if names.is_empty() {
        return Err(ParseError::Empty);
    }

    let prefix_len = common_package_len(&names);
    let root_name = if prefix_len == 0 {
        DEFAULT_ROOT.to_string()
    } else {
        names[0][..prefix_len].join(".")
    };
    let mut tree = Tree::new(&root_name)?;
    for segments in &names {
        let mut current = tree.root();
        for segment in &segments[prefix_len..] {
            let full_name = format!("{}.{}", tree.node(current).full_name(), segment);
            current = match tree.find(&full_name) {
                Some(existing) => existing,
                None => tree.add_child(current, segment)?,
            };
        }
    }
    Ok(tree)
}

/// Number of leading package segments shared by every name. The class
/// segment itself never counts.
fn common_package_len(names: &[Vec<&str>]) -> usize {
    let first = &names[0];
    let mut len = first.len() - 1;
    for segments in &names[1..] {
        let package = &segments[..segments.len() - 1];
        len = len.min(
            first
                .iter()
                .zip(package)
                .take_while(|(a, b)| a == b)
                .count(),
        );
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_builds_packages_below_common_prefix() {
        let input = "\
# test tree
com.tngtech.main.class1
com.tngtech.class2
com.tngtech.test.subtest.subtestclass1
";
        let tree = parse_tree(input).unwrap();
        assert_eq!(tree.node(tree.root()).full_name(), "com.tngtech");
        assert!(tree.find("com.tngtech.main").is_some());
        assert!(tree.find("com.tngtech.test.subtest").is_some());
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn single_class_keeps_its_package_as_root() {
        let tree = parse_tree("org.example.Main").unwrap();
        assert_eq!(tree.node(tree.root()).full_name(), "org.example");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn unrelated_packages_get_default_root() {
        let tree = parse_tree("a.X\nb.Y").unwrap();
        assert_eq!(tree.node(tree.root()).full_name(), DEFAULT_ROOT);
        assert!(tree.find("default.a.X").is_some());
    }

    #[test]
    fn repeated_class_names_are_merged() {
        let tree = parse_tree("p.A\np.A\np.B").unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn invalid_class_name_reports_line() {
        let err = parse_tree("p.A\n\np.9B").unwrap_err();
        assert!(matches!(err, ParseError::InvalidClassName { line: 3, .. }));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_tree("  \n# nothing\n"), Err(ParseError::Empty)));
    }

    #[test]
    fn document_accepts_simple_and_qualified_children() {
        let input = r#"{
            name: "com.tngtech",
            children: [
                { name: "main", folded: true, children: [{ name: "com.tngtech.main.class1" }] },
                { name: "class2" },
            ],
        }"#;
        let tree = parse_tree(input).unwrap();
        let main = tree.id_of("com.tngtech.main").unwrap();
        assert!(tree.node(main).is_folded());
        assert!(tree.find("com.tngtech.main.class1").is_some());
        assert!(tree.find("com.tngtech.class2").is_some());
    }

    #[test]
    fn document_rejects_duplicates() {
        let input = r#"{ "name": "p", "children": [{ "name": "A" }, { "name": "p.A" }] }"#;
        let err = parse_tree(input).unwrap_err();
        assert!(matches!(err, ParseError::Tree(TreeError::DuplicateName(_))));
    }
}
