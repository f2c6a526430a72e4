use serde::{Deserialize, Serialize};

/// A node of the navigation menu tree returned by `/Auth/GetMenuItems`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MenuItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl MenuItem {
    pub fn is_leaf(&self) -> bool {
        self.items.is_empty()
    }

    /// Depth-first walk of this node and its children, with nesting depth
    pub fn walk(&self) -> Vec<(usize, &MenuItem)> {
        let mut out = Vec::new();
        self.walk_into(0, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a MenuItem)>) {
        out.push((depth, self));
        for child in &self.items {
            child.walk_into(depth + 1, out);
        }
    }

    /// Find the first node in `items` with the given route path
    pub fn find_by_path<'a>(items: &'a [MenuItem], path: &str) -> Option<&'a MenuItem> {
        items
            .iter()
            .flat_map(|item| item.walk())
            .map(|(_, node)| node)
            .find(|node| node.path.as_deref() == Some(path))
    }
}
