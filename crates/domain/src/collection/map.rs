//! Flat id-indexed item map.
//!
//! The map is the arena for a workspace's collection: items point at their
//! parent by id, and the tree is derived on demand.

use std::collections::{HashMap, HashSet};

use super::item::{Item, ItemKind};
use super::tree::TreeNode;
use crate::error::{DomainError, DomainResult};

/// Items of the active workspace indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMap {
    items: HashMap<String, Item>,
}

impl ItemMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an item, returning the previous value.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.items.insert(item.id().to_string(), item)
    }

    /// Looks up an item by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.get_mut(id)
    }

    /// Removes a single item without touching its descendants.
    pub fn remove(&mut self, id: &str) -> Option<Item> {
        self.items.remove(id)
    }

    /// Returns true if an item with `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the map holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over all items in unspecified order.
    pub fn values(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Direct children of `parent_id` (`None` for the root level), unsorted.
    pub fn children_of<'a>(&'a self, parent_id: Option<&'a str>) -> impl Iterator<Item = &'a Item> {
        self.items
            .values()
            .filter(move |item| self.effective_parent(item) == parent_id)
    }

    /// Checks that `parent_id` may hold a new child.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidParent`] when the id is unknown or names
    /// a request.
    pub fn check_parent(&self, parent_id: Option<&str>) -> DomainResult<()> {
        match parent_id {
            None => Ok(()),
            Some(id) => match self.items.get(id) {
                Some(Item::Folder(_)) => Ok(()),
                _ => Err(DomainError::InvalidParent(id.to_string())),
            },
        }
    }

    /// Checks that moving `item_id` under `parent_id` keeps the graph acyclic.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidParent`] for a parent that is not a
    /// folder and [`DomainError::CycleDetected`] when `parent_id` is
    /// `item_id` itself or one of its descendants.
    pub fn check_reparent(&self, item_id: &str, parent_id: Option<&str>) -> DomainResult<()> {
        self.check_parent(parent_id)?;

        let mut seen = HashSet::new();
        let mut cursor = parent_id;
        while let Some(id) = cursor {
            if id == item_id {
                return Err(DomainError::CycleDetected {
                    item: item_id.to_string(),
                    parent: parent_id.unwrap_or_default().to_string(),
                });
            }
            if !seen.insert(id) {
                break;
            }
            cursor = self.items.get(id).and_then(Item::parent_id);
        }
        Ok(())
    }

    /// Ids of `id` and every descendant, children before their parent.
    ///
    /// Returns an empty list when `id` is unknown.
    #[must_use]
    pub fn descendants_post_order(&self, id: &str) -> Vec<String> {
        let Some((root, _)) = self.items.get_key_value(id) else {
            return Vec::new();
        };

        let index = self.children_index();
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<(&str, bool)> = vec![(root.as_str(), false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current.to_string());
                continue;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.push((current, true));
            if let Some(children) = index.get(&Some(current)) {
                stack.extend(children.iter().rev().map(|child| (child.id(), false)));
            }
        }
        out
    }

    /// Builds the display tree.
    ///
    /// At every level folders come before requests, then names ascend in
    /// case-sensitive order. Items whose parent is missing or is not a
    /// folder are shown at the root, as are folders whose parent chain
    /// loops back to themselves.
    #[must_use]
    pub fn build_tree(&self) -> Vec<TreeNode> {
        let index = self.children_index();

        // Folder being built (None for the root level), its unvisited
        // children and the nodes finished so far.
        let mut stack: Vec<(Option<&Item>, std::vec::IntoIter<&Item>, Vec<TreeNode>)> =
            vec![(None, Self::sorted_children(&index, None).into_iter(), Vec::new())];

        while let Some((_, pending, done)) = stack.last_mut() {
            if let Some(child) = pending.next() {
                if child.is_folder() {
                    let children = Self::sorted_children(&index, Some(child.id()));
                    stack.push((Some(child), children.into_iter(), Vec::new()));
                } else {
                    done.push(TreeNode {
                        item: child.clone(),
                        children: Vec::new(),
                    });
                }
                continue;
            }

            let Some((folder, _, children)) = stack.pop() else {
                break;
            };
            match (folder, stack.last_mut()) {
                (Some(folder), Some((_, _, parent_done))) => parent_done.push(TreeNode {
                    item: folder.clone(),
                    children,
                }),
                _ => return children,
            }
        }
        Vec::new()
    }

    fn sorted_children<'a>(
        index: &HashMap<Option<&'a str>, Vec<&'a Item>>,
        parent_id: Option<&'a str>,
    ) -> Vec<&'a Item> {
        let mut children = index.get(&parent_id).cloned().unwrap_or_default();
        children.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        children
    }

    fn children_index(&self) -> HashMap<Option<&str>, Vec<&Item>> {
        let mut index: HashMap<Option<&str>, Vec<&Item>> = HashMap::new();
        for item in self.items.values() {
            index.entry(self.effective_parent(item)).or_default().push(item);
        }
        index
    }

    fn effective_parent<'a>(&self, item: &'a Item) -> Option<&'a str> {
        item.parent_id()
            .filter(|p| self.items.get(*p).is_some_and(Item::is_folder))
            .filter(|_| !self.on_parent_cycle(item.id()))
    }

    /// Ids of folders whose parent chain leads back to themselves.
    ///
    /// Such folders are shown at the root; their descendants stay under them.
    #[must_use]
    pub fn cyclic_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .items
            .keys()
            .filter(|id| self.on_parent_cycle(id))
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn on_parent_cycle(&self, id: &str) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = self.folder_parent(id);
        while let Some(parent) = cursor {
            if parent == id {
                return true;
            }
            if !seen.insert(parent) {
                return false;
            }
            cursor = self.folder_parent(parent);
        }
        false
    }

    fn folder_parent(&self, id: &str) -> Option<&str> {
        self.items
            .get(id)
            .and_then(Item::parent_id)
            .filter(|p| self.items.get(*p).is_some_and(Item::is_folder))
    }
}

fn sort_key(item: &Item) -> (ItemKind, &str, &str) {
    (item.kind(), item.name(), item.id())
}

impl FromIterator<Item> for ItemMap {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|item| (item.id().to_string(), item))
                .collect(),
        }
    }
}

impl From<HashMap<String, Item>> for ItemMap {
    fn from(items: HashMap<String, Item>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::collection::item::{Folder, Request};
    use crate::collection::tree::flatten_ids;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn folder(id: &str, name: &str, parent: Option<&str>) -> Item {
        Folder::new(id, name, now())
            .with_parent(parent.map(String::from))
            .into()
    }

    fn request(id: &str, name: &str, parent: Option<&str>) -> Item {
        Request::new(id, name, now())
            .with_parent(parent.map(String::from))
            .into()
    }

    /// root
    /// ├── api/            (f-api)
    /// │   ├── v1/         (f-v1)
    /// │   │   ├── deep/   (f-deep)
    /// │   │   │   └── leaf (r-leaf)
    /// │   │   └── users    (r-users)
    /// │   └── health       (r-health)
    /// ├── Zeta/           (f-zeta)
    /// └── ping             (r-ping)
    fn sample() -> ItemMap {
        [
            request("r-ping", "ping", None),
            folder("f-api", "api", None),
            folder("f-zeta", "Zeta", None),
            folder("f-v1", "v1", Some("f-api")),
            request("r-health", "health", Some("f-api")),
            request("r-users", "users", Some("f-v1")),
            folder("f-deep", "deep", Some("f-v1")),
            request("r-leaf", "leaf", Some("f-deep")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_tree_orders_folders_first_then_name() {
        let tree = sample().build_tree();
        let root: Vec<_> = tree.iter().map(|n| n.item.name()).collect();
        // Uppercase sorts before lowercase.
        assert_eq!(root, vec!["Zeta", "api", "ping"]);
    }

    #[test]
    fn test_tree_round_trip_preserves_id_set() {
        let map = sample();
        let ids = flatten_ids(&map.build_tree());
        assert_eq!(
            ids,
            vec![
                "f-zeta", "f-api", "f-v1", "f-deep", "r-leaf", "r-users", "r-health", "r-ping"
            ]
        );

        let mut sorted_ids = ids.clone();
        sorted_ids.sort();
        let mut expected: Vec<_> = map.values().map(|i| i.id().to_string()).collect();
        expected.sort();
        assert_eq!(sorted_ids, expected);
    }

    #[test]
    fn test_tree_is_idempotent() {
        let map = sample();
        assert_eq!(map.build_tree(), map.build_tree());
    }

    #[test]
    fn test_requests_have_no_children_in_tree() {
        let tree = sample().build_tree();
        let ping = tree.iter().find(|n| n.item.id() == "r-ping").unwrap();
        assert!(ping.children.is_empty());
        assert_eq!(tree.iter().map(TreeNode::size).sum::<usize>(), 8);
    }

    #[test]
    fn test_orphans_surface_at_root() {
        let map: ItemMap = [
            request("r1", "lost", Some("gone")),
            request("r2", "child-of-request", Some("r1")),
        ]
        .into_iter()
        .collect();
        let ids = flatten_ids(&map.build_tree());
        assert_eq!(ids, vec!["r2", "r1"]);
    }

    #[test]
    fn test_parent_cycles_surface_at_root() {
        let map: ItemMap = [
            folder("a", "a", Some("b")),
            folder("b", "b", Some("a")),
            folder("s", "s", Some("s")),
            request("r", "r", Some("a")),
        ]
        .into_iter()
        .collect();

        let ids = flatten_ids(&map.build_tree());
        assert_eq!(ids, vec!["a", "r", "b", "s"]);

        let mut sorted_ids = ids.clone();
        sorted_ids.sort();
        let mut expected: Vec<_> = map.values().map(|i| i.id().to_string()).collect();
        expected.sort();
        assert_eq!(sorted_ids, expected);

        assert_eq!(map.cyclic_ids(), vec!["a", "b", "s"]);
        assert_eq!(map.descendants_post_order("a"), vec!["r", "a"]);
        assert_eq!(map.descendants_post_order("s"), vec!["s"]);
    }

    #[test]
    fn test_no_cycles_in_well_formed_map() {
        assert!(sample().cyclic_ids().is_empty());
    }

    #[test]
    fn test_deep_nesting() {
        let mut items = vec![folder("f0", "f0", None)];
        for depth in 1..3_000 {
            let parent = format!("f{}", depth - 1);
            let id = format!("f{depth}");
            items.push(folder(&id, &id, Some(&parent)));
        }
        let map: ItemMap = items.into_iter().collect();

        let tree = map.build_tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].size(), 3_000);

        let order = map.descendants_post_order("f0");
        assert_eq!(order.len(), 3_000);
        assert_eq!(order.first().map(String::as_str), Some("f2999"));
        assert_eq!(order.last().map(String::as_str), Some("f0"));
    }

    #[test]
    fn test_descendants_post_order_children_first() {
        let order = sample().descendants_post_order("f-api");
        assert_eq!(order.len(), 6);
        assert_eq!(order.last().map(String::as_str), Some("f-api"));

        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("r-leaf") < pos("f-deep"));
        assert!(pos("f-deep") < pos("f-v1"));
        assert!(pos("r-users") < pos("f-v1"));
        assert!(pos("f-v1") < pos("f-api"));
        assert!(pos("r-health") < pos("f-api"));
    }

    #[test]
    fn test_descendants_of_unknown_is_empty() {
        assert!(sample().descendants_post_order("nope").is_empty());
    }

    #[test]
    fn test_check_parent() {
        let map = sample();
        assert!(map.check_parent(None).is_ok());
        assert!(map.check_parent(Some("f-api")).is_ok());
        assert_eq!(
            map.check_parent(Some("r-ping")),
            Err(DomainError::InvalidParent("r-ping".to_string()))
        );
        assert!(map.check_parent(Some("missing")).is_err());
    }

    #[test]
    fn test_check_reparent_rejects_cycles() {
        let map = sample();
        assert!(map.check_reparent("f-deep", Some("f-zeta")).is_ok());
        assert!(matches!(
            map.check_reparent("f-api", Some("f-deep")),
            Err(DomainError::CycleDetected { .. })
        ));
        assert!(matches!(
            map.check_reparent("f-api", Some("f-api")),
            Err(DomainError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_children_of_root() {
        let map = sample();
        let mut names: Vec<_> = map.children_of(None).map(Item::name).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Zeta", "api", "ping"]);
    }
}
