//! Collection types: items, the flat item map and the derived tree.

mod item;
mod map;
mod tree;

pub use item::{Folder, Item, ItemKind, Locator, Request, RequestPatch};
pub use map::ItemMap;
pub use tree::{TreeNode, flatten_ids};
