//! Manuscript document model.
//!
//! A [`Project`] owns its chapters and notes; a [`Chapter`] owns its scenes.
//! Every collection carries an explicit `order` rank that defines display and
//! render sequence independently of storage order.
//!
//! All mutation goes through `Project` methods so that:
//! - order ranks stay contiguous and unique within their parent
//! - scene word/character counts are recomputed on every content write
//! - timestamps are bumped and change hooks are notified

mod change;
mod chapter;
mod note;
mod project;

pub use change::{ChangeHook, ProjectChange};
pub use chapter::{Chapter, Scene};
pub use note::Note;
pub use project::{Project, ProjectStats, SceneRef};

use uuid::Uuid;

/// Generate a globally unique identifier of the form `<kind>-<uuid>`.
pub fn generate_id(kind: &str) -> String {
    format!("{}-{}", kind, Uuid::new_v4())
}

/// Items ranked within a parent collection.
pub(crate) trait Ranked {
    fn rank(&self) -> u32;
    fn set_rank(&mut self, rank: u32);
}

/// Sort items by rank (stable) and reassign contiguous zero-based ranks.
pub(crate) fn rerank<T: Ranked>(items: &mut [T]) {
    items.sort_by_key(|item| item.rank());
    for (i, item) in items.iter_mut().enumerate() {
        item.set_rank(i as u32);
    }
}

/// Move the item at `from` (in rank order) to `to` and rerank.
pub(crate) fn move_ranked<T: Ranked>(items: &mut Vec<T>, from: usize, to: usize) {
    rerank(items);
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    for (i, item) in items.iter_mut().enumerate() {
        item.set_rank(i as u32);
    }
}

/// Borrow items in ascending rank order, regardless of storage order.
pub(crate) fn in_rank_order<T: Ranked>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| item.rank());
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(u32, &'static str);

    impl Ranked for Item {
        fn rank(&self) -> u32 {
            self.0
        }
        fn set_rank(&mut self, rank: u32) {
            self.0 = rank;
        }
    }

    #[test]
    fn test_generate_id_is_prefixed_and_unique() {
        let a = generate_id("scene");
        let b = generate_id("scene");
        assert!(a.starts_with("scene-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rerank_closes_gaps() {
        let mut items = vec![Item(7, "c"), Item(2, "a"), Item(5, "b")];
        rerank(&mut items);
        let names: Vec<_> = items.iter().map(|i| (i.0, i.1)).collect();
        assert_eq!(names, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn test_move_ranked() {
        let mut items = vec![Item(0, "a"), Item(1, "b"), Item(2, "c")];
        move_ranked(&mut items, 0, 2);
        let names: Vec<_> = items.iter().map(|i| i.1).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert!(items.iter().enumerate().all(|(i, item)| item.0 == i as u32));

        // Out-of-range targets clamp to the end.
        move_ranked(&mut items, 0, 99);
        let names: Vec<_> = items.iter().map(|i| i.1).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_in_rank_order_ignores_storage_order() {
        let items = vec![Item(2, "c"), Item(0, "a"), Item(1, "b")];
        let names: Vec<_> = in_rank_order(&items).iter().map(|i| i.1).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
