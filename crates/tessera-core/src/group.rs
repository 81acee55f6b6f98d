use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Unique identifier for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Generate a new random group ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// What a group is used for. Members use this to tell a plain group from a world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// A general-purpose collection.
    #[default]
    Plain,
    /// A world that drives events for its members.
    World,
}

/// Non-owning back-reference from a member to the group holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    /// The owning group's ID.
    pub id: GroupId,
    /// The owning group's kind.
    pub kind: GroupKind,
}

/// Contract for values that want to know when they join or leave a [`Group`].
///
/// Both hooks run while the group's lock is held, so implementations must not
/// call back into the same group.
pub trait Groupable: Send + Sync {
    /// Called before the member is stored. Returning `Ok(false)` vetoes the add.
    fn added_to(&self, owner: Owner) -> CoreResult<bool>;

    /// Called after the member has been taken out of the group.
    fn removed_from(&self, owner: Owner);
}

/// A thread-safe, insertion-ordered collection of shared members.
///
/// Members are compared by reference identity (the address of their `Arc`
/// allocation), never by value. Readers take a [`snapshot`](Self::snapshot)
/// and iterate it without holding the lock.
pub struct Group<T: ?Sized + Groupable> {
    owner: Owner,
    members: Mutex<Vec<Arc<T>>>,
}

impl<T: ?Sized + Groupable> fmt::Debug for Group<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.owner.id)
            .field("kind", &self.owner.kind)
            .field("len", &self.len())
            .finish()
    }
}

impl<T: ?Sized + Groupable> Default for Group<T> {
    fn default() -> Self {
        Self::new(GroupKind::Plain)
    }
}

impl<T: ?Sized + Groupable> Group<T> {
    /// Create an empty group of the given kind.
    pub fn new(kind: GroupKind) -> Self {
        Self {
            owner: Owner {
                id: GroupId::new(),
                kind,
            },
            members: Mutex::new(Vec::new()),
        }
    }

    /// This group's ID.
    pub fn id(&self) -> GroupId {
        self.owner.id
    }

    /// The back-reference handed to members on add/remove.
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Add a member.
    ///
    /// Fails with [`CoreError::AlreadyMember`] if the same allocation is
    /// already present, or with [`CoreError::Declined`] if the member vetoes.
    pub fn add(&self, member: Arc<T>) -> CoreResult<()> {
        let mut members = self.members.lock();
        if members.iter().any(|m| same(m, &member)) {
            return Err(CoreError::AlreadyMember { group: self.owner.id });
        }
        if !member.added_to(self.owner)? {
            return Err(CoreError::Declined { group: self.owner.id });
        }
        members.push(member);
        trace!(group = %self.owner.id, len = members.len(), "member added");
        Ok(())
    }

    /// Remove a member, returning the stored handle if it was present.
    pub fn remove<U: ?Sized>(&self, member: &Arc<U>) -> Option<Arc<T>> {
        let removed = {
            let mut members = self.members.lock();
            let index = members.iter().position(|m| same(m, member))?;
            members.remove(index)
        };
        removed.removed_from(self.owner);
        trace!(group = %self.owner.id, "member removed");
        Some(removed)
    }

    /// Look up the stored handle for `member`.
    pub fn find<U: ?Sized>(&self, member: &Arc<U>) -> Option<Arc<T>> {
        self.members
            .lock()
            .iter()
            .find(|m| same(m, member))
            .cloned()
    }

    /// Return `true` if `member` is present.
    pub fn contains<U: ?Sized>(&self, member: &Arc<U>) -> bool {
        self.members.lock().iter().any(|m| same(m, member))
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    /// Return `true` if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    /// Remove every member, notifying each one.
    pub fn clear(&self) {
        let drained = std::mem::take(&mut *self.members.lock());
        for member in &drained {
            member.removed_from(self.owner);
        }
    }

    /// Shallow point-in-time copy of the members, in insertion order.
    ///
    /// Changes to the returned `Vec` do not affect the group; the members
    /// themselves are shared.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.members.lock().clone()
    }

    /// Run `f` over a snapshot of the members and collect the results in order.
    pub fn run_on_all<R>(&self, mut f: impl FnMut(&T) -> R) -> Vec<R> {
        self.snapshot().iter().map(|m| f(m)).collect()
    }
}

fn same<T: ?Sized, U: ?Sized>(a: &Arc<T>, b: &Arc<U>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::object::PointObject;
    use crate::point::Point;

    #[derive(Debug, Default)]
    struct Counter {
        added: AtomicUsize,
        removed: AtomicUsize,
        refuse: bool,
    }

    impl Groupable for Counter {
        fn added_to(&self, _owner: Owner) -> CoreResult<bool> {
            self.added.fetch_add(1, Ordering::SeqCst);
            Ok(!self.refuse)
        }

        fn removed_from(&self, _owner: Owner) {
            self.removed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn add_notifies_and_stores() {
        let group = Group::default();
        let member = Arc::new(Counter::default());
        group.add(Arc::clone(&member)).unwrap();
        assert!(group.contains(&member));
        assert_eq!(group.len(), 1);
        assert_eq!(member.added.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn readd_is_rejected() {
        let group = Group::default();
        let member = Arc::new(Counter::default());
        group.add(Arc::clone(&member)).unwrap();
        let err = group.add(Arc::clone(&member)).unwrap_err();
        assert_eq!(err, CoreError::AlreadyMember { group: group.id() });
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn veto_keeps_member_out() {
        let group = Group::default();
        let member = Arc::new(Counter {
            refuse: true,
            ..Counter::default()
        });
        let err = group.add(Arc::clone(&member)).unwrap_err();
        assert!(matches!(err, CoreError::Declined { .. }));
        assert!(group.is_empty());
    }

    #[test]
    fn identity_not_equality() {
        let group = Group::default();
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        group.add(Arc::clone(&a)).unwrap();
        assert!(!group.contains(&b));
        group.add(b).unwrap();
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn remove_notifies_once() {
        let group = Group::default();
        let member = Arc::new(Counter::default());
        group.add(Arc::clone(&member)).unwrap();
        assert!(group.remove(&member).is_some());
        assert!(group.remove(&member).is_none());
        assert_eq!(member.removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_notifies_everyone() {
        let group = Group::default();
        let members: Vec<_> = (0..3).map(|_| Arc::new(Counter::default())).collect();
        for m in &members {
            group.add(Arc::clone(m)).unwrap();
        }
        group.clear();
        assert!(group.is_empty());
        assert!(members.iter().all(|m| m.removed.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn snapshot_is_detached() {
        let group = Group::default();
        group.add(Arc::new(Counter::default())).unwrap();
        let mut snap = group.snapshot();
        snap.clear();
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn run_on_all_keeps_order() {
        let group: Group<PointObject> = Group::default();
        for x in 0..3 {
            group
                .add(Arc::new(PointObject::new(Point::new(x as f64, 0.0))))
                .unwrap();
        }
        let xs = group.run_on_all(|o| o.x());
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn find_returns_stored_handle() {
        let group: Group<PointObject> = Group::new(GroupKind::World);
        let obj = Arc::new(PointObject::new(Point::ORIGIN));
        group.add(Arc::clone(&obj)).unwrap();
        let found = group.find(&obj).unwrap();
        assert_eq!(found.id(), obj.id());
    }
}
