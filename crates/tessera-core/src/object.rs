use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::group::{GroupId, GroupKind, Groupable, Owner};
use crate::point::Point;

/// Where an object is and which way it faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Location on the plane.
    pub pos: Point,
    /// Rotation in degrees, counter-clockwise.
    pub rot: f64,
}

/// An object that exists on the coordinate plane.
///
/// Shared between a group and its callers through `Arc`, so position and
/// rotation are behind interior locks. The owning group is recorded as a
/// plain [`Owner`] value and never keeps the group alive.
#[derive(Debug)]
pub struct PointObject {
    id: EntityId,
    placement: RwLock<Placement>,
    owner: Mutex<Option<Owner>>,
}

impl PointObject {
    /// Create an unrotated object at `pos`.
    pub fn new(pos: Point) -> Self {
        Self::with_rotation(pos, 0.0)
    }

    /// Create an object at `pos` rotated by `rot` degrees.
    pub fn with_rotation(pos: Point, rot: f64) -> Self {
        Self {
            id: EntityId::new(),
            placement: RwLock::new(Placement { pos, rot }),
            owner: Mutex::new(None),
        }
    }

    /// This object's ID.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Current position and rotation.
    pub fn placement(&self) -> Placement {
        *self.placement.read()
    }

    /// Current position.
    pub fn pos(&self) -> Point {
        self.placement.read().pos
    }

    /// X coordinate of the current position.
    pub fn x(&self) -> f64 {
        self.pos().x
    }

    /// Y coordinate of the current position.
    pub fn y(&self) -> f64 {
        self.pos().y
    }

    /// Move to `pos`.
    pub fn move_to(&self, pos: Point) {
        self.placement.write().pos = pos;
    }

    /// Shift the position by `(dx, dy)`.
    pub fn move_by(&self, dx: f64, dy: f64) {
        let mut placement = self.placement.write();
        placement.pos = placement.pos.offset(dx, dy);
    }

    /// Current rotation in degrees.
    pub fn rot(&self) -> f64 {
        self.placement.read().rot
    }

    /// Rotate counter-clockwise by `amount` degrees (negative turns clockwise).
    pub fn rotate(&self, amount: f64) {
        self.placement.write().rot += amount;
    }

    /// Set the rotation in degrees.
    pub fn set_rot(&self, rot: f64) {
        self.placement.write().rot = rot;
    }

    /// The group currently holding this object, if any.
    pub fn owning_group(&self) -> Option<Owner> {
        *self.owner.lock()
    }

    /// The world currently holding this object, if its group is a world.
    pub fn owning_world(&self) -> Option<GroupId> {
        self.owning_group()
            .filter(|o| o.kind == GroupKind::World)
            .map(|o| o.id)
    }

    fn attach(&self, owner: Owner) -> CoreResult<bool> {
        let mut slot = self.owner.lock();
        match *slot {
            Some(current) if current.id == owner.id => {
                Err(CoreError::AlreadyMember { group: owner.id })
            }
            Some(current) => Err(CoreError::OwnedElsewhere {
                entity: self.id,
                owner: current.id,
            }),
            None => {
                *slot = Some(owner);
                Ok(true)
            }
        }
    }

    fn detach(&self, owner: Owner) {
        let mut slot = self.owner.lock();
        if slot.is_some_and(|current| current.id == owner.id) {
            *slot = None;
        }
    }
}

/// Anything with a spatial body.
///
/// Every `Spatial` value is [`Groupable`]: membership is tracked on its body,
/// which allows at most one owning group at a time.
pub trait Spatial: Send + Sync {
    /// The body carrying position, rotation, and membership.
    fn body(&self) -> &PointObject;
}

impl Spatial for PointObject {
    fn body(&self) -> &PointObject {
        self
    }
}

impl<T: Spatial + ?Sized> Groupable for T {
    fn added_to(&self, owner: Owner) -> CoreResult<bool> {
        self.body().attach(owner)
    }

    fn removed_from(&self, owner: Owner) {
        self.body().detach(owner);
    }
}
