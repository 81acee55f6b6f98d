use crate::entity::EntityId;
use crate::group::GroupId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by group membership changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The member is already part of this group.
    #[error("group {group} already contains this member")]
    AlreadyMember {
        /// The group that rejected the add.
        group: GroupId,
    },

    /// The object already belongs to a different group.
    #[error("entity {entity} already belongs to group {owner}")]
    OwnedElsewhere {
        /// The object being added.
        entity: EntityId,
        /// The group that currently owns it.
        owner: GroupId,
    },

    /// The member vetoed joining the group.
    #[error("member declined to join group {group}")]
    Declined {
        /// The group that was declined.
        group: GroupId,
    },
}
