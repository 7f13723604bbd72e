//! Status enums mapping to SMALLINT columns.
//!
//! Each variant's discriminant is the value stored in the database. Rows are
//! decoded through [`from_id`](AccountStatus::from_id) so an unknown value is
//! rejected at the store boundary instead of being silently coerced.

use serde::{Serialize, Serializer};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Decode a database status ID. Returns `None` for unknown values.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Upper-case name used in API responses.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl TryFrom<StatusId> for $name {
            type Error = StatusId;

            fn try_from(id: StatusId) -> Result<Self, Self::Error> {
                Self::from_id(id).ok_or(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }
    };
}

define_status_enum! {
    /// Account lifecycle status.
    AccountStatus {
        Active = 1 => "ACTIVE",
        Inactive = 2 => "INACTIVE",
        Blocked = 3 => "BLOCKED",
        Deleted = 4 => "DELETED",
        /// Every device of the account has logged out.
        Logout = 5 => "LOGOUT",
    }
}

define_status_enum! {
    /// Device session status. `Active -> Inactive` is one-way.
    SessionStatus {
        Active = 1 => "ACTIVE",
        Inactive = 2 => "INACTIVE",
    }
}

impl AccountStatus {
    /// Whether an account in this status may sign in at all.
    pub fn can_sign_in(self) -> bool {
        !matches!(self, Self::Blocked | Self::Deleted)
    }
}
