//! User and credential store.
//!
//! A fixed number of slots, each holding one [`UserRecord`]. Slots are
//! addressed 1-based, the way the door-lock cluster numbers users.
//!
//! Records are small `Copy` values. Reads hand out copies; writes validate
//! everything first, build the complete replacement record, then swap it in
//! with a single assignment. A failed write leaves the slot untouched and no
//! reader can ever observe a half-written record.

use boltlock_proto::{CredentialRule, CredentialType, FabricIndex, UserStatus, UserType};
use serde::Serialize;

use crate::{
    bounded::{BoundedName, FixedBuf},
    error::{CredentialError, InvalidArgument},
};

/// Capacity of a user name in bytes.
pub const USER_NAME_CAPACITY: usize = 10;

/// Capacity of one credential's data in bytes (PINs are 4 to 8 digits).
pub const CREDENTIAL_DATA_CAPACITY: usize = 8;

/// Maximum number of credentials attached to one user.
pub const MAX_CREDENTIALS_PER_USER: usize = 5;

/// Fixed-capacity user name.
pub type UserName = BoundedName<USER_NAME_CAPACITY>;

/// Fixed-capacity credential data.
pub type CredentialData = FixedBuf<CREDENTIAL_DATA_CAPACITY>;

/// One credential attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Credential {
    /// Kind of credential
    pub credential_type: CredentialType,
    /// Raw credential data (PIN digits, tag id, ...)
    #[serde(skip)]
    pub data: CredentialData,
}

/// Credentials of one user, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CredentialList {
    entries: [Option<Credential>; MAX_CREDENTIALS_PER_USER],
}

impl CredentialList {
    /// Iterate over the stored credentials.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.entries.iter().flatten()
    }

    /// Number of stored credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no credentials are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }
}

impl Serialize for CredentialList {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Contents of one user slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UserRecord {
    /// Display name
    pub user_name: UserName,
    /// Identifier assigned by the administrator
    pub user_unique_id: u32,
    /// Occupancy of the slot
    pub user_status: UserStatus,
    /// Kind of user
    pub user_type: UserType,
    /// How many credentials must be presented together
    pub credential_rule: CredentialRule,
    /// Attached credentials
    pub credentials: CredentialList,
    /// Fabric that first created the user
    pub created_by: FabricIndex,
    /// Fabric that last modified the user
    pub modified_by: FabricIndex,
}

impl UserRecord {
    /// Whether this record describes an occupied slot.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.user_status.is_occupied()
    }
}

/// Credential as supplied by a `set_user` caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCredential<'a> {
    /// Kind of credential
    pub credential_type: CredentialType,
    /// Raw data, validated against [`CREDENTIAL_DATA_CAPACITY`]
    pub data: &'a [u8],
}

/// Fields of a `set_user` request, borrowed from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewUser<'a> {
    /// Fabric creating the user
    pub creator: FabricIndex,
    /// Fabric issuing this change
    pub modifier: FabricIndex,
    /// Display name, validated against [`USER_NAME_CAPACITY`]
    pub name: &'a str,
    /// Identifier assigned by the administrator
    pub unique_id: u32,
    /// Occupancy of the slot
    pub status: UserStatus,
    /// Kind of user
    pub user_type: UserType,
    /// How many credentials must be presented together
    pub credential_rule: CredentialRule,
    /// Credentials to attach
    pub credentials: &'a [NewCredential<'a>],
}

/// Result of looking up a PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCheck {
    /// An enabled user owns this PIN.
    Matched {
        /// Slot of the owning user
        slot: u16,
    },
    /// Only a disabled user owns this PIN.
    UserDisabled {
        /// Slot of the owning user
        slot: u16,
    },
    /// No user owns this PIN.
    NoMatch,
}

/// Fixed array of user slots.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    slots: Vec<UserRecord>,
}

impl CredentialStore {
    /// Create a store with `slot_count` empty slots.
    ///
    /// The slot vector is allocated once here and never resized.
    #[must_use]
    pub fn new(slot_count: u16) -> Self {
        Self { slots: vec![UserRecord::default(); usize::from(slot_count)] }
    }

    /// Number of slots.
    #[must_use]
    pub fn slot_count(&self) -> u16 {
        self.slots.len() as u16
    }

    /// Copy of the record in `slot`.
    ///
    /// # Errors
    ///
    /// `InvalidSlot` if `slot` is outside `1..=slot_count`.
    pub fn get_user(&self, slot: u16) -> Result<UserRecord, CredentialError> {
        let index = self.index(slot)?;
        Ok(self.slots[index])
    }

    /// Replace the record in `slot`.
    ///
    /// Replacing an occupied slot keeps its original `created_by`.
    ///
    /// # Errors
    ///
    /// - `InvalidSlot` if `slot` is outside `1..=slot_count`
    /// - `InvalidArgument` if the name or credential list fails validation;
    ///   the slot is left unchanged
    pub fn set_user(&mut self, slot: u16, user: NewUser<'_>) -> Result<(), CredentialError> {
        let index = self.index(slot)?;
        let existing = self.slots[index];

        let user_name = UserName::new(user.name).map_err(|e| InvalidArgument::NameTooLong {
            len: e.len,
            capacity: e.capacity,
        })?;
        let credentials = build_credentials(user.credentials)?;

        let created_by = if existing.is_occupied() { existing.created_by } else { user.creator };

        self.slots[index] = UserRecord {
            user_name,
            user_unique_id: user.unique_id,
            user_status: user.status,
            user_type: user.user_type,
            credential_rule: user.credential_rule,
            credentials,
            created_by,
            modified_by: user.modifier,
        };

        tracing::debug!(slot, unique_id = user.unique_id, status = ?user.status, "user slot replaced");
        Ok(())
    }

    /// Reset `slot` to an empty, available record.
    ///
    /// # Errors
    ///
    /// `InvalidSlot` if `slot` is outside `1..=slot_count`.
    pub fn clear_user(&mut self, slot: u16) -> Result<(), CredentialError> {
        let index = self.index(slot)?;
        self.slots[index] = UserRecord::default();
        tracing::debug!(slot, "user slot cleared");
        Ok(())
    }

    /// Occupied slots and their records.
    pub fn users(&self) -> impl Iterator<Item = (u16, &UserRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_occupied())
            .map(|(index, record)| (index as u16 + 1, record))
    }

    /// Find the owner of a PIN.
    ///
    /// An enabled owner wins over a disabled one if both hold the same PIN.
    #[must_use]
    pub fn verify_pin(&self, pin: &[u8]) -> PinCheck {
        let mut disabled = None;

        for (slot, record) in self.users() {
            let owns = record
                .credentials
                .iter()
                .any(|c| c.credential_type.is_pin() && c.data.as_bytes() == pin);
            if !owns {
                continue;
            }

            match record.user_status {
                UserStatus::OccupiedEnabled => return PinCheck::Matched { slot },
                UserStatus::OccupiedDisabled => disabled = disabled.or(Some(slot)),
                UserStatus::Available => {},
            }
        }

        disabled.map_or(PinCheck::NoMatch, |slot| PinCheck::UserDisabled { slot })
    }

    fn index(&self, slot: u16) -> Result<usize, CredentialError> {
        let max = self.slot_count();
        if slot == 0 || slot > max {
            return Err(CredentialError::InvalidSlot { slot, max });
        }
        Ok(usize::from(slot) - 1)
    }
}

fn build_credentials(input: &[NewCredential<'_>]) -> Result<CredentialList, InvalidArgument> {
    if input.len() > MAX_CREDENTIALS_PER_USER {
        return Err(InvalidArgument::TooManyCredentials {
            count: input.len(),
            max: MAX_CREDENTIALS_PER_USER,
        });
    }

    let mut list = CredentialList::default();
    for (index, (credential, entry)) in input.iter().zip(list.entries.iter_mut()).enumerate() {
        if credential.data.is_empty() {
            return Err(InvalidArgument::EmptyCredential { index });
        }
        if credential.credential_type.is_pin()
            && !credential.data.iter().all(u8::is_ascii_digit)
        {
            return Err(InvalidArgument::MalformedPin { index });
        }

        let data = CredentialData::from_slice(credential.data).map_err(|e| {
            InvalidArgument::CredentialTooLong { index, len: e.len, capacity: e.capacity }
        })?;

        *entry = Some(Credential { credential_type: credential.credential_type, data });
    }

    Ok(list)
}
