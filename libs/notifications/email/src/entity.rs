use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the display name shown in the `From` header.
pub const FROM_NAME_MAX: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("recipient list must not be empty")]
    EmptyRecipientList,
    #[error("recipient email address must not be empty")]
    EmptyRecipientAddress,
    #[error("from name must not be empty")]
    EmptyFromName,
    #[error("from name must be at most {FROM_NAME_MAX} characters")]
    FromNameTooLong,
    #[error("body must not be empty")]
    EmptyBody,
}

/// A single destination mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default)]
    pub email_addr: String,
    #[serde(default)]
    pub user_name: String,
}

/// The notification request accepted at intake and carried on the queue.
///
/// Missing JSON fields deserialize to empty values rather than failing,
/// so shape problems surface as validation errors with a concrete cause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub to_list: Vec<Recipient>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl Notification {
    /// Checks the entity before it is allowed onto the queue.
    ///
    /// Recipient rules are checked first: an empty list, then each
    /// address. The first violation wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.to_list.is_empty() {
            return Err(ValidationError::EmptyRecipientList);
        }
        for recipient in &self.to_list {
            if recipient.email_addr.trim().is_empty() {
                return Err(ValidationError::EmptyRecipientAddress);
            }
        }
        if self.from_name.trim().is_empty() {
            return Err(ValidationError::EmptyFromName);
        }
        if self.from_name.chars().count() > FROM_NAME_MAX {
            return Err(ValidationError::FromNameTooLong);
        }
        if self.body.is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }
}
