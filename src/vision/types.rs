//! Description results and the upload set they are derived from.

use crate::error::{CocktailError, Result};
use crate::image::{Role, UploadedImage};
use serde::{Deserialize, Serialize};

/// The three uploads, one per role.
#[derive(Debug, Clone)]
pub struct UploadSet {
    glass: UploadedImage,
    garniture: UploadedImage,
    bite: UploadedImage,
}

impl UploadSet {
    /// Groups three uploads, checking each sits in its own slot.
    pub fn new(glass: UploadedImage, garniture: UploadedImage, bite: UploadedImage) -> Result<Self> {
        for (expected, image) in Role::ALL.iter().zip([&glass, &garniture, &bite]) {
            if image.role() != *expected {
                return Err(CocktailError::InvalidRequest(format!(
                    "{} image uploaded to the {} slot",
                    image.role(),
                    expected
                )));
            }
        }
        Ok(Self {
            glass,
            garniture,
            bite,
        })
    }

    /// Returns the upload for `role`.
    pub fn get(&self, role: Role) -> &UploadedImage {
        match role {
            Role::Glass => &self.glass,
            Role::Garniture => &self.garniture,
            Role::Bite => &self.bite,
        }
    }
}

/// Outcome of describing one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Description {
    /// The model returned a caption.
    Described {
        /// Slot the caption belongs to.
        role: Role,
        /// Trimmed caption text.
        text: String,
    },
    /// The call failed; the cause is kept for display.
    Failed {
        /// Slot whose description failed.
        role: Role,
        /// Human-readable failure cause.
        cause: String,
    },
}

impl Description {
    /// Converts a provider result into a description.
    pub fn from_result(role: Role, result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::Described { role, text },
            Err(e) => Self::Failed {
                role,
                cause: e.to_string(),
            },
        }
    }

    /// Slot this description belongs to.
    pub fn role(&self) -> Role {
        match self {
            Self::Described { role, .. } | Self::Failed { role, .. } => *role,
        }
    }

    /// Caption text, if the call succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Described { text, .. } => Some(text),
            Self::Failed { .. } => None,
        }
    }

    /// Returns true if the call failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One description per role, in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionSet {
    /// Description of the glass.
    pub glass: Description,
    /// Description of the rim garniture.
    pub garniture: Description,
    /// Description of the floating bite.
    pub bite: Description,
}

impl DescriptionSet {
    /// Iterates in upload order.
    pub fn iter(&self) -> impl Iterator<Item = &Description> {
        [&self.glass, &self.garniture, &self.bite].into_iter()
    }

    /// Roles whose description failed.
    pub fn failed_roles(&self) -> Vec<Role> {
        self.iter()
            .filter(|d| d.is_failed())
            .map(Description::role)
            .collect()
    }
}
