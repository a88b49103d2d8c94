//! Prompt composition from the three descriptions and the liquid colour.

use crate::image::Role;
use crate::vision::{Description, DescriptionSet};
use serde::{Deserialize, Serialize};

/// Liquid colour used when the user does not pick one.
pub const DEFAULT_COLOR: &str = "amber";

/// The composed or edited prompt held by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptState {
    text: String,
    failed_roles: Vec<Role>,
    edited: bool,
}

impl PromptState {
    /// Current prompt text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Roles whose description failed and were composed as error text.
    pub fn failed_roles(&self) -> &[Role] {
        &self.failed_roles
    }

    /// Returns true if any description failed.
    pub fn is_degraded(&self) -> bool {
        !self.failed_roles.is_empty()
    }

    /// Returns true once the user has replaced the composed text.
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    /// Replaces the text. Content is not validated.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.edited = true;
    }
}

/// Text inserted for one description.
fn render(description: &Description) -> String {
    match description {
        Description::Described { text, .. } => text.clone(),
        Description::Failed { role, cause } => format!("Error analyzing {}: {}", role, cause),
    }
}

/// Builds the generation prompt.
///
/// Failed descriptions are rendered as `Error analyzing <role>: <cause>` and
/// recorded in [`PromptState::failed_roles`].
pub fn compose(descriptions: &DescriptionSet, color: &str) -> PromptState {
    let text = format!(
        "Create a photorealistic image of a cocktail in a glass that looks like this: {}. \
         Place a garniture on the rim that resembles this: {}, and a floating bite similar to this: {}. \
         The cocktail liquid should be {}. No ice cube floating. White background.",
        render(&descriptions.glass),
        render(&descriptions.garniture),
        render(&descriptions.bite),
        color
    );

    PromptState {
        text,
        failed_roles: descriptions.failed_roles(),
        edited: false,
    }
}
