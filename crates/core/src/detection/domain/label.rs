use std::fmt;

use serde::{Deserialize, Serialize};

/// Liveness verdict attached to a detected face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Real,
    Fake,
    Unknown,
}

/// Class id → label table of the trained model.
///
/// NOTE: the training notes say the exported model's outputs are inverted
/// relative to the dataset labels. The table matches what the served model
/// has always reported; verify against the model's label order before
/// changing it.
pub const CLASS_LABELS: [(u32, Label); 2] = [(0, Label::Real), (1, Label::Fake)];

impl Label {
    /// Maps a model class id; ids outside the table become `Unknown`.
    pub fn from_class_id(class_id: u32) -> Self {
        CLASS_LABELS
            .iter()
            .find(|(id, _)| *id == class_id)
            .map(|(_, label)| *label)
            .unwrap_or(Label::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Real => "real",
            Label::Fake => "fake",
            Label::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
