/// Detection class table
///
/// Closed mapping from model class ids to display names. Ids outside the
/// table never fail; they render as `Unknown (<id>)`.

/// Known detection classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionClass {
    Card,
    Skill,
    Event,
    Item,
    Merchant,
    Monster,
    Button,
}

impl DetectionClass {
    /// All classes in id order
    pub const ALL: [DetectionClass; 7] = [
        DetectionClass::Card,
        DetectionClass::Skill,
        DetectionClass::Event,
        DetectionClass::Item,
        DetectionClass::Merchant,
        DetectionClass::Monster,
        DetectionClass::Button,
    ];

    /// Resolve a model class id
    pub fn from_id(class_id: i64) -> Option<Self> {
        usize::try_from(class_id)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Model class id
    pub fn id(&self) -> i64 {
        match self {
            DetectionClass::Card => 0,
            DetectionClass::Skill => 1,
            DetectionClass::Event => 2,
            DetectionClass::Item => 3,
            DetectionClass::Merchant => 4,
            DetectionClass::Monster => 5,
            DetectionClass::Button => 6,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            DetectionClass::Card => "Card",
            DetectionClass::Skill => "Skill",
            DetectionClass::Event => "Event",
            DetectionClass::Item => "Item",
            DetectionClass::Merchant => "Merchant",
            DetectionClass::Monster => "Monster",
            DetectionClass::Button => "Button",
        }
    }
}

impl std::fmt::Display for DetectionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Label used for counting and display, e.g. `Item (3)` or `Unknown (99)`
pub fn class_label(class_id: i64) -> String {
    match DetectionClass::from_id(class_id) {
        Some(class) => format!("{} ({})", class.name(), class_id),
        None => format!("Unknown ({})", class_id),
    }
}
