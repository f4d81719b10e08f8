// src/types.rs

//! Small shared enums used across config, DAG, engine and executor.

use std::fmt;

/// The four asset classes handled by transform tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetClass {
    Styles,
    Fonts,
    Scripts,
    Images,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Styles,
        AssetClass::Fonts,
        AssetClass::Scripts,
        AssetClass::Images,
    ];

    /// The transform task that owns this asset class.
    pub fn task(self) -> TaskId {
        match self {
            AssetClass::Styles => TaskId::Styles,
            AssetClass::Fonts => TaskId::Fonts,
            AssetClass::Scripts => TaskId::Scripts,
            AssetClass::Images => TaskId::Images,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.task().as_str()
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node identifier in the static task graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Styles,
    Fonts,
    Scripts,
    Images,
    /// External site generator invocation.
    Generate,
    /// Live-reload signal to connected preview clients.
    Reload,
}

impl TaskId {
    pub const ALL: [TaskId; 6] = [
        TaskId::Styles,
        TaskId::Fonts,
        TaskId::Scripts,
        TaskId::Images,
        TaskId::Generate,
        TaskId::Reload,
    ];

    pub const TRANSFORMS: [TaskId; 4] = [
        TaskId::Styles,
        TaskId::Fonts,
        TaskId::Scripts,
        TaskId::Images,
    ];

    /// Asset class for transform tasks; `None` for generate/reload.
    pub fn asset_class(self) -> Option<AssetClass> {
        match self {
            TaskId::Styles => Some(AssetClass::Styles),
            TaskId::Fonts => Some(AssetClass::Fonts),
            TaskId::Scripts => Some(AssetClass::Scripts),
            TaskId::Images => Some(AssetClass::Images),
            TaskId::Generate | TaskId::Reload => None,
        }
    }

    pub fn is_transform(self) -> bool {
        self.asset_class().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskId::Styles => "styles",
            TaskId::Fonts => "fonts",
            TaskId::Scripts => "scripts",
            TaskId::Images => "images",
            TaskId::Generate => "generate",
            TaskId::Reload => "reload",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_classes_map_onto_transform_tasks() {
        for class in AssetClass::ALL {
            assert!(class.task().is_transform());
            assert_eq!(class.task().asset_class(), Some(class));
        }
        assert!(!TaskId::Generate.is_transform());
        assert!(!TaskId::Reload.is_transform());
    }
}
