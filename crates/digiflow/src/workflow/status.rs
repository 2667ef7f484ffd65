//! Step status and edit-type codes.

/// Processing status of a workflow step, stored as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StepStatus {
    Locked,
    Open,
    InWork,
    Done,
}

impl StepStatus {
    pub fn value(self) -> i64 {
        match self {
            StepStatus::Locked => 0,
            StepStatus::Open => 1,
            StepStatus::InWork => 2,
            StepStatus::Done => 3,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(StepStatus::Locked),
            1 => Some(StepStatus::Open),
            2 => Some(StepStatus::InWork),
            3 => Some(StepStatus::Done),
            _ => None,
        }
    }

    /// Parses the status value accepted by automation scripts. Only the
    /// literal digits "0" through "3" are valid.
    pub fn parse_script_value(value: &str) -> Option<Self> {
        match value {
            "0" => Some(StepStatus::Locked),
            "1" => Some(StepStatus::Open),
            "2" => Some(StepStatus::InWork),
            "3" => Some(StepStatus::Done),
            _ => None,
        }
    }
}

/// How a step status change was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEditType {
    Unknown,
    ManualSingle,
    ManualMulti,
    Administrator,
    Automatic,
}

impl StepEditType {
    pub fn value(self) -> i64 {
        match self {
            StepEditType::Unknown => 0,
            StepEditType::ManualSingle => 1,
            StepEditType::ManualMulti => 2,
            StepEditType::Administrator => 3,
            StepEditType::Automatic => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_values_round_trip() {
        for status in [
            StepStatus::Locked,
            StepStatus::Open,
            StepStatus::InWork,
            StepStatus::Done,
        ] {
            assert_eq!(StepStatus::from_value(status.value()), Some(status));
        }
        assert_eq!(StepStatus::from_value(4), None);
        assert_eq!(StepStatus::from_value(-1), None);
    }

    #[test]
    fn test_parse_script_value_strict() {
        assert_eq!(StepStatus::parse_script_value("0"), Some(StepStatus::Locked));
        assert_eq!(StepStatus::parse_script_value("3"), Some(StepStatus::Done));
        assert_eq!(StepStatus::parse_script_value("4"), None);
        assert_eq!(StepStatus::parse_script_value(""), None);
        assert_eq!(StepStatus::parse_script_value("open"), None);
        assert_eq!(StepStatus::parse_script_value(" 1"), None);
    }

    #[test]
    fn test_status_ordering() {
        assert!(StepStatus::Locked < StepStatus::Open);
        assert!(StepStatus::InWork < StepStatus::Done);
    }
}
