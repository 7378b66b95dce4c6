use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the host treats a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Boolean,
    Command,
}

/// Blocks this extension answers to, by host opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockOpcode {
    #[serde(rename = "whenBrightLessThan")]
    WhenBrightLessThan,
    #[serde(rename = "whenMotionGreaterThan")]
    WhenMotionGreaterThan,
    #[serde(rename = "switchOn")]
    SwitchOn,
    #[serde(rename = "switchOff")]
    SwitchOff,
}

impl BlockOpcode {
    pub const ALL: [BlockOpcode; 4] = [
        BlockOpcode::WhenBrightLessThan,
        BlockOpcode::WhenMotionGreaterThan,
        BlockOpcode::SwitchOn,
        BlockOpcode::SwitchOff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhenBrightLessThan => "whenBrightLessThan",
            Self::WhenMotionGreaterThan => "whenMotionGreaterThan",
            Self::SwitchOn => "switchOn",
            Self::SwitchOff => "switchOff",
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Self::WhenBrightLessThan | Self::WhenMotionGreaterThan => BlockKind::Boolean,
            Self::SwitchOn | Self::SwitchOff => BlockKind::Command,
        }
    }
}

impl FromStr for BlockOpcode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|opcode| opcode.as_str() == s)
            .ok_or_else(|| anyhow!("Unknown block opcode: {}", s))
    }
}

impl std::fmt::Display for BlockOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value a block hands back to the host scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockValue {
    Bool(bool),
    Unit,
}
