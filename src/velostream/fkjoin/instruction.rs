//! Subscription instructions

use crate::velostream::error::StreamsError;
use std::fmt;

/// Directive carried by a subscription telling the foreign side what to send back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Primary record deleted or re-keyed away; nothing to send back
    DeleteKeyNoPropagate,
    /// Primary record deleted; send a tombstone response
    DeleteKeyAndPropagate,
    /// Foreign key changed; respond even when there is no foreign value
    PropagateNullIfNoForeignValue,
    /// Respond only when a foreign value exists
    PropagateOnlyIfForeignValueAvailable,
}

impl Instruction {
    /// Wire code of this instruction
    pub fn code(self) -> u8 {
        match self {
            Instruction::DeleteKeyNoPropagate => 0,
            Instruction::DeleteKeyAndPropagate => 1,
            Instruction::PropagateNullIfNoForeignValue => 2,
            Instruction::PropagateOnlyIfForeignValueAvailable => 3,
        }
    }
}

impl TryFrom<u8> for Instruction {
    type Error = StreamsError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Instruction::DeleteKeyNoPropagate),
            1 => Ok(Instruction::DeleteKeyAndPropagate),
            2 => Ok(Instruction::PropagateNullIfNoForeignValue),
            3 => Ok(Instruction::PropagateOnlyIfForeignValueAvailable),
            code => Err(StreamsError::UnknownInstruction { code }),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Instruction::DeleteKeyNoPropagate => "DELETE_KEY_NO_PROPAGATE",
            Instruction::DeleteKeyAndPropagate => "DELETE_KEY_AND_PROPAGATE",
            Instruction::PropagateNullIfNoForeignValue => "PROPAGATE_NULL_IF_NO_FK_VAL_AVAILABLE",
            Instruction::PropagateOnlyIfForeignValueAvailable => {
                "PROPAGATE_ONLY_IF_FK_VAL_AVAILABLE"
            }
        };
        f.write_str(name)
    }
}
