//! Typed operation model and conversion to/from the wire form.

use serde::{Deserialize, Serialize};

use crate::error::LogError;
use crate::wrapper::root::{Locator, RawOperation};

/// Discriminant for the closed set of operation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    Read,
    Write,
    ReadWrite,
    Swap,
}

impl OpType {
    /// Wire token for this operation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::Read => "read",
            OpType::Write => "write",
            OpType::ReadWrite => "readWrite",
            OpType::Swap => "swap",
        }
    }

    /// Parse a wire token. Unknown tokens yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(OpType::Read),
            "write" => Some(OpType::Write),
            "readWrite" => Some(OpType::ReadWrite),
            "swap" => Some(OpType::Swap),
            _ => None,
        }
    }
}

impl std::fmt::Display for OpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation or observation event, fully validated.
///
/// `ReadWrite` may carry a source, a target, or both; each present side is
/// applied independently against whichever structure matches its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Observation of a value. Does not change the element.
    Read { source: Locator, value: Vec<f64> },

    /// Sets the target element to `value[0]`.
    Write { target: Locator, value: Vec<f64> },

    /// A read and a write issued as one event, e.g. a copy between
    /// structures.
    ReadWrite {
        source: Option<Locator>,
        target: Option<Locator>,
        value: Vec<f64>,
    },

    /// Atomic exchange of two elements' values. After application, `var1`'s
    /// element holds `value[0]` and `var2`'s element holds `value[1]`.
    Swap {
        var1: Locator,
        var2: Locator,
        value: [f64; 2],
    },
}

impl Operation {
    pub fn op_type(&self) -> OpType {
        match self {
            Operation::Read { .. } => OpType::Read,
            Operation::Write { .. } => OpType::Write,
            Operation::ReadWrite { .. } => OpType::ReadWrite,
            Operation::Swap { .. } => OpType::Swap,
        }
    }

    /// All locators this operation references, in slot order.
    pub fn locators(&self) -> Vec<&Locator> {
        match self {
            Operation::Read { source, .. } => vec![source],
            Operation::Write { target, .. } => vec![target],
            Operation::ReadWrite { source, target, .. } => {
                source.iter().chain(target.iter()).collect()
            }
            Operation::Swap { var1, var2, .. } => vec![var1, var2],
        }
    }

    /// Convert a wire operation into a typed one.
    ///
    /// Fails with `Malformed` when a required slot is missing or the value
    /// array is too short for the variant. Locator identifiers are NOT
    /// resolved here; that happens against the mirror during unwrap.
    pub fn from_raw(raw: &RawOperation) -> Result<Self, LogError> {
        let op_type = OpType::parse(&raw.op_type)
            .ok_or_else(|| LogError::Malformed(format!("unknown opType \"{}\"", raw.op_type)))?;
        match op_type {
            OpType::Read => Ok(Operation::Read {
                source: require(&raw.source, "read", "source")?,
                value: raw.value.clone(),
            }),
            OpType::Write => Ok(Operation::Write {
                target: require(&raw.target, "write", "target")?,
                value: raw.value.clone(),
            }),
            OpType::ReadWrite => {
                if raw.source.is_none() && raw.target.is_none() {
                    return Err(LogError::Malformed(
                        "readWrite needs a source or a target".to_string(),
                    ));
                }
                Ok(Operation::ReadWrite {
                    source: raw.source.clone(),
                    target: raw.target.clone(),
                    value: raw.value.clone(),
                })
            }
            OpType::Swap => {
                if raw.value.len() < 2 {
                    return Err(LogError::Malformed(format!(
                        "swap carries {} value slots, needs 2",
                        raw.value.len()
                    )));
                }
                Ok(Operation::Swap {
                    var1: require(&raw.var1, "swap", "var1")?,
                    var2: require(&raw.var2, "swap", "var2")?,
                    value: [raw.value[0], raw.value[1]],
                })
            }
        }
    }

    /// Convert back to the wire form.
    pub fn to_raw(&self) -> RawOperation {
        let mut raw = RawOperation {
            op_type: self.op_type().as_str().to_string(),
            source: None,
            target: None,
            var1: None,
            var2: None,
            value: Vec::new(),
        };
        match self {
            Operation::Read { source, value } => {
                raw.source = Some(source.clone());
                raw.value = value.clone();
            }
            Operation::Write { target, value } => {
                raw.target = Some(target.clone());
                raw.value = value.clone();
            }
            Operation::ReadWrite {
                source,
                target,
                value,
            } => {
                raw.source = source.clone();
                raw.target = target.clone();
                raw.value = value.clone();
            }
            Operation::Swap { var1, var2, value } => {
                raw.var1 = Some(var1.clone());
                raw.var2 = Some(var2.clone());
                raw.value = value.to_vec();
            }
        }
        raw
    }
}

fn require(slot: &Option<Locator>, op: &str, name: &str) -> Result<Locator, LogError> {
    slot.clone()
        .ok_or_else(|| LogError::Malformed(format!("{op} is missing its {name} locator")))
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Read { source, value } => {
                write!(f, "read {source} = {:?}", value)
            }
            Operation::Write { target, value } => {
                write!(f, "write {target} = {:?}", value)
            }
            Operation::ReadWrite {
                source,
                target,
                value,
            } => {
                let src = source
                    .as_ref()
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "_".to_string());
                let tgt = target
                    .as_ref()
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "_".to_string());
                write!(f, "readWrite {src} -> {tgt} = {:?}", value)
            }
            Operation::Swap { var1, var2, value } => {
                write!(f, "swap {var1} <-> {var2} = [{}, {}]", value[0], value[1])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: &str, address: Vec<i32>) -> Locator {
        Locator::new(id, address)
    }

    #[test]
    fn raw_conversion_roundtrip() {
        let ops = vec![
            Operation::Read {
                source: loc("a", vec![1]),
                value: vec![5.0],
            },
            Operation::Write {
                target: loc("a", vec![0]),
                value: vec![3.0],
            },
            Operation::ReadWrite {
                source: Some(loc("a", vec![2])),
                target: Some(loc("tmp", vec![0])),
                value: vec![9.0],
            },
            Operation::Swap {
                var1: loc("a", vec![1]),
                var2: loc("tmp", vec![0]),
                value: [7.0, 5.0],
            },
        ];
        for op in ops {
            let back = Operation::from_raw(&op.to_raw()).unwrap();
            assert_eq!(back, op);
        }
    }

    #[test]
    fn unknown_op_type_is_malformed() {
        let raw = RawOperation {
            op_type: "frobnicate".to_string(),
            source: None,
            target: None,
            var1: None,
            var2: None,
            value: vec![],
        };
        let err = Operation::from_raw(&raw).unwrap_err();
        assert!(matches!(err, LogError::Malformed(_)));
    }

    #[test]
    fn swap_requires_two_value_slots() {
        let raw = RawOperation {
            op_type: "swap".to_string(),
            source: None,
            target: None,
            var1: Some(loc("a", vec![0])),
            var2: Some(loc("a", vec![1])),
            value: vec![1.0],
        };
        assert!(matches!(
            Operation::from_raw(&raw),
            Err(LogError::Malformed(_))
        ));
    }

    #[test]
    fn read_write_needs_at_least_one_side() {
        let raw = RawOperation {
            op_type: "readWrite".to_string(),
            source: None,
            target: None,
            var1: None,
            var2: None,
            value: vec![1.0],
        };
        assert!(matches!(
            Operation::from_raw(&raw),
            Err(LogError::Malformed(_))
        ));
    }

    #[test]
    fn locators_follow_slot_order() {
        let op = Operation::Swap {
            var1: loc("a", vec![0]),
            var2: loc("b", vec![]),
            value: [1.0, 2.0],
        };
        let ids: Vec<_> = op.locators().iter().map(|l| l.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
