use serde::{Deserialize, Serialize};

use lr_model::TensorSpec;
use lr_tensor::Tensor;

use crate::error::{Result, RunnerError};
use crate::inputs::Inputs;

/// How named inputs are matched against slot names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// The first entry whose key is a substring of the slot name.
    #[default]
    Substring,
    /// An entry whose key equals the slot name, else the substring rule.
    ExactThenSubstring,
}

/// Map caller inputs onto the declared input slots, in slot order.
///
/// Only borrows the caller's tensors; nothing is copied or written here.
pub fn bind<'a>(inputs: &'a Inputs, slots: &[TensorSpec], matching: NameMatching) -> Result<Vec<&'a Tensor>> {
    match inputs {
        Inputs::Positional(tensors) => {
            if tensors.len() != slots.len() {
                return Err(RunnerError::Arity {
                    expected: slots.len(),
                    got: tensors.len(),
                });
            }
            Ok(tensors.iter().collect())
        }
        Inputs::Single(tensor) => {
            if slots.len() != 1 {
                return Err(RunnerError::Arity {
                    expected: slots.len(),
                    got: 1,
                });
            }
            Ok(vec![tensor])
        }
        Inputs::Named(entries) => slots
            .iter()
            .map(|slot| {
                find_named(entries, &slot.name, matching).ok_or_else(|| RunnerError::UnknownInput {
                    slot: slot.name.clone(),
                })
            })
            .collect(),
    }
}

fn find_named<'a>(entries: &'a [(String, Tensor)], slot: &str, matching: NameMatching) -> Option<&'a Tensor> {
    if matching == NameMatching::ExactThenSubstring {
        if let Some((_, t)) = entries.iter().find(|(k, _)| k == slot) {
            return Some(t);
        }
    }
    entries
        .iter()
        .find(|(k, _)| slot.contains(k.as_str()))
        .map(|(_, t)| t)
}
