//! Label resolution.
//!
//! Runs exactly once, after every function has been lowered, because label
//! references may point forward, backward, recursively, or across function
//! boundaries. The pass records the 1-based instruction index of every label
//! marker, strips the markers, and rewrites each symbolic `li` operand into
//! the resolved numeric index.

use crate::core::error::{CompileError, CompileResult};
use crate::inst::{Imm, Inst, Line};
use hashbrown::HashMap;

/// Resolve all labels in a lowered stream to numeric instruction indices.
pub fn resolve(lines: Vec<Line>) -> CompileResult<Vec<Inst>> {
    let mut indices: HashMap<String, u64> = HashMap::new();
    for (position, line) in lines.iter().enumerate() {
        for label in &line.labels {
            let index = (position + 1) as u64;
            if indices.insert(label.clone(), index).is_some() {
                return Err(CompileError::LabelCollision {
                    label: label.clone(),
                });
            }
            log::trace!("label `{label}` resolves to instruction {index}");
        }
    }

    lines
        .into_iter()
        .map(|line| match line.inst {
            Inst::Li(reg, Imm::Label(label)) => {
                let index = indices
                    .get(&label)
                    .copied()
                    .ok_or(CompileError::UnresolvedLabel { label })?;
                Ok(Inst::Li(reg, Imm::Value(index)))
            }
            inst => Ok(inst),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(labels: &[&str], inst: Inst) -> Line {
        Line {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            inst,
        }
    }

    #[test]
    fn test_forward_and_backward_references() {
        let lines = vec![
            line(&["top"], Inst::Li(0, Imm::Value(0))),
            line(&[], Inst::Li(1, Imm::Label("bottom".to_string()))),
            line(&[], Inst::Li(2, Imm::Label("top".to_string()))),
            line(&["bottom"], Inst::Exit),
        ];
        let resolved = resolve(lines).unwrap();
        assert_eq!(resolved[1], Inst::Li(1, Imm::Value(4)));
        assert_eq!(resolved[2], Inst::Li(2, Imm::Value(1)));
    }

    #[test]
    fn test_multiple_labels_on_one_instruction() {
        let lines = vec![
            line(&[], Inst::Li(1, Imm::Label("a".to_string()))),
            line(&["a", "b"], Inst::Exit),
        ];
        let resolved = resolve(lines).unwrap();
        assert_eq!(resolved[0], Inst::Li(1, Imm::Value(2)));
    }

    #[test]
    fn test_unresolved_label() {
        let lines = vec![line(&[], Inst::Li(1, Imm::Label("missing".to_string())))];
        assert!(matches!(
            resolve(lines),
            Err(CompileError::UnresolvedLabel { label }) if label == "missing"
        ));
    }

    #[test]
    fn test_label_collision() {
        let lines = vec![line(&["dup"], Inst::Exit), line(&["dup"], Inst::Exit)];
        assert!(matches!(
            resolve(lines),
            Err(CompileError::LabelCollision { label }) if label == "dup"
        ));
    }
}
