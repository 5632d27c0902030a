//! Recursive authorization trees used for order owners and pool managers.

use pallas_crypto::hash::Hash;
use plutus_parser::AsPlutus;

use crate::codec::Hash28;
use crate::error::{DatumError, Result};

#[derive(AsPlutus, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MultiSigScript {
    /// Payment key hash that must sign.
    Signature(Hash28),
    AllOf(Vec<MultiSigScript>),
    AnyOf(Vec<MultiSigScript>),
    AtLeast {
        required: u64,
        scripts: Vec<MultiSigScript>,
    },
    /// Valid only before this POSIX time (milliseconds).
    Before(u64),
    /// Valid only after this POSIX time (milliseconds).
    After(u64),
    /// Script hash that must be run in the same transaction.
    Script(Hash28),
}

impl MultiSigScript {
    /// Rejects trees that can never be satisfied.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::AllOf(children) | Self::AnyOf(children) => {
                children.iter().try_for_each(Self::validate)
            }
            Self::AtLeast { required, scripts } => {
                if *required > scripts.len() as u64 {
                    return Err(DatumError::domain(format!(
                        "at-least {required} of {} can never be satisfied",
                        scripts.len()
                    )));
                }
                scripts.iter().try_for_each(Self::validate)
            }
            Self::Signature(_) | Self::Before(_) | Self::After(_) | Self::Script(_) => Ok(()),
        }
    }

    /// Whether the tree passes for a transaction signed by `signers`, run
    /// together with `scripts`, with a validity range of `[from, to]`.
    pub fn is_satisfied(
        &self,
        signers: &[Hash<28>],
        scripts: &[Hash<28>],
        from: Option<u64>,
        to: Option<u64>,
    ) -> bool {
        let count = |children: &[MultiSigScript]| {
            children
                .iter()
                .filter(|c| c.is_satisfied(signers, scripts, from, to))
                .count() as u64
        };
        match self {
            Self::Signature(key) => signers.contains(&key.0),
            Self::Script(hash) => scripts.contains(&hash.0),
            Self::AllOf(children) => count(children) == children.len() as u64,
            Self::AnyOf(children) => count(children) > 0,
            Self::AtLeast {
                required,
                scripts: children,
            } => count(children) >= *required,
            Self::Before(time) => to.is_some_and(|to| to <= *time),
            Self::After(time) => from.is_some_and(|from| from >= *time),
        }
    }
}

#[cfg(test)]
mod tests {
    use plutus_parser::create_constr;

    use super::*;
    use crate::codec::{Framing, decode, encode_with, from_data};

    fn key(b: u8) -> Hash<28> {
        Hash::new([b; 28])
    }

    fn signature(b: u8) -> MultiSigScript {
        MultiSigScript::Signature(key(b).into())
    }

    fn at_least(required: u64, scripts: Vec<MultiSigScript>) -> MultiSigScript {
        MultiSigScript::AtLeast { required, scripts }
    }

    #[test]
    fn signature_leaf_bytes() {
        let bytes = encode_with(&signature(0xaa).to_plutus(), Framing::Indefinite).unwrap();
        assert_eq!(hex::encode(bytes), format!("d8799f581c{}ff", "aa".repeat(28)));
    }

    #[test]
    fn nested_tree_round_trips() {
        let tree = at_least(
            2,
            vec![
                signature(1),
                MultiSigScript::AllOf(vec![
                    MultiSigScript::Script(key(2).into()),
                    MultiSigScript::After(1_700_000_000_000),
                ]),
                MultiSigScript::AnyOf(vec![]),
                MultiSigScript::Before(5),
            ],
        );
        let bytes = encode_with(&tree.clone().to_plutus(), Framing::Indefinite).unwrap();
        assert_eq!(from_data::<MultiSigScript>(decode(&bytes).unwrap()).unwrap(), tree);
    }

    #[test]
    fn at_least_is_constructor_three() {
        let data = at_least(1, vec![]).to_plutus();
        assert_eq!(hex::encode(encode_with(&data, Framing::Definite).unwrap()), "d87c820180");
    }

    #[test]
    fn unknown_tag_is_mismatch() {
        assert!(matches!(
            from_data::<MultiSigScript>(create_constr(7, vec![])),
            Err(DatumError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn impossible_threshold_is_rejected() {
        let tree = MultiSigScript::AnyOf(vec![at_least(3, vec![signature(1)])]);
        assert!(tree.validate().is_err());
        assert!(at_least(0, vec![]).validate().is_ok());
    }

    #[test]
    fn satisfaction_follows_signers_and_time() {
        let tree = MultiSigScript::AllOf(vec![signature(1), MultiSigScript::After(100)]);
        assert!(tree.is_satisfied(&[key(1)], &[], Some(150), None));
        assert!(!tree.is_satisfied(&[key(1)], &[], Some(50), None));
        assert!(!tree.is_satisfied(&[key(2)], &[], Some(150), None));

        let either = at_least(
            1,
            vec![MultiSigScript::Script(key(9).into()), MultiSigScript::Before(10)],
        );
        assert!(either.is_satisfied(&[], &[key(9)], None, None));
        assert!(either.is_satisfied(&[], &[], None, Some(10)));
        assert!(!either.is_satisfied(&[], &[], None, None));
    }
}
