#![allow(missing_docs)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use valindex::index::{BalancedTree, QueryDescriptor, ValueIndex};
use valindex::{IndexOptions, Payload, Result};

const TOKEN_COUNT: usize = 20_000;
const SEED: u64 = 0x5eed_cafe;

fn random_token(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let len = rng.gen_range(1..16);
    (0..len).map(|_| rng.gen::<u8>()).collect()
}

#[test]
fn randomized_tokens_stay_balanced_and_ordered() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut tree = BalancedTree::new();
    let mut reference = BTreeMap::new();
    for i in 0..TOKEN_COUNT {
        let token = random_token(&mut rng);
        tree.insert(&token, 1, i as u64)?;
        reference.insert(token, Payload::new(1, i as u64));
    }
    tree.validate()?;
    assert_eq!(tree.len(), reference.len());

    let walked: Vec<&[u8]> = tree.keys().collect();
    assert!(walked.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(walked.iter().copied().eq(reference.keys().map(Vec::as_slice)));

    // 2 * log2(20_001) < 30
    assert!(tree.height() <= 30, "height {}", tree.height());

    for _ in 0..1_000 {
        let probe = random_token(&mut rng);
        assert_eq!(tree.lookup(&probe), reference.get(&probe).copied());
    }
    Ok(())
}

#[test]
fn sorted_input_still_balances() -> Result<()> {
    let mut tree = BalancedTree::new();
    for i in 0..TOKEN_COUNT {
        tree.insert(format!("{i:08}").as_bytes(), 0, 0)?;
    }
    tree.validate()?;
    assert!(tree.height() <= 30);
    assert!(tree.rotations() > 0);
    Ok(())
}

#[derive(Debug, Clone)]
enum Operation {
    Insert { token: Vec<u8>, size: u32, pointer: u64 },
    Lookup { token: Vec<u8> },
    Prefix { token: Vec<u8> },
    Forget { token: Vec<u8> },
}

fn arb_token() -> impl Strategy<Value = Vec<u8>> {
    "[a-c]{0,4}".prop_map(String::into_bytes)
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (arb_token(), any::<u32>(), any::<u64>())
            .prop_map(|(token, size, pointer)| Operation::Insert { token, size, pointer }),
        3 => arb_token().prop_map(|token| Operation::Lookup { token }),
        1 => arb_token().prop_map(|token| Operation::Prefix { token }),
        1 => arb_token().prop_map(|token| Operation::Forget { token }),
    ]
}

proptest! {
    #[test]
    fn prop_cached_index_agrees_with_model(
        ops in prop::collection::vec(arb_operation(), 1..200),
        capacity in 1usize..8,
    ) {
        let options = IndexOptions::new().with_cache_capacity(capacity);
        let mut index = ValueIndex::new(&options).unwrap();
        let mut model: BTreeMap<Vec<u8>, Payload> = BTreeMap::new();

        for op in ops {
            match op {
                Operation::Insert { token, size, pointer } => {
                    index.insert(&token, size, pointer).unwrap();
                    model.insert(token, Payload::new(size, pointer));
                }
                Operation::Lookup { token } => {
                    prop_assert_eq!(index.lookup(&token), model.get(&token).copied());
                }
                Operation::Prefix { token } => {
                    let got: Vec<(Vec<u8>, Payload)> = index
                        .scan(QueryDescriptor::prefix(token.clone()))
                        .map(|(k, p)| (k.to_vec(), p))
                        .collect();
                    let want: Vec<(Vec<u8>, Payload)> = model
                        .iter()
                        .filter(|(k, _)| k.starts_with(&token))
                        .map(|(k, p)| (k.clone(), *p))
                        .collect();
                    prop_assert_eq!(got, want);
                }
                Operation::Forget { token } => {
                    index.cache_mut().delete(&token);
                    prop_assert!(index.cache().peek(&token).is_none());
                }
            }
            prop_assert!(index.cache().len() <= capacity);
        }
        prop_assert!(index.tree().validate().is_ok());
    }
}
