//! Liability / issuing / card classification of flat contract rows.

use serde::Serialize;
use std::collections::HashMap;

use crate::oracle::ContractRow;

/// Card and card-contract numbers are 16 characters with this prefix.
const CARD_NUMBER_PREFIX: &str = "10000";
const CARD_NUMBER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
  Liability,
  Issue,
  Card,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractNode {
  pub kind: ContractKind,
  #[serde(flatten)]
  pub contract: ContractRow,
  pub children: Vec<ContractNode>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_card_number(value: &Option<String>) -> bool {
  non_empty(value)
    .map(|v| v.chars().count() == CARD_NUMBER_LEN && v.starts_with(CARD_NUMBER_PREFIX))
    .unwrap_or(false)
}

/// Classify a row, first matching rule wins:
/// card-shaped number or issuing-account link => card,
/// liability link => issue, otherwise liability.
pub fn classify(row: &ContractRow) -> ContractKind {
  if is_card_number(&row.card_number)
    || is_card_number(&row.contract_number)
    || non_empty(&row.acnt_contract_oid).is_some()
  {
    ContractKind::Card
  } else if non_empty(&row.liab_contract).is_some() {
    ContractKind::Issue
  } else {
    ContractKind::Liability
  }
}

/// Re-parent flat rows into liability -> issue -> card trees.
///
/// Issues hang under the liability named by `LIAB_CONTRACT`. Cards hang under
/// the issue named by `ACNT_CONTRACT__OID`, else under the liability named by
/// `LIAB_CONTRACT`. Rows whose parent is absent stay at the top level.
/// Sibling order follows input order.
pub fn build_tree(rows: Vec<ContractRow>) -> Vec<ContractNode> {
  let kinds: Vec<ContractKind> = rows.iter().map(classify).collect();

  let mut liabilities: HashMap<&str, usize> = HashMap::new();
  let mut issues: HashMap<&str, usize> = HashMap::new();
  for (i, row) in rows.iter().enumerate() {
    let index = match kinds[i] {
      ContractKind::Liability => &mut liabilities,
      ContractKind::Issue => &mut issues,
      ContractKind::Card => continue,
    };
    index.entry(row.id.as_str()).or_insert(i);
  }

  let parents: Vec<Option<usize>> = rows
    .iter()
    .zip(&kinds)
    .map(|(row, kind)| match kind {
      ContractKind::Liability => None,
      ContractKind::Issue => non_empty(&row.liab_contract).and_then(|id| liabilities.get(id).copied()),
      ContractKind::Card => non_empty(&row.acnt_contract_oid)
        .and_then(|id| issues.get(id).copied())
        .or_else(|| non_empty(&row.liab_contract).and_then(|id| liabilities.get(id).copied())),
    })
    .collect();

  let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
  let mut roots = Vec::new();
  for (i, parent) in parents.iter().enumerate() {
    match parent {
      Some(p) => children[*p].push(i),
      None => roots.push(i),
    }
  }

  let mut slots: Vec<Option<ContractRow>> = rows.into_iter().map(Some).collect();
  roots
    .into_iter()
    .map(|i| assemble(i, &mut slots, &kinds, &children))
    .collect()
}

fn assemble(
  i: usize,
  slots: &mut [Option<ContractRow>],
  kinds: &[ContractKind],
  children: &[Vec<usize>],
) -> ContractNode {
  // Parents are always a tier above their children, so each slot is taken once
  let contract = slots[i].take().unwrap_or_default();
  let mut nodes = Vec::with_capacity(children[i].len());
  for &child in &children[i] {
    nodes.push(assemble(child, slots, kinds, children));
  }
  ContractNode {
    kind: kinds[i],
    contract,
    children: nodes,
  }
}
