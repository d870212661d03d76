//! Display ordering of needs and moving a need within its type group

use std::cmp::Ordering;

use super::types::{Need, NeedType};

/// Which way a need moves in its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// How new sort orders are computed for a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderStrategy {
    /// Renumber the whole group as 10, 20, 30, ...
    #[default]
    Renumber,
    /// Exchange the sort orders of the two affected needs only
    SwapPair,
}

fn explicit_order(need: &Need) -> Option<i64> {
    need.sort_order.filter(|order| *order != 0)
}

/// Needs with a nonzero sort order come first, ascending. The rest follow
/// in ascending id order. Equal sort orders also fall back to id.
pub fn compare_needs(a: &Need, b: &Need) -> Ordering {
    match (explicit_order(a), explicit_order(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

pub fn sort_needs(needs: &mut [Need]) {
    needs.sort_by(compare_needs);
}

/// Needs split by type, each group in display order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeedGroups {
    pub money: Vec<Need>,
    pub time: Vec<Need>,
    pub item: Vec<Need>,
}

impl NeedGroups {
    pub fn from_needs(needs: &[Need]) -> Self {
        let mut groups = NeedGroups::default();
        for need in needs {
            groups.group_mut(need.need_type).push(need.clone());
        }
        sort_needs(&mut groups.money);
        sort_needs(&mut groups.time);
        sort_needs(&mut groups.item);
        groups
    }

    pub fn group(&self, need_type: NeedType) -> &[Need] {
        match need_type {
            NeedType::Money => &self.money,
            NeedType::Time => &self.time,
            NeedType::Item => &self.item,
        }
    }

    fn group_mut(&mut self, need_type: NeedType) -> &mut Vec<Need> {
        match need_type {
            NeedType::Money => &mut self.money,
            NeedType::Time => &mut self.time,
            NeedType::Item => &mut self.item,
        }
    }
}

/// The outcome of moving one need, before anything is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    pub need_type: NeedType,
    /// The group in its new display order, carrying the new sort orders
    pub ordered: Vec<Need>,
    /// Only the needs whose sort order changed
    pub changes: Vec<Need>,
}

/// Plan moving `need_id` one place within `group`.
///
/// Returns `None` when the need is not in the group, when the move would
/// leave the group bounds, or when it changes no sort order.
pub fn plan_move(
    group: &[Need],
    need_id: i64,
    direction: MoveDirection,
    strategy: ReorderStrategy,
) -> Option<ReorderPlan> {
    let mut list = group.to_vec();
    sort_needs(&mut list);

    let idx = list.iter().position(|n| n.id == need_id)?;
    let next = match direction {
        MoveDirection::Up => idx.checked_sub(1)?,
        MoveDirection::Down => idx + 1,
    };
    if next >= list.len() {
        return None;
    }
    let need_type = list[idx].need_type;

    let mut changes = Vec::new();
    match strategy {
        ReorderStrategy::Renumber => {
            list.swap(idx, next);
            for (pos, need) in list.iter_mut().enumerate() {
                let order = (pos as i64 + 1) * 10;
                if need.sort_order != Some(order) {
                    need.sort_order = Some(order);
                    changes.push(need.clone());
                }
            }
        }
        ReorderStrategy::SwapPair => {
            let first = list[idx].sort_order;
            let second = list[next].sort_order;
            if first == second {
                return None;
            }
            list[idx].sort_order = second;
            list[next].sort_order = first;
            changes.push(list[idx].clone());
            changes.push(list[next].clone());
            sort_needs(&mut list);
        }
    }

    if changes.is_empty() {
        return None;
    }
    Some(ReorderPlan {
        need_type,
        ordered: list,
        changes,
    })
}

/// Where the board is in a reorder round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderPhase {
    #[default]
    Idle,
    /// Optimistic orders are shown, server confirmation outstanding
    Pending,
    Committed,
    RolledBack,
}

/// Local copy of a fundraiser's needs.
///
/// Reorders go through `begin_move`, then `commit` or `rollback`.
#[derive(Debug, Clone, Default)]
pub struct NeedBoard {
    needs: Vec<Need>,
    phase: ReorderPhase,
    snapshot: Option<Vec<Need>>,
}

impl NeedBoard {
    pub fn new(needs: Vec<Need>) -> Self {
        Self {
            needs,
            ..Default::default()
        }
    }

    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    pub fn phase(&self) -> ReorderPhase {
        self.phase
    }

    pub fn get(&self, need_id: i64) -> Option<&Need> {
        self.needs.iter().find(|n| n.id == need_id)
    }

    /// One type group in display order
    pub fn group(&self, need_type: NeedType) -> Vec<Need> {
        let mut group: Vec<Need> = self
            .needs
            .iter()
            .filter(|n| n.need_type == need_type)
            .cloned()
            .collect();
        sort_needs(&mut group);
        group
    }

    pub fn groups(&self) -> NeedGroups {
        NeedGroups::from_needs(&self.needs)
    }

    /// Insert a need or replace the one with the same id
    pub fn upsert(&mut self, need: Need) {
        match self.needs.iter_mut().find(|n| n.id == need.id) {
            Some(slot) => *slot = need,
            None => self.needs.push(need),
        }
    }

    pub fn remove(&mut self, need_id: i64) -> Option<Need> {
        let idx = self.needs.iter().position(|n| n.id == need_id)?;
        Some(self.needs.remove(idx))
    }

    pub fn plan_move(
        &self,
        need_id: i64,
        direction: MoveDirection,
        strategy: ReorderStrategy,
    ) -> Option<ReorderPlan> {
        let need_type = self.get(need_id)?.need_type;
        plan_move(&self.group(need_type), need_id, direction, strategy)
    }

    /// Show the planned orders before the server confirms them
    pub fn begin_move(&mut self, plan: &ReorderPlan) {
        self.snapshot = Some(self.needs.clone());
        for need in &plan.changes {
            self.upsert(need.clone());
        }
        self.phase = ReorderPhase::Pending;
    }

    /// Merge server-confirmed records; the last record for an id wins
    pub fn commit(&mut self, records: Vec<Need>) {
        for need in records {
            self.upsert(need);
        }
        self.snapshot = None;
        self.phase = ReorderPhase::Committed;
    }

    /// Restore the pre-move list, keeping any records the server did confirm
    pub fn rollback(&mut self, applied: Vec<Need>) {
        if let Some(snapshot) = self.snapshot.take() {
            self.needs = snapshot;
        }
        for need in applied {
            self.upsert(need);
        }
        self.phase = ReorderPhase::RolledBack;
    }
}
