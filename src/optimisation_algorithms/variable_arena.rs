use std::ops::{Index, IndexMut};

use crate::{math::infinitesimal::Infinitesimal, objects::variable::Variable};

/// Index of a variable in its arena. Also the order of Bland's rule.
pub type VarId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// An unknown of the pushed relations.
    Problem(Variable),
    /// The slack of a pushed relation.
    Additional,
    /// The slack of a Gomory cut.
    Cut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarState {
    Basic(usize),    // row
    NonBasic(usize), // column
}

#[derive(Debug, Clone)]
pub struct TableauVariable<F> {
    pub origin: Origin,
    pub integral: bool,
    pub lower: Option<Infinitesimal<F>>,
    pub upper: Option<Infinitesimal<F>>,
    pub value: Infinitesimal<F>,
    pub state: VarState,
}

impl<F> TableauVariable<F> {
    pub fn is_problem(&self) -> bool {
        matches!(self.origin, Origin::Problem(_))
    }

    pub fn is_basic(&self) -> bool {
        matches!(self.state, VarState::Basic(_))
    }
}

/**
 * Owner of all variables of one tableau. Released slots are reused last-in-first-out, so that a push
 * followed by a pop followed by the same push hands out the same identifiers.
 */
#[derive(Debug, Clone)]
pub struct VariableArena<F> {
    slots: Vec<Option<TableauVariable<F>>>,
    free: Vec<VarId>,
}

impl<F> Default for VariableArena<F> {
    fn default() -> Self {
        Self {
            slots: vec![],
            free: vec![],
        }
    }
}

impl<F> VariableArena<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, variable: TableauVariable<F>) -> VarId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(variable);
                id
            }
            None => {
                self.slots.push(Some(variable));
                self.slots.len() - 1
            }
        }
    }

    pub fn release(&mut self, id: VarId) -> Option<TableauVariable<F>> {
        let variable = self.slots.get_mut(id)?.take()?;
        self.free.push(id);
        Some(variable)
    }

    pub fn contains(&self, id: VarId) -> bool {
        self.slots.get(id).is_some_and(Option::is_some)
    }

    /// Number of live variables.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live variables in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &TableauVariable<F>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|variable| (id, variable)))
    }
}

impl<F> Index<VarId> for VariableArena<F> {
    type Output = TableauVariable<F>;

    fn index(&self, id: VarId) -> &Self::Output {
        match &self.slots[id] {
            Some(variable) => variable,
            None => unreachable!("variable {} was released", id),
        }
    }
}

impl<F> IndexMut<VarId> for VariableArena<F> {
    fn index_mut(&mut self, id: VarId) -> &mut Self::Output {
        match &mut self.slots[id] {
            Some(variable) => variable,
            None => unreachable!("variable {} was released", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        math::{fraction_exact::FractionExact, infinitesimal::Infinitesimal, traits::Zero},
        optimisation_algorithms::variable_arena::{
            Origin, TableauVariable, VarState, VariableArena,
        },
    };

    fn slack() -> TableauVariable<FractionExact> {
        TableauVariable {
            origin: Origin::Additional,
            integral: false,
            lower: None,
            upper: None,
            value: Infinitesimal::zero(),
            state: VarState::Basic(0),
        }
    }

    #[test]
    fn identifiers_are_reused_in_stack_order() {
        let mut arena = VariableArena::new();
        let a = arena.allocate(slack());
        let b = arena.allocate(slack());
        let c = arena.allocate(slack());
        assert_eq!((a, b, c), (0, 1, 2));

        arena.release(c).unwrap();
        arena.release(b).unwrap();
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(b));
        assert!(arena.release(b).is_none());

        assert_eq!(arena.allocate(slack()), b);
        assert_eq!(arena.allocate(slack()), c);
        assert_eq!(arena.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
