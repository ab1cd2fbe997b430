//! ILP model definition.

use super::variables::{BinVar, VarId};

/// Relation between the left-hand side and the right-hand side of a
/// linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    /// `lhs <= rhs`
    Le,
    /// `lhs == rhs`
    Eq,
    /// `lhs >= rhs`
    Ge,
}

/// A linear constraint `Σ a_k · x_k (<=|==|>=) rhs` over binary variables.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    /// Label used in diagnostics, e.g. `"instructor 2 capacity"`.
    pub label: String,
    /// `(variable, coefficient)` pairs.
    pub terms: Vec<(VarId, i64)>,
    /// Relation.
    pub sense: Sense,
    /// Right-hand side.
    pub rhs: i64,
}

impl LinearConstraint {
    /// Left-hand side value under a complete 0/1 assignment.
    pub fn lhs(&self, values: &[bool]) -> i64 {
        self.terms
            .iter()
            .filter(|(v, _)| values[v.index()])
            .map(|&(_, a)| a)
            .sum()
    }

    /// Whether the constraint holds under a complete 0/1 assignment.
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        let lhs = self.lhs(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs,
            Sense::Eq => lhs == self.rhs,
            Sense::Ge => lhs >= self.rhs,
        }
    }
}

/// Objective function for the ILP model.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize a linear combination of variables.
    Minimize {
        /// (variable, coefficient) pairs.
        terms: Vec<(VarId, i64)>,
    },

    /// Maximize a linear combination of variables.
    Maximize {
        /// (variable, coefficient) pairs.
        terms: Vec<(VarId, i64)>,
    },
}

impl Objective {
    /// The `(variable, coefficient)` pairs of the objective.
    pub fn terms(&self) -> &[(VarId, i64)] {
        match self {
            Objective::Minimize { terms } | Objective::Maximize { terms } => terms,
        }
    }

    /// Objective value under a complete 0/1 assignment.
    pub fn evaluate(&self, values: &[bool]) -> i64 {
        self.terms()
            .iter()
            .filter(|(v, _)| values[v.index()])
            .map(|&(_, c)| c)
            .sum()
    }
}

/// An integer linear program over binary variables.
///
/// Contains variables, linear constraints, and an optional objective.
/// Knows nothing about what the variables mean; callers keep their own
/// mapping from [`VarId`] to domain entities.
///
/// # Examples
///
/// ```
/// use u_flightsched::ilp::{IlpModel, Objective};
///
/// let mut model = IlpModel::new("example");
/// let a = model.add_var();
/// let b = model.add_var();
/// model.add_at_most("pick one", vec![a, b], 1);
/// model.set_objective(Objective::Maximize { terms: vec![(a, 1), (b, 1)] });
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct IlpModel {
    /// Model name.
    pub name: String,
    /// Binary variables, indexed by [`VarId`].
    pub vars: Vec<BinVar>,
    /// Constraints.
    pub constraints: Vec<LinearConstraint>,
    /// Objective function.
    pub objective: Option<Objective>,
}

impl IlpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Adds a free binary variable.
    pub fn add_var(&mut self) -> VarId {
        self.push_var(BinVar::new())
    }

    /// Adds a binary variable fixed to `value`.
    pub fn add_fixed_var(&mut self, value: bool) -> VarId {
        self.push_var(BinVar::fixed(value))
    }

    fn push_var(&mut self, var: BinVar) -> VarId {
        let id = VarId(self.vars.len());
        self.vars.push(var);
        id
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    /// Convenience: `Σ vars <= bound` with unit coefficients.
    pub fn add_at_most(&mut self, label: impl Into<String>, vars: Vec<VarId>, bound: i64) {
        self.constraints.push(LinearConstraint {
            label: label.into(),
            terms: vars.into_iter().map(|v| (v, 1)).collect(),
            sense: Sense::Le,
            rhs: bound,
        });
    }

    /// Convenience: `var == value` as an explicit equality constraint.
    pub fn add_fix(&mut self, label: impl Into<String>, var: VarId, value: bool) {
        self.constraints.push(LinearConstraint {
            label: label.into(),
            terms: vec![(var, 1)],
            sense: Sense::Eq,
            rhs: i64::from(value),
        });
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Validates the model for consistency.
    ///
    /// Checks that every referenced variable exists.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.vars.len();
        for c in &self.constraints {
            for (v, _) in &c.terms {
                if v.index() >= n {
                    return Err(format!("constraint '{}': undefined variable {v}", c.label));
                }
            }
        }
        if let Some(objective) = &self.objective {
            for (v, _) in objective.terms() {
                if v.index() >= n {
                    return Err(format!("objective: undefined variable {v}"));
                }
            }
        }
        Ok(())
    }

    /// Returns the label of the first violated constraint or fixing, if any.
    ///
    /// `values` must hold one entry per variable.
    pub fn first_violation(&self, values: &[bool]) -> Option<String> {
        if values.len() != self.vars.len() {
            return Some(format!(
                "expected {} values, got {}",
                self.vars.len(),
                values.len()
            ));
        }
        for (k, var) in self.vars.iter().enumerate() {
            if let Some(fixed) = var.fixed {
                if values[k] != fixed {
                    return Some(format!("{} fixed to {}", VarId(k), u8::from(fixed)));
                }
            }
        }
        self.constraints
            .iter()
            .find(|c| !c.is_satisfied(values))
            .map(|c| c.label.clone())
    }

    /// Returns the number of variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_creation() {
        let mut model = IlpModel::new("test");
        let a = model.add_var();
        let b = model.add_var();
        let c = model.add_fixed_var(false);
        model.add_at_most("row", vec![a, b, c], 1);
        model.set_objective(Objective::Maximize {
            terms: vec![(a, 1), (b, 1), (c, 1)],
        });

        assert_eq!(model.var_count(), 3);
        assert_eq!(model.constraint_count(), 1);
        assert!(model.objective.is_some());
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_undefined_variable() {
        let mut model = IlpModel::new("test");
        model.add_at_most("dangling", vec![VarId(3)], 1);

        let err = model.validate().unwrap_err();
        assert!(err.contains("dangling"));
    }

    #[test]
    fn test_undefined_objective_variable() {
        let mut model = IlpModel::new("test");
        model.add_var();
        model.set_objective(Objective::Minimize {
            terms: vec![(VarId(1), 1)],
        });

        assert!(model.validate().is_err());
    }

    #[test]
    fn test_constraint_satisfaction() {
        let c = LinearConstraint {
            label: "c".into(),
            terms: vec![(VarId(0), 2), (VarId(1), 3)],
            sense: Sense::Le,
            rhs: 4,
        };
        assert!(c.is_satisfied(&[true, false]));
        assert!(!c.is_satisfied(&[true, true]));
        assert_eq!(c.lhs(&[true, true]), 5);

        let ge = LinearConstraint {
            sense: Sense::Ge,
            rhs: 3,
            ..c.clone()
        };
        assert!(!ge.is_satisfied(&[true, false]));
        assert!(ge.is_satisfied(&[false, true]));
    }

    #[test]
    fn test_first_violation() {
        let mut model = IlpModel::new("test");
        let a = model.add_var();
        let b = model.add_fixed_var(false);
        model.add_at_most("at most one", vec![a, b], 1);

        assert_eq!(model.first_violation(&[true, false]), None);
        assert_eq!(
            model.first_violation(&[true, true]).as_deref(),
            Some("x1 fixed to 0")
        );
        assert!(model.first_violation(&[true]).is_some());
    }

    #[test]
    fn test_add_fix() {
        let mut model = IlpModel::new("test");
        let a = model.add_var();
        model.add_fix("a off", a, false);

        assert_eq!(model.first_violation(&[false]), None);
        assert_eq!(model.first_violation(&[true]).as_deref(), Some("a off"));
    }

    #[test]
    fn test_objective_evaluate() {
        let obj = Objective::Maximize {
            terms: vec![(VarId(0), 2), (VarId(1), 5)],
        };
        assert_eq!(obj.evaluate(&[true, true]), 7);
        assert_eq!(obj.evaluate(&[false, true]), 5);
    }
}
