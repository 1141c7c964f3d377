//! Solver-independent mixed-integer linear programs.
use std::fmt;
use std::ops::{Add, Sub, Mul, Neg};
use anyhow::{bail, Result};

mod lp;
pub mod solver;
pub mod microlp;

pub use solver::*;

/// Handle of a variable within one [`Model`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Var(usize);

impl Var {
    #[inline]
    pub fn index(&self) -> usize { self.0 }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VarType {
    Binary,
    Integer,
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub vtype: VarType,
    pub lb: f64,
    pub ub: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(Var, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn new() -> Self { Self::default() }

    pub fn constant(c: f64) -> Self { LinExpr { terms: Vec::new(), constant: c } }

    pub fn add_term(&mut self, coeff: f64, var: Var) -> &mut Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn add_constant(&mut self, c: f64) -> &mut Self {
        self.constant += c;
        self
    }

    pub fn terms(&self) -> &[(Var, f64)] { &self.terms }

    pub fn offset(&self) -> f64 { self.constant }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(v, c)| c * values[v.index()]).sum::<f64>() + self.constant
    }

    /// Merges repeated variables and drops zero coefficients.  Term order is by variable.
    pub fn simplify(mut self) -> Self {
        self.terms.sort_by_key(|(v, _)| *v);
        let mut terms: Vec<(Var, f64)> = Vec::with_capacity(self.terms.len());
        for (v, c) in self.terms {
            match terms.last_mut() {
                Some((last, acc)) if *last == v => *acc += c,
                _ => terms.push((v, c)),
            }
        }
        terms.retain(|(_, c)| *c != 0.0);
        LinExpr { terms, constant: self.constant }
    }

    pub fn le(self, rhs: impl Into<LinExpr>) -> IneqExpr { IneqExpr { lhs: self, sense: ConstrSense::Le, rhs: rhs.into() } }

    pub fn ge(self, rhs: impl Into<LinExpr>) -> IneqExpr { IneqExpr { lhs: self, sense: ConstrSense::Ge, rhs: rhs.into() } }

    pub fn equals(self, rhs: impl Into<LinExpr>) -> IneqExpr { IneqExpr { lhs: self, sense: ConstrSense::Eq, rhs: rhs.into() } }
}

impl From<Var> for LinExpr {
    fn from(v: Var) -> Self { LinExpr { terms: vec![(v, 1.0)], constant: 0.0 } }
}

impl From<f64> for LinExpr {
    fn from(c: f64) -> Self { LinExpr::constant(c) }
}

impl Add for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Add<Var> for LinExpr {
    type Output = LinExpr;
    fn add(self, rhs: Var) -> LinExpr { self + LinExpr::from(rhs) }
}

impl Add<f64> for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: f64) -> LinExpr { self.constant += rhs; self }
}

impl Neg for LinExpr {
    type Output = LinExpr;
    fn neg(mut self) -> LinExpr {
        for (_, c) in self.terms.iter_mut() { *c = -*c }
        self.constant = -self.constant;
        self
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;
    fn sub(self, rhs: LinExpr) -> LinExpr { self + (-rhs) }
}

impl Sub<Var> for LinExpr {
    type Output = LinExpr;
    fn sub(self, rhs: Var) -> LinExpr { self + (-1.0 * rhs) }
}

impl Sub<f64> for LinExpr {
    type Output = LinExpr;
    fn sub(self, rhs: f64) -> LinExpr { self + (-rhs) }
}

impl Add for Var {
    type Output = LinExpr;
    fn add(self, rhs: Var) -> LinExpr { LinExpr::from(self) + rhs }
}

impl Add<LinExpr> for Var {
    type Output = LinExpr;
    fn add(self, rhs: LinExpr) -> LinExpr { LinExpr::from(self) + rhs }
}

impl Sub for Var {
    type Output = LinExpr;
    fn sub(self, rhs: Var) -> LinExpr { LinExpr::from(self) - rhs }
}

impl Sub<LinExpr> for Var {
    type Output = LinExpr;
    fn sub(self, rhs: LinExpr) -> LinExpr { LinExpr::from(self) - rhs }
}

impl Mul<Var> for f64 {
    type Output = LinExpr;
    fn mul(self, rhs: Var) -> LinExpr { LinExpr { terms: vec![(rhs, self)], constant: 0.0 } }
}

impl Mul<LinExpr> for f64 {
    type Output = LinExpr;
    fn mul(self, mut rhs: LinExpr) -> LinExpr {
        for (_, c) in rhs.terms.iter_mut() { *c *= self }
        rhs.constant *= self;
        rhs
    }
}

impl std::iter::Sum for LinExpr {
    fn sum<I: Iterator<Item=LinExpr>>(iter: I) -> LinExpr {
        iter.fold(LinExpr::new(), |acc, e| acc + e)
    }
}

impl std::iter::Sum<Var> for LinExpr {
    fn sum<I: Iterator<Item=Var>>(iter: I) -> LinExpr {
        LinExpr { terms: iter.map(|v| (v, 1.0)).collect(), constant: 0.0 }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConstrSense {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for ConstrSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConstrSense::Le => "<=",
            ConstrSense::Ge => ">=",
            ConstrSense::Eq => "=",
        })
    }
}

/// Comparison of two expressions, before normalisation into a [`Constr`].
#[derive(Debug, Clone, PartialEq)]
pub struct IneqExpr {
    pub lhs: LinExpr,
    pub sense: ConstrSense,
    pub rhs: LinExpr,
}

/// `lhs sense rhs` with all variables on the left and a constant right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct Constr {
    pub name: String,
    pub lhs: LinExpr,
    pub sense: ConstrSense,
    pub rhs: f64,
}

impl Constr {
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.lhs.evaluate(values);
        match self.sense {
            ConstrSense::Le => lhs <= self.rhs + tol,
            ConstrSense::Ge => lhs >= self.rhs - tol,
            ConstrSense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    vars: Vec<VarDef>,
    constrs: Vec<Constr>,
    objective: LinExpr,
    sense: ObjSense,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Model { name: name.into(), vars: Vec::new(), constrs: Vec::new(), objective: LinExpr::new(), sense: ObjSense::Minimize }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn add_var(&mut self, name: impl Into<String>, vtype: VarType, lb: f64, ub: f64) -> Var {
        let (lb, ub) = match vtype {
            VarType::Binary => (0.0, 1.0),
            _ => (lb, ub),
        };
        self.vars.push(VarDef { name: name.into(), vtype, lb, ub });
        Var(self.vars.len() - 1)
    }

    #[inline]
    pub fn add_binary(&mut self, name: impl Into<String>) -> Var {
        self.add_var(name, VarType::Binary, 0.0, 1.0)
    }

    #[inline]
    pub fn add_continuous(&mut self, name: impl Into<String>, lb: f64, ub: f64) -> Var {
        self.add_var(name, VarType::Continuous, lb, ub)
    }

    pub fn add_constr(&mut self, name: impl Into<String>, c: IneqExpr) -> usize {
        let IneqExpr { lhs, sense, rhs } = c;
        let lhs = (lhs - rhs).simplify();
        let rhs = -lhs.offset();
        let lhs = LinExpr { terms: lhs.terms, constant: 0.0 };
        self.constrs.push(Constr { name: name.into(), lhs, sense, rhs });
        self.constrs.len() - 1
    }

    pub fn set_objective(&mut self, objective: LinExpr, sense: ObjSense) {
        self.objective = objective.simplify();
        self.sense = sense;
    }

    pub fn vars(&self) -> &[VarDef] { &self.vars }

    #[inline]
    pub fn var(&self, v: Var) -> &VarDef { &self.vars[v.index()] }

    pub fn constrs(&self) -> &[Constr] { &self.constrs }

    pub fn objective(&self) -> &LinExpr { &self.objective }

    pub fn sense(&self) -> ObjSense { self.sense }

    pub fn objective_value(&self, values: &[f64]) -> f64 { self.objective.evaluate(values) }

    /// Rejects unusable models: non-finite data, empty or inverted bounds, references to unknown
    /// variables and duplicate names.
    pub fn check_well_formed(&self) -> Result<()> {
        let n = self.vars.len();
        let mut names = crate::Set::default();
        for v in &self.vars {
            if v.name.is_empty() || v.name.chars().any(char::is_whitespace) {
                bail!("invalid variable name {:?}", v.name)
            }
            if !names.insert(v.name.as_str()) {
                bail!("duplicate variable name {}", v.name)
            }
            if v.lb.is_nan() || v.ub.is_nan() || v.lb > v.ub {
                bail!("variable {} has invalid bounds [{}, {}]", v.name, v.lb, v.ub)
            }
        }
        let check_expr = |context: &str, e: &LinExpr| -> Result<()> {
            for (v, c) in e.terms() {
                if v.index() >= n {
                    bail!("{} refers to unknown variable {}", context, v.index())
                }
                if !c.is_finite() {
                    bail!("{} has coefficient {} for {}", context, c, self.var(*v).name)
                }
            }
            if !e.offset().is_finite() {
                bail!("{} has non-finite constant", context)
            }
            Ok(())
        };
        check_expr("objective", &self.objective)?;
        let mut names = crate::Set::default();
        for c in &self.constrs {
            if !names.insert(c.name.as_str()) {
                bail!("duplicate constraint name {}", c.name)
            }
            check_expr(&c.name, &c.lhs)?;
            if !c.rhs.is_finite() {
                bail!("constraint {} has right-hand side {}", c.name, c.rhs)
            }
        }
        Ok(())
    }

    /// Descriptions of every bound, integrality or constraint violated by `values`.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<String> {
        let mut violated = Vec::new();
        if values.len() != self.vars.len() {
            violated.push(format!("expected {} values, got {}", self.vars.len(), values.len()));
            return violated
        }
        for (v, &x) in self.vars.iter().zip(values) {
            if x < v.lb - tol || x > v.ub + tol {
                violated.push(format!("{} = {} outside [{}, {}]", v.name, x, v.lb, v.ub));
            }
            if v.vtype != VarType::Continuous && (x - x.round()).abs() > tol {
                violated.push(format!("{} = {} is not integral", v.name, x));
            }
        }
        for c in &self.constrs {
            if !c.is_satisfied(values, tol) {
                violated.push(format!("{}: {} {} {}", c.name, c.lhs.evaluate(values), c.sense, c.rhs));
            }
        }
        violated
    }

    /// A constraint without variables whose constant side already violates it.
    pub fn trivially_infeasible(&self) -> Option<&Constr> {
        self.constrs.iter().find(|c| c.lhs.terms().is_empty() && !c.is_satisfied(&[], 1e-9))
    }

    pub fn num_integer_vars(&self) -> usize {
        self.vars.iter().filter(|v| v.vtype != VarType::Continuous).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack() -> (Model, Vec<Var>) {
        let mut m = Model::new("knapsack");
        let x: Vec<_> = (0..3).map(|i| m.add_binary(format!("x{}", i))).collect();
        m.add_constr("weight", (3.0 * x[0] + 4.0 * x[1] + 2.0 * x[2]).le(6.0));
        m.set_objective(5.0 * x[0] + 6.0 * x[1] + 3.0 * x[2], ObjSense::Maximize);
        (m, x)
    }

    #[test]
    fn normalises_constraints() {
        let mut m = Model::new("norm");
        let x = m.add_continuous("x", 0.0, 10.0);
        let y = m.add_continuous("y", 0.0, 10.0);
        m.add_constr("c", (LinExpr::from(x) + 2.0 + x).ge(LinExpr::from(y) + 5.0));
        let c = &m.constrs()[0];
        assert_eq!(c.lhs.terms(), &[(x, 2.0), (y, -1.0)]);
        assert_eq!(c.rhs, 3.0);
        assert_eq!(c.sense, ConstrSense::Ge);
    }

    #[test]
    fn evaluates_assignments() {
        let (m, _) = knapsack();
        m.check_well_formed().unwrap();
        assert_eq!(m.objective_value(&[1.0, 0.0, 1.0]), 8.0);
        assert!(m.violations(&[1.0, 0.0, 1.0], 1e-6).is_empty());
        let bad = m.violations(&[1.0, 1.0, 0.5], 1e-6);
        assert_eq!(bad.len(), 2);
    }

    #[test]
    fn detects_malformed_models() {
        let mut m = Model::new("bad");
        m.add_continuous("t", 5.0, 1.0);
        assert!(m.check_well_formed().is_err());

        let mut m = Model::new("dup");
        m.add_binary("x");
        m.add_binary("x");
        assert!(m.check_well_formed().is_err());

        let mut m = Model::new("nan");
        let x = m.add_binary("x");
        m.add_constr("c", (f64::NAN * x).le(1.0));
        assert!(m.check_well_formed().is_err());
    }
}
