//! Parameter collection and binding.

use serde_json::Value;
use smol_str::SmolStr;

use crate::ast::{ParamExpr, Statement, Visit, VisitMut};

struct ParamCollector {
    found: Vec<SmolStr>,
}

impl Visit for ParamCollector {
    fn visit_param(&mut self, param: &ParamExpr) {
        if !self.found.contains(&param.name) {
            self.found.push(param.name.clone());
        }
    }
}

/// Distinct parameter names in first-occurrence order.
pub fn collect_parameters(stmt: &Statement) -> Vec<SmolStr> {
    let mut collector = ParamCollector { found: Vec::new() };
    collector.visit_statement(stmt);
    collector.found
}

struct ParamBinder<'a> {
    name: &'a str,
    value: &'a Value,
    bound: usize,
}

impl VisitMut for ParamBinder<'_> {
    fn visit_param_mut(&mut self, param: &mut ParamExpr) {
        if param.name == self.name {
            param.value = Some(self.value.clone());
            self.bound += 1;
        }
    }
}

/// Bind `value` to every occurrence of the named parameter. Idempotent, and
/// independent bindings commute. Returns how many occurrences were bound.
pub fn set_parameter(stmt: &mut Statement, name: &str, value: Value) -> usize {
    let mut binder = ParamBinder {
        name,
        value: &value,
        bound: 0,
    };
    binder.visit_statement_mut(stmt);
    binder.bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    #[test]
    fn test_collect_distinct_in_order() {
        let stmt = parse(
            "SELECT * FROM t WHERE a = :alpha AND b = :beta AND c = :alpha OR d = :gamma",
        )
        .unwrap();
        assert_eq!(collect_parameters(&stmt), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_collects_inside_cte_bodies() {
        let stmt = parse("WITH u AS (SELECT * FROM users WHERE s = :status) SELECT * FROM u")
            .unwrap();
        assert_eq!(collect_parameters(&stmt), vec!["status"]);
    }

    #[test]
    fn test_set_parameter_binds_every_occurrence() {
        let mut stmt = parse("SELECT * FROM t WHERE a = :x AND b = :x AND c = :y").unwrap();
        assert_eq!(set_parameter(&mut stmt, "x", json!(7)), 2);
    }

    #[test]
    fn test_set_parameter_is_idempotent() {
        let mut once = parse("SELECT * FROM t WHERE a = :x").unwrap();
        set_parameter(&mut once, "x", json!(1));
        let mut twice = once.clone();
        set_parameter(&mut twice, "x", json!(1));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_independent_bindings_commute() {
        let base = parse("SELECT * FROM t WHERE a = :x AND b = :y").unwrap();
        let mut ab = base.clone();
        set_parameter(&mut ab, "x", json!(1));
        set_parameter(&mut ab, "y", json!(2));
        let mut ba = base.clone();
        set_parameter(&mut ba, "y", json!(2));
        set_parameter(&mut ba, "x", json!(1));
        assert_eq!(ab, ba);
    }
}
