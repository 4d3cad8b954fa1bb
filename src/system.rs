use std::collections::HashMap;

use lazy_static::lazy_static;

pub type UnaryFn = fn(f64) -> f64;
pub type BinaryFn = fn(f64, f64) -> f64;

/// A built-in function found by [`lookup`].
#[derive(Debug, Clone, Copy)]
pub enum Builtin {
    Unary(UnaryFn),
    Binary(BinaryFn),
}

lazy_static! {
    pub static ref UNARY: HashMap<&'static str, UnaryFn> = {
        let mut m: HashMap<&'static str, UnaryFn> = HashMap::new();
        m.insert("sin", f64::sin);
        m.insert("cos", f64::cos);
        m.insert("tan", f64::tan);
        m.insert("asin", f64::asin);
        m.insert("acos", f64::acos);
        m.insert("atan", f64::atan);
        m.insert("sqrt", f64::sqrt);
        m.insert("cbrt", f64::cbrt);
        m.insert("exp", f64::exp);
        m.insert("abs", f64::abs);
        m.insert("floor", f64::floor);
        m.insert("ceil", f64::ceil);
        // half away from zero
        m.insert("round", f64::round);
        m.insert("ln", f64::ln);
        m.insert("log", f64::ln);
        m.insert("log10", f64::log10);
        m
    };
    pub static ref BINARY: HashMap<&'static str, BinaryFn> = {
        let mut m: HashMap<&'static str, BinaryFn> = HashMap::new();
        m.insert("pow", f64::powf);
        m
    };
}

/// Unary functions shadow binary ones; neither table overlaps today.
pub fn lookup(name: &str) -> Option<Builtin> {
    if let Some(f) = UNARY.get(name) {
        return Some(Builtin::Unary(*f));
    }
    BINARY.get(name).map(|f| Builtin::Binary(*f))
}

/// Sorted names of every built-in, for `:help`.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = UNARY.keys().chain(BINARY.keys()).copied().collect();
    names.sort_unstable();
    names
}
