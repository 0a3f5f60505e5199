//! Immutable typed values.
//!
//! A [`Value`] is a number, float, byte string, or list, with an optional
//! name. Values never change after construction; evaluation produces new
//! values rather than mutating old ones. Lists come in two flavors: static
//! (an owned sequence) and dynamic (computed on demand through a
//! [`DynamicList`] supplied at construction, used to project host data
//! lazily).
//!
//! Comparison rules are deliberate: equality between different variants is
//! `false`, ordering between non-numeric values is an error. Nothing is
//! silently coerced.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::{CoreError, Result};

/// Lazily computed list contents.
///
/// Implementors project host-owned data (for example a field store) into
/// values on demand, either wholesale or per subkey.
pub trait DynamicList: Send + Sync {
    /// Values selected by `key`.
    fn subkey(&self, key: &str) -> Vec<Value>;

    /// Full expansion of the list.
    fn values(&self) -> Vec<Value>;
}

/// The payload of a [`Value`].
#[derive(Clone)]
pub enum ValueKind {
    Number(i64),
    Float(f64),
    Bytes(Arc<[u8]>),
    List(Arc<[Value]>),
    Dynamic(Arc<dyn DynamicList>),
}

/// An immutable datum with an optional name.
#[derive(Clone)]
pub struct Value {
    name: Option<Arc<str>>,
    kind: ValueKind,
}

/// A literal as written in expression text. `None` is the null literal
/// (`:`), which evaluates to no value at all.
pub type LiteralValue = Option<Value>;

impl Value {
    pub fn number(n: i64) -> Self {
        Self {
            name: None,
            kind: ValueKind::Number(n),
        }
    }

    pub fn float(f: f64) -> Self {
        Self {
            name: None,
            kind: ValueKind::Float(f),
        }
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Self {
            name: None,
            kind: ValueKind::Bytes(b.into().into()),
        }
    }

    pub fn string(s: &str) -> Self {
        Self::bytes(s.as_bytes().to_vec())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Self {
            name: None,
            kind: ValueKind::List(items.into()),
        }
    }

    pub fn dynamic(list: Arc<dyn DynamicList>) -> Self {
        Self {
            name: None,
            kind: ValueKind::Dynamic(list),
        }
    }

    /// Attach a name. The name is carried by value with the datum.
    pub fn named(mut self, name: impl AsRef<str>) -> Self {
        self.name = Some(Arc::from(name.as_ref()));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ValueKind::Number(_) => "number",
            ValueKind::Float(_) => "float",
            ValueKind::Bytes(_) => "string",
            ValueKind::List(_) | ValueKind::Dynamic(_) => "list",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, ValueKind::List(_) | ValueKind::Dynamic(_))
    }

    pub fn as_number(&self) -> Result<i64> {
        match self.kind {
            ValueKind::Number(n) => Ok(n),
            _ => Err(CoreError::einval(format!(
                "value {} is not a number",
                self.sexpr()
            ))),
        }
    }

    /// Float content, with numbers promoted.
    pub fn as_float(&self) -> Result<f64> {
        match self.kind {
            ValueKind::Float(f) => Ok(f),
            ValueKind::Number(n) => Ok(n as f64),
            _ => Err(CoreError::einval(format!(
                "value {} is not numeric",
                self.sexpr()
            ))),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match &self.kind {
            ValueKind::Bytes(b) => Ok(b),
            _ => Err(CoreError::einval(format!(
                "value {} is not a string",
                self.sexpr()
            ))),
        }
    }

    /// List contents. Dynamic lists are fully expanded.
    pub fn as_list(&self) -> Result<Vec<Value>> {
        match &self.kind {
            ValueKind::List(items) => Ok(items.to_vec()),
            ValueKind::Dynamic(list) => Ok(list.values()),
            _ => Err(CoreError::einval(format!(
                "value {} is not a list",
                self.sexpr()
            ))),
        }
    }

    /// Empty lists are falsy; every other value is truthy.
    pub fn is_truthy(&self) -> bool {
        match &self.kind {
            ValueKind::List(items) => !items.is_empty(),
            ValueKind::Dynamic(list) => !list.values().is_empty(),
            _ => true,
        }
    }

    /// Same-type, same-content equality. Different variants compare
    /// unequal; lists never compare equal to anything. Names are ignored.
    pub fn eq_value(&self, other: &Value) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => a == b,
            (ValueKind::Float(a), ValueKind::Float(b)) => a == b,
            (ValueKind::Bytes(a), ValueKind::Bytes(b)) => a == b,
            _ => false,
        }
    }

    /// Numeric ordering. Ordering anything non-numeric is an error, never
    /// a silent coercion.
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering> {
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => Ok(a.cmp(b)),
            (
                ValueKind::Number(_) | ValueKind::Float(_),
                ValueKind::Number(_) | ValueKind::Float(_),
            ) => {
                let a = self.as_float()?;
                let b = other.as_float()?;
                a.partial_cmp(&b).ok_or_else(|| {
                    CoreError::einval(format!(
                        "cannot order {} against {}",
                        self.sexpr(),
                        other.sexpr()
                    ))
                })
            }
            _ => Err(CoreError::einval(format!(
                "cannot order {} against {}",
                self.sexpr(),
                other.sexpr()
            ))),
        }
    }

    /// Canonical s-expression form of the value, name prefix included.
    pub fn sexpr(&self) -> String {
        let mut out = String::new();
        self.write_sexpr(&mut out);
        out
    }

    pub(crate) fn write_sexpr(&self, out: &mut String) {
        if let Some(name) = self.name() {
            if is_bare_name(name) {
                out.push_str(name);
            } else {
                out.push_str(&escape_string(name.as_bytes()));
            }
            out.push(':');
        }
        match &self.kind {
            ValueKind::Number(n) => out.push_str(&n.to_string()),
            ValueKind::Float(f) => out.push_str(&format_float(*f)),
            ValueKind::Bytes(b) => out.push_str(&escape_string(b)),
            ValueKind::List(items) => write_list_sexpr(out, items),
            ValueKind::Dynamic(list) => write_list_sexpr(out, &list.values()),
        }
    }
}

fn write_list_sexpr(out: &mut String, items: &[Value]) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        item.write_sexpr(out);
    }
    out.push(']');
}

/// Structural equality, names included. Dynamic lists compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.name.as_deref() != other.name.as_deref() {
            return false;
        }
        match (&self.kind, &other.kind) {
            (ValueKind::Number(a), ValueKind::Number(b)) => a == b,
            (ValueKind::Float(a), ValueKind::Float(b)) => a == b,
            (ValueKind::Bytes(a), ValueKind::Bytes(b)) => a == b,
            (ValueKind::List(a), ValueKind::List(b)) => a == b,
            (ValueKind::Dynamic(a), ValueKind::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.sexpr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sexpr())
    }
}

/// True if `s` parses as a bare identifier: `[A-Za-z_][A-Za-z0-9_.-]*`.
pub fn is_bare_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Single-quoted string form with `'` and `\` escaped. Non-UTF-8 bytes are
/// replaced; expression text is UTF-8 by definition.
pub fn escape_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('\'');
    for ch in String::from_utf8_lossy(bytes).chars() {
        if ch == '\'' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Grammar-compatible float form: always carries a decimal point.
pub fn format_float(f: f64) -> String {
    let s = format!("{f}");
    if f.is_finite() && !s.contains('.') {
        format!("{f:.1}")
    } else {
        s
    }
}
